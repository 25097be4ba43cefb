//! Finite automata over a 16-bit character alphabet: composable
//! [`Automaton<T>`] construction (choice, concatenation, repetition,
//! optionality), subset-construction determinization with deduplicating
//! minimization, and a [`Matcher`] with last-accept tracking.
//!
//! This is the core engine consumed by the `iregex` crate's scanner; the
//! [`regex`] module provides a string-level façade (`RegEx`) over it with
//! the tag type fixed to a single accept marker.

pub mod automaton;
pub mod determinize;
pub mod error;
pub mod matcher;
pub mod regex;
pub mod state;

pub use automaton::{choice, concat, optional, repeated, Automaton, StateId};
pub use error::{Error, Result};
pub use matcher::Matcher;
pub use regex::RegEx;
pub use state::State;

pub use iregex_charset as charset;
