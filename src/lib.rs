//! A library for building lexical scanners from composable regular
//! expressions over a 16-bit alphabet.
//!
//! Three layers, innermost first:
//! - [`iregex_charset`] (re-exported as [`charset`]): canonical
//!   disjoint-range character sets.
//! - [`iregex_automata`] (re-exported as [`automata`]): the finite
//!   automaton engine ([`automata::Automaton`], determinization,
//!   minimization, matching) and its string-level [`automata::RegEx`]
//!   façade.
//! - This crate: [`TokenType`]/[`Token`] and [`Scanner`], which combine
//!   many `RegEx`s into one DFA and drive an [`stream::InputStream`]
//!   through a longest-match scan loop, tagging each token with the
//!   highest-precedence pattern that matched it.
//!
//! Scanner construction and scanning both log through the `log` crate;
//! pair this crate with a logger implementation (`env_logger`, for
//! instance) to see it.

pub mod error;
pub mod scanner;
pub mod stream;
pub mod token;

pub use error::{Error, Result};
pub use scanner::{Scanner, ScannerBuilder, TokenStream};
pub use stream::{InputStream, Position, StrStream};
pub use token::{Token, TokenType};

pub use iregex_automata as automata;
pub use iregex_automata::charset;
pub use iregex_automata::RegEx;
