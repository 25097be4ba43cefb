/// Errors raised by the automaton engine itself, as opposed to by the
/// character-set algebra it builds on (see [`iregex_charset::Error`]).
///
/// Every variant here indicates a broken internal invariant (a "this
/// should never happen" contract violation) rather than a user input
/// mistake — construction APIs in this crate do not otherwise fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("internal automaton invariant violated: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
