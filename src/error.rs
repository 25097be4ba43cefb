/// Errors raised while building or driving a [`crate::Scanner`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A [`crate::TokenType`] was declared with a pattern that matches the
	/// empty string. An optional token pattern can never participate in
	/// maximal-munch scanning: the scanner would have to choose between
	/// "accept zero characters as a token" and "keep looking", and every
	/// other pattern that could also start here would starve.
	#[error("token type {name:?} has an optional pattern (it matches the empty string), which is not allowed")]
	OptionalTokenPattern { name: String },

	#[error(transparent)]
	CharSet(#[from] iregex_charset::Error),

	#[error(transparent)]
	Automaton(#[from] iregex_automata::Error),

	/// Reserved for a grammar/parse-tree consumer built on top of this
	/// crate's tokens (a symbol looked up in a grammar that doesn't
	/// declare it) — out of scope here, so nothing in this crate ever
	/// constructs this variant.
	#[error("unknown symbol {name:?}")]
	UnknownSymbol { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;
