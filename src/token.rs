//! Token types and tokens (spec §3/C5): a [`TokenType`] names a lexical
//! category by its pattern and how to turn a matched lexeme into a value;
//! a [`Token`] is one concrete match of a token type against a run of
//! source text.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use iregex_automata::RegEx;

use crate::error::{Error, Result};
use crate::stream::Position;

type ParseFn = dyn Fn(&str) -> Box<dyn Any>;
type StringifyFn = dyn Fn(&dyn Any) -> String;

struct TokenTypeInner {
	name: String,
	pattern: RegEx,
	parse: Box<ParseFn>,
	stringify: Box<StringifyFn>,
}

/// A lexical category: a pattern, a name, and the conversions between a
/// matched lexeme and a typed value.
///
/// `TokenType` is deliberately not generic over its value type: a
/// [`crate::Scanner`] holds many token types side by side in one
/// `Vec`, each with its own unrelated value type, so the value is
/// type-erased behind `Box<dyn Any>` here and recovered through
/// [`Token::value`] by callers who already know, from the `TokenType`
/// they built the scanner with, what type to ask for.
///
/// Two `TokenType`s are equal iff they are the same declared token type
/// (by identity, not by comparing patterns/names) — this is what lets a
/// DFA state's recognizable set be deduplicated and tie-broken
/// correctly even if two token types happen to share a name.
#[derive(Clone)]
pub struct TokenType {
	inner: Rc<TokenTypeInner>,
}

impl TokenType {
	/// Declares a new token type. Fails if `pattern` is optional (spec
	/// §4.6 "a token pattern must never match the empty string").
	pub fn new<V, P, S>(name: impl Into<String>, pattern: RegEx, parse: P, stringify: S) -> Result<Self>
	where
		V: 'static,
		P: Fn(&str) -> V + 'static,
		S: Fn(&V) -> String + 'static,
	{
		let name = name.into();
		if pattern.is_optional() {
			return Err(Error::OptionalTokenPattern { name });
		}
		Ok(Self {
			inner: Rc::new(TokenTypeInner {
				name,
				pattern,
				parse: Box::new(move |lexeme| Box::new(parse(lexeme))),
				stringify: Box::new(move |value| {
					stringify(value.downcast_ref::<V>().expect("token value type mismatch"))
				}),
			}),
		})
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	pub fn pattern(&self) -> &RegEx {
		&self.inner.pattern
	}

	pub(crate) fn parse_erased(&self, lexeme: &str) -> Box<dyn Any> {
		(self.inner.parse)(lexeme)
	}

	pub fn stringify_erased(&self, value: &dyn Any) -> String {
		(self.inner.stringify)(value)
	}
}

impl fmt::Debug for TokenType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TokenType").field("name", &self.inner.name).finish()
	}
}

impl PartialEq for TokenType {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for TokenType {}

/// A single scanned token: which [`TokenType`] recognized it, the raw
/// source text it spans, where it started, and the parsed value.
pub struct Token {
	token_type: TokenType,
	lexeme: String,
	position: Position,
	value: Box<dyn Any>,
}

impl Token {
	pub(crate) fn new(token_type: TokenType, lexeme: String, position: Position) -> Self {
		let value = token_type.parse_erased(&lexeme);
		Self {
			token_type,
			lexeme,
			position,
			value,
		}
	}

	pub fn token_type(&self) -> &TokenType {
		&self.token_type
	}

	pub fn lexeme(&self) -> &str {
		&self.lexeme
	}

	pub fn position(&self) -> Position {
		self.position
	}

	/// Recovers the typed value produced by this token's [`TokenType`]'s
	/// `parse` function. Returns `None` if `V` is not the value type
	/// `token_type` was declared with.
	pub fn value<V: 'static>(&self) -> Option<&V> {
		self.value.downcast_ref::<V>()
	}
}

impl fmt::Debug for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Token")
			.field("token_type", &self.token_type)
			.field("lexeme", &self.lexeme)
			.field("position", &self.position)
			.finish()
	}
}
