//! The scanner driver (spec §4.6/C6): combines a declared-order list of
//! [`TokenType`]s into one tagged DFA, then runs a four-mode
//! (START/GOOD/RECOGNIZING/BAD) maximal-munch loop over an
//! [`InputStream`] to produce a token at a time.

use log::{debug, trace, warn};

use iregex_automata::{Automaton, Matcher, RegEx};

use crate::stream::InputStream;
use crate::token::{Token, TokenType};

fn push_code_unit(s: &mut String, c: u16) {
	s.push(char::from_u32(c as u32).unwrap_or(char::REPLACEMENT_CHARACTER));
}

/// The worked-example token set used by the demo binary (`fun`/`function`
/// keywords, identifiers, floats, integers, whitespace), declared in an
/// order where the keywords and floats win maximal-munch ties over the
/// more general identifier/integer patterns they overlap with.
pub fn worked_example_token_types() -> crate::error::Result<Vec<TokenType>> {
	let digit = || RegEx::range('0' as u32, '9' as u32).unwrap();
	let letter = || RegEx::choice(&[RegEx::range('a' as u32, 'z' as u32).unwrap(), RegEx::range('A' as u32, 'Z' as u32).unwrap()]);

	let keyword = |word: &str| {
		let chars: Vec<RegEx> = word.chars().map(|c| RegEx::char(c as u32).unwrap()).collect();
		RegEx::concat(&chars)
	};

	let identifier = RegEx::concat(&[letter(), RegEx::choice(&[letter(), digit()]).star()]);
	let integer = digit().repeated();
	let float = RegEx::concat(&[digit().star(), RegEx::char('.' as u32).unwrap(), digit().repeated()]);
	let whitespace = RegEx::choice(&[
		RegEx::char(' ' as u32).unwrap(),
		RegEx::char('\n' as u32).unwrap(),
		RegEx::char('\r' as u32).unwrap(),
		RegEx::char('\t' as u32).unwrap(),
	])
	.repeated();

	Ok(vec![
		TokenType::new("fun", keyword("fun"), |s: &str| s.to_string(), |s: &String| s.clone())?,
		TokenType::new("function", keyword("function"), |s: &str| s.to_string(), |s: &String| s.clone())?,
		TokenType::new("identifier", identifier, |s: &str| s.to_string(), |s: &String| s.clone())?,
		TokenType::new("float", float, |s: &str| s.parse::<f64>().unwrap_or(f64::NAN), |v: &f64| v.to_string())?,
		TokenType::new("integer", integer, |s: &str| s.parse::<i64>().unwrap_or(0), |v: &i64| v.to_string())?,
		TokenType::new("whitespace", whitespace, |s: &str| s.to_string(), |s: &String| s.clone())?,
	])
}

/// Collapses a DFA state's whole recognizable set down to at most one
/// tag: the declared token type with the lowest index in `order` wins
/// (spec §4.6 "declared order breaks ties between patterns that match
/// the same text").
fn break_ties(dfa: &Automaton<TokenType>, order: &[TokenType]) -> Automaton<TokenType> {
	dfa.map_state_tags(|tags| {
		tags.iter()
			.min_by_key(|t| order.iter().position(|o| *o == **t).unwrap_or(usize::MAX))
			.cloned()
			.into_iter()
			.collect()
	})
}

/// Combines ordered [`TokenType`]s into a scanner, and drives an
/// [`InputStream`] through them one token at a time.
///
/// The combined DFA is built and cached lazily on first use (spec §5
/// "a scanner's compiled form is derived state, rebuilt at most once");
/// mutating token type lists is not supported once a scanner exists, so
/// the cache never needs invalidating.
pub struct Scanner {
	token_types: Vec<TokenType>,
	error_type: TokenType,
	eof_type: TokenType,
	dfa: Option<Automaton<TokenType>>,
}

impl Scanner {
	/// Builds a scanner recognizing `token_types` in the given declared
	/// order (earlier entries win ties), with token types named `"ERROR"`
	/// and `"EOF"` reserved for unmatched input and end-of-stream.
	pub fn new(token_types: Vec<TokenType>) -> crate::error::Result<Self> {
		Self::with_names(token_types, "ERROR", "EOF")
	}

	pub fn with_names(
		token_types: Vec<TokenType>,
		error_name: impl Into<String>,
		eof_name: impl Into<String>,
	) -> crate::error::Result<Self> {
		let error_pattern = iregex_automata::RegEx::any().repeated();
		let error_type = TokenType::new(error_name, error_pattern, |s: &str| s.to_string(), |s: &String| s.clone())?;

		// the EOF pattern is never matched through the DFA: the driver
		// emits an EOF token directly once the stream is exhausted. any
		// non-optional pattern satisfies TokenType::new's invariant.
		let eof_pattern = iregex_automata::RegEx::char(0)?;
		let eof_type = TokenType::new(eof_name, eof_pattern, |s: &str| s.to_string(), |s: &String| s.clone())?;

		Ok(Self {
			token_types,
			error_type,
			eof_type,
			dfa: None,
		})
	}

	/// A builder for scanner construction parameters: declared-order
	/// token types plus the naming of the implicit `ERROR`/`EOF` token
	/// types (spec §4.6/§6) — the closest thing this library has to
	/// "configuration", since it is a library rather than a service.
	pub fn builder() -> ScannerBuilder {
		ScannerBuilder::default()
	}

	pub fn token_types(&self) -> &[TokenType] {
		&self.token_types
	}

	pub fn error_type(&self) -> &TokenType {
		&self.error_type
	}

	pub fn eof_type(&self) -> &TokenType {
		&self.eof_type
	}

	fn ensure_dfa(&mut self) -> &Automaton<TokenType> {
		if self.dfa.is_none() {
			debug!("compiling scanner DFA from {} token types", self.token_types.len());
			let retagged: Vec<Automaton<TokenType>> = self
				.token_types
				.iter()
				.map(|tt| tt.pattern().automaton().map_tags(|_| tt.clone()))
				.collect();
			let combined = iregex_automata::choice(&retagged).determinize().minimize();
			let tagged = break_ties(&combined, &self.token_types);
			debug!("scanner DFA has {} states", tagged.state_count());
			self.dfa = Some(tagged);
		}
		self.dfa.as_ref().expect("just built")
	}

	/// Scans one token from `stream`. Once the stream is exhausted, every
	/// further call returns a fresh `EOF` token (spec §4.6: "exactly one
	/// EOF token terminates the stream" is enforced by [`Scanner::scan`],
	/// which stops iterating right after the first one this produces).
	pub fn scan_one(&mut self, stream: &mut dyn InputStream) -> Token {
		if !stream.has_more_symbols() {
			let position = stream.position();
			trace!("at EOF ({position:?})");
			return Token::new(self.eof_type.clone(), String::new(), position);
		}

		let start_position = stream.position();
		let dfa = self.ensure_dfa();
		let mut matcher = Matcher::new(dfa);

		#[derive(Debug, Clone, Copy, PartialEq, Eq)]
		enum Mode {
			Start,
			Good,
			Recognizing,
			Bad,
		}

		let mut mode = Mode::Start;
		let mut lexeme = String::new();
		let mut pending = String::new();

		// `mark` is the rollback anchor: token start until the first
		// accept, then re-placed right after every later accept, so a
		// mode flip (or running out of input) with no accept since can
		// roll back exactly the characters that never made it into
		// `lexeme`.
		stream.mark();

		while stream.has_more_symbols() {
			stream.mark();
			let c = stream.read_next_symbol();
			let does_match = matcher.matches(c);
			let does_recognize = matcher.is_recognizing();

			if mode == Mode::Start {
				mode = if does_match { Mode::Good } else { Mode::Bad };
			}
			trace!("'{c:#06x}' does_match={does_match} does_recognize={does_recognize} mode={mode:?}");

			let belongs = does_match != (mode == Mode::Bad);
			if belongs {
				stream.unmark();
				push_code_unit(&mut pending, c);
				if mode != Mode::Bad && does_recognize {
					mode = Mode::Recognizing;
					lexeme.push_str(&pending);
					pending.clear();
					stream.unmark();
					stream.mark();
				}
			} else {
				stream.reset();
				break;
			}
		}

		if mode == Mode::Recognizing {
			if pending.is_empty() {
				stream.unmark();
			} else {
				// trailing characters since the last accept never
				// qualified; put them back for the next scan.
				stream.reset();
			}
		} else {
			matcher.reset();
			lexeme.push_str(&pending);
			stream.unmark();
		}

		let token_type = match matcher.last_recognized().first() {
			Some(tt) => tt.clone(),
			None => {
				warn!("no token type matched at {start_position:?}, emitting {:?}({lexeme:?})", self.error_type.name());
				self.error_type.clone()
			}
		};

		Token::new(token_type, lexeme, start_position)
	}

	/// A token-at-a-time iterator over `stream`, terminated by exactly
	/// one `EOF` token.
	pub fn scan<'s>(&'s mut self, stream: &'s mut dyn InputStream) -> TokenStream<'s> {
		TokenStream {
			scanner: self,
			stream,
			done: false,
		}
	}
}

/// Builds a [`Scanner`], in declared order, with optional custom names
/// for the implicit `ERROR`/`EOF` token types (default `"ERROR"`/`"EOF"`).
pub struct ScannerBuilder {
	token_types: Vec<TokenType>,
	error_name: String,
	eof_name: String,
}

impl Default for ScannerBuilder {
	fn default() -> Self {
		Self {
			token_types: Vec::new(),
			error_name: "ERROR".to_string(),
			eof_name: "EOF".to_string(),
		}
	}
}

impl ScannerBuilder {
	pub fn token_type(mut self, token_type: TokenType) -> Self {
		self.token_types.push(token_type);
		self
	}

	pub fn token_types(mut self, token_types: impl IntoIterator<Item = TokenType>) -> Self {
		self.token_types.extend(token_types);
		self
	}

	pub fn error_name(mut self, name: impl Into<String>) -> Self {
		self.error_name = name.into();
		self
	}

	pub fn eof_name(mut self, name: impl Into<String>) -> Self {
		self.eof_name = name.into();
		self
	}

	pub fn build(self) -> crate::error::Result<Scanner> {
		Scanner::with_names(self.token_types, self.error_name, self.eof_name)
	}
}

/// Iterator returned by [`Scanner::scan`].
pub struct TokenStream<'s> {
	scanner: &'s mut Scanner,
	stream: &'s mut dyn InputStream,
	done: bool,
}

impl<'s> Iterator for TokenStream<'s> {
	type Item = Token;

	fn next(&mut self) -> Option<Token> {
		if self.done {
			return None;
		}
		let token = self.scanner.scan_one(&mut *self.stream);
		if token.token_type() == self.scanner.eof_type() {
			self.done = true;
		}
		Some(token)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stream::StrStream;
	use iregex_automata::RegEx;

	fn ident_and_int() -> Vec<TokenType> {
		let ident_pattern = RegEx::choice(&[
			RegEx::range('a' as u32, 'z' as u32).unwrap(),
			RegEx::range('A' as u32, 'Z' as u32).unwrap(),
		])
		.repeated();
		let int_pattern = RegEx::range('0' as u32, '9' as u32).unwrap().repeated();

		vec![
			TokenType::new("IDENT", ident_pattern, |s: &str| s.to_string(), |s: &String| s.clone()).unwrap(),
			TokenType::new("INT", int_pattern, |s: &str| s.parse::<i64>().unwrap(), |v: &i64| v.to_string()).unwrap(),
		]
	}

	fn scan_all(scanner: &mut Scanner, input: &str) -> Vec<(String, String)> {
		let mut stream = StrStream::new(input);
		scanner
			.scan(&mut stream)
			.map(|t| (t.token_type().name().to_string(), t.lexeme().to_string()))
			.collect()
	}

	#[test]
	fn maximal_munch_prefers_longest_match() {
		let mut scanner = Scanner::new(ident_and_int()).unwrap();
		let tokens = scan_all(&mut scanner, "foo123");
		// IDENT can't consume digits, so "foo" and "123" are separate
		// maximal-munch tokens, not one failed match.
		assert_eq!(
			tokens,
			vec![("IDENT".to_string(), "foo".to_string()), ("INT".to_string(), "123".to_string()), ("EOF".to_string(), "".to_string())]
		);
	}

	#[test]
	fn declared_order_breaks_ties() {
		let kw_fun = RegEx::concat(&[
			RegEx::char('f' as u32).unwrap(),
			RegEx::char('u' as u32).unwrap(),
			RegEx::char('n' as u32).unwrap(),
		]);
		let ident = RegEx::choice(&[RegEx::range('a' as u32, 'z' as u32).unwrap()]).repeated();

		let fun_kw = TokenType::new("FUN", kw_fun, |s: &str| s.to_string(), |s: &String| s.clone()).unwrap();
		let ident_type = TokenType::new("IDENT", ident, |s: &str| s.to_string(), |s: &String| s.clone()).unwrap();

		let mut scanner = Scanner::new(vec![fun_kw, ident_type]).unwrap();
		let tokens = scan_all(&mut scanner, "fun");
		assert_eq!(tokens[0], ("FUN".to_string(), "fun".to_string()));
	}

	#[test]
	fn unmatched_character_becomes_error_token() {
		let mut scanner = Scanner::new(ident_and_int()).unwrap();
		let tokens = scan_all(&mut scanner, "@#$%");
		assert_eq!(tokens, vec![("ERROR".to_string(), "@#$%".to_string()), ("EOF".to_string(), "".to_string())]);
	}

	#[test]
	fn error_then_valid_token_recovers() {
		let mut scanner = Scanner::new(ident_and_int()).unwrap();
		let tokens = scan_all(&mut scanner, ":hello");
		assert_eq!(
			tokens,
			vec![("ERROR".to_string(), ":".to_string()), ("IDENT".to_string(), "hello".to_string()), ("EOF".to_string(), "".to_string())]
		);
	}

	#[test]
	fn exactly_one_eof_token_terminates_stream() {
		let mut scanner = Scanner::new(ident_and_int()).unwrap();
		let mut stream = StrStream::new("a");
		let tokens: Vec<_> = scanner.scan(&mut stream).collect();
		assert_eq!(tokens.len(), 2);
		assert_eq!(tokens.last().unwrap().token_type(), scanner.eof_type());
	}

	#[test]
	fn builder_matches_new_with_custom_eof_error_names() {
		let mut scanner = Scanner::builder()
			.token_types(ident_and_int())
			.error_name("BAD")
			.eof_name("END")
			.build()
			.unwrap();
		assert_eq!(scanner.error_type().name(), "BAD");
		assert_eq!(scanner.eof_type().name(), "END");
		let tokens = scan_all(&mut scanner, "42");
		assert_eq!(tokens, vec![("INT".to_string(), "42".to_string()), ("END".to_string(), "".to_string())]);
	}

	#[test]
	fn partial_match_recovery_on_comment_pattern() {
		// '{' . [^{}]* . '}' — spec scenario 4: "{ { }" -> error("{ "),
		// comment("{ }"): the inner content excludes '{', so the second
		// '{' flips the run to BAD before any accept is ever reached,
		// and is itself left unread for the next token.
		let open = RegEx::char('{' as u32).unwrap();
		let close = RegEx::char('}' as u32).unwrap();
		let inner = RegEx::set(iregex_charset::complement(&iregex_charset::union([
			iregex_charset::CharSet::char('{' as u32).unwrap(),
			iregex_charset::CharSet::char('}' as u32).unwrap(),
		])))
		.star();
		let comment = RegEx::concat(&[open, inner, close]);
		let comment_type = TokenType::new("COMMENT", comment, |s: &str| s.to_string(), |s: &String| s.clone()).unwrap();

		let mut scanner = Scanner::new(vec![comment_type]).unwrap();
		let tokens = scan_all(&mut scanner, "{ { }");
		assert_eq!(
			tokens,
			vec![
				("ERROR".to_string(), "{ ".to_string()),
				("COMMENT".to_string(), "{ }".to_string()),
				("EOF".to_string(), "".to_string())
			]
		);
	}

	#[test]
	fn worked_example_scenario_tokenizes_keywords_whitespace_and_float() {
		// spec scenario 1: "funstuff\n\r123.456" -> identifier("funstuff"),
		// whitespace("\n\r"), float("123.456"), EOF. "funstuff" is longer
		// than either keyword, so maximal munch settles on identifier
		// even though "fun" ties with the keyword 3 characters in.
		let mut scanner = Scanner::new(worked_example_token_types().unwrap()).unwrap();
		let tokens = scan_all(&mut scanner, "funstuff\n\r123.456");
		assert_eq!(
			tokens,
			vec![
				("identifier".to_string(), "funstuff".to_string()),
				("whitespace".to_string(), "\n\r".to_string()),
				("float".to_string(), "123.456".to_string()),
				("EOF".to_string(), "".to_string()),
			]
		);
	}

	#[test]
	fn adjacent_single_char_operators_tokenize_individually() {
		// spec scenario 2: "==!=" -> opEq("="), opEq("="), opNotEq("!="), EOF.
		// opEq is a single '=' (not repeated), so the two leading '='
		// characters are separate maximal-munch tokens, not one run.
		let op_eq = TokenType::new("opEq", RegEx::char('=' as u32).unwrap(), |s: &str| s.to_string(), |s: &String| s.clone()).unwrap();
		let op_not_eq = TokenType::new(
			"opNotEq",
			RegEx::concat(&[RegEx::char('!' as u32).unwrap(), RegEx::char('=' as u32).unwrap()]),
			|s: &str| s.to_string(),
			|s: &String| s.clone(),
		)
		.unwrap();

		let mut scanner = Scanner::new(vec![op_eq, op_not_eq]).unwrap();
		let tokens = scan_all(&mut scanner, "==!=");
		assert_eq!(
			tokens,
			vec![
				("opEq".to_string(), "=".to_string()),
				("opEq".to_string(), "=".to_string()),
				("opNotEq".to_string(), "!=".to_string()),
				("EOF".to_string(), "".to_string()),
			]
		);
	}

	#[test]
	fn arithmetic_operators_and_arrows_partition_deterministically() {
		// spec scenario 6: operators [+*-/], arrows "-->"/"<--", on "<=-".
		// With no '=' operator declared, "<" and "=" both fail to reach
		// any accept and surface as their own error tokens; the trailing
		// "-" is a lone minus, the only single character here that
		// completes a token before EOF.
		let op = |name: &'static str, c: char| TokenType::new(name, RegEx::char(c as u32).unwrap(), |s: &str| s.to_string(), |s: &String| s.clone()).unwrap();
		let arrow = |name: &'static str, word: &str| {
			let chars: Vec<RegEx> = word.chars().map(|c| RegEx::char(c as u32).unwrap()).collect();
			TokenType::new(name, RegEx::concat(&chars), |s: &str| s.to_string(), |s: &String| s.clone()).unwrap()
		};

		let mut scanner = Scanner::new(vec![
			op("plus", '+'),
			op("minus", '-'),
			op("star", '*'),
			op("slash", '/'),
			arrow("arrowRight", "-->"),
			arrow("arrowLeft", "<--"),
		])
		.unwrap();

		let tokens = scan_all(&mut scanner, "<=-");
		assert_eq!(
			tokens,
			vec![
				("ERROR".to_string(), "<".to_string()),
				("ERROR".to_string(), "=".to_string()),
				("minus".to_string(), "-".to_string()),
				("EOF".to_string(), "".to_string()),
			]
		);
	}

	#[test]
	fn concatenation_of_lexemes_reconstructs_input() {
		let mut scanner = Scanner::new(ident_and_int()).unwrap();
		let input = "foo123 @ bar";
		let mut stream = StrStream::new(input);
		let rebuilt: String = scanner
			.scan(&mut stream)
			.map(|t| t.lexeme().to_string())
			.collect();
		assert_eq!(rebuilt, input);
	}
}
