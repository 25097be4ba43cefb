use rand::Rng;

use iregex_charset::{CharSet, Range};

use crate::automaton::{self, Automaton};
use crate::matcher::Matcher;

/// The tag type a [`RegEx`]'s automaton is built over: a single marker
/// with no data, since a regex only ever needs to say "this position
/// accepts" — not *which* of several things it accepts (that is the
/// scanner's job, once many regexes are combined into one DFA).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accept;

/// A regular expression over the 16-bit alphabet, built by composition
/// rather than by parsing syntax. Wraps an [`Automaton<Accept>`] and adds
/// string-level `matches`/`find`/random-generation on top (spec §4.1 C4).
#[derive(Debug, Clone)]
pub struct RegEx {
	automaton: Automaton<Accept>,
}

impl RegEx {
	pub fn from_automaton(automaton: Automaton<Accept>) -> Self {
		Self { automaton }
	}

	pub fn automaton(&self) -> &Automaton<Accept> {
		&self.automaton
	}

	pub fn into_automaton(self) -> Automaton<Accept> {
		self.automaton
	}

	/// The regex matching exactly the empty string.
	pub fn epsilon() -> Self {
		Self {
			automaton: Automaton::accepting([Accept]),
		}
	}

	/// The regex matching no string at all (a transient, non-accepting
	/// single state with no transitions).
	pub fn empty_language() -> Self {
		Self {
			automaton: Automaton::transient(),
		}
	}

	pub fn char(c: u32) -> Result<Self, iregex_charset::Error> {
		Ok(Self::set(CharSet::char(c)?))
	}

	pub fn range(a: u32, b: u32) -> Result<Self, iregex_charset::Error> {
		Ok(Self::set(CharSet::range(a, b)?))
	}

	/// The regex matching any single character in `set`.
	pub fn set(set: CharSet) -> Self {
		let mut automaton = Automaton::transient();
		let accept = automaton.add_state(vec![Accept]);
		automaton.add_transition(automaton.start(), set, accept, false);
		Self { automaton }
	}

	/// The regex matching any single character.
	pub fn any() -> Self {
		Self::set(CharSet::full())
	}

	pub fn concat(parts: &[RegEx]) -> Self {
		let automata: Vec<_> = parts.iter().map(|r| r.automaton.clone()).collect();
		Self {
			automaton: automaton::concat(&automata),
		}
	}

	pub fn choice(parts: &[RegEx]) -> Self {
		let automata: Vec<_> = parts.iter().map(|r| r.automaton.clone()).collect();
		Self {
			automaton: automaton::choice(&automata),
		}
	}

	/// `self?`
	pub fn optional(&self) -> Self {
		Self {
			automaton: self.automaton.optional(),
		}
	}

	/// `self+`
	pub fn repeated(&self) -> Self {
		Self {
			automaton: self.automaton.repeated(),
		}
	}

	/// `self*`
	pub fn star(&self) -> Self {
		self.repeated().optional()
	}

	pub fn is_optional(&self) -> bool {
		self.automaton.is_optional()
	}

	/// Determinizes and minimizes the underlying automaton. Composition
	/// operators work correctly on nondeterministic automata, but
	/// `matches`/`find` need the disjoint-transition guarantee of a DFA
	/// to run in a single pass per character.
	pub fn determinized(&self) -> Self {
		Self {
			automaton: self.automaton.determinize().minimize(),
		}
	}

	/// Whether `input` as a whole is in the language (the DFA must reach
	/// an accepting state exactly at the end of `input`, with nothing left
	/// over).
	pub fn matches(&self, input: &[u16]) -> bool {
		let dfa = self.determinized();
		let mut matcher = Matcher::new(&dfa.automaton);
		for &c in input {
			if !matcher.matches(c) {
				return false;
			}
		}
		matcher.is_recognizing()
	}

	/// The length of the longest prefix of `input` that is itself in the
	/// language, if any.
	pub fn find(&self, input: &[u16]) -> Option<usize> {
		let dfa = self.determinized();
		let mut matcher = Matcher::new(&dfa.automaton);
		let mut longest = if matcher.is_recognizing() { Some(0) } else { None };
		for (i, &c) in input.iter().enumerate() {
			if !matcher.matches(c) {
				break;
			}
			if matcher.is_recognizing() {
				longest = Some(i + 1);
			}
		}
		longest
	}

	/// Generates a random string accepted by this regex. Not a faithful
	/// uniform sampler over the language (see spec §9 "Random
	/// generation" — provided for test seeding): at each step, if the
	/// current state already accepts, the walk stops with a probability
	/// that grows with the number of characters already generated, which
	/// keeps cyclic automata (from `repeated`/`star`) from looping
	/// forever in practice while still letting them produce long
	/// strings occasionally.
	pub fn random_string(&self, rng: &mut impl Rng, max_len: usize) -> Option<Vec<u16>> {
		let dfa = self.determinized();
		let mut matcher = Matcher::new(&dfa.automaton);
		let mut out = Vec::new();

		loop {
			if matcher.is_recognizing() {
				let stop_probability = (out.len() as f64 / max_len.max(1) as f64).min(0.9);
				if rng.gen_bool(stop_probability) || out.len() >= max_len {
					return Some(out);
				}
			} else if out.len() >= max_len {
				return None;
			}

			match matcher.random_match(rng) {
				Some(c) => out.push(c),
				None => {
					return if matcher.is_recognizing() { Some(out) } else { None };
				}
			}
		}
	}
}

impl From<Range> for RegEx {
	fn from(r: Range) -> Self {
		RegEx::set(CharSet::from_range(r))
	}
}
