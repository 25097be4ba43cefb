use rand::Rng;

use crate::automaton::{Automaton, StateId};
use crate::state::State;

/// Runs an automaton over a stream of code units, one at a time (spec
/// §4.5). Tracks the current state, the tag set of the current state
/// ("recognized"), and the tag set of the most recent accepting state
/// entered since the last [`Matcher::reset`] ("last-recognized") — the
/// latter is what a longest-match scan ultimately commits as a token's
/// type.
pub struct Matcher<'a, T> {
	automaton: &'a Automaton<T>,
	current: StateId,
	recognized: Vec<T>,
	last_recognized: Vec<T>,
}

impl<'a, T: Clone> Matcher<'a, T> {
	pub fn new(automaton: &'a Automaton<T>) -> Self {
		let mut matcher = Matcher {
			automaton,
			current: automaton.start(),
			recognized: Vec::new(),
			last_recognized: Vec::new(),
		};
		matcher.reset();
		matcher
	}

	pub fn reset(&mut self) {
		self.current = self.automaton.start();
		self.recognized = self.current_state().recognizables();
		self.last_recognized = self.recognized.clone();
	}

	pub fn current(&self) -> StateId {
		self.current
	}

	/// A spec-level view of the current state, bundling its recognizables
	/// and transitions behind [`State`] rather than two separate lookups.
	pub fn current_state(&self) -> State<'a, T> {
		self.automaton.state(self.current)
	}

	pub fn recognized(&self) -> &[T] {
		&self.recognized
	}

	pub fn last_recognized(&self) -> &[T] {
		&self.last_recognized
	}

	pub fn is_recognizing(&self) -> bool {
		!self.recognized.is_empty()
	}

	/// Tries each outgoing transition of the current state in order; the
	/// first whose trigger contains `c` fires. Returns whether any
	/// transition fired. For a deterministic automaton at most one
	/// transition can ever match, so iteration order has no bearing on
	/// the result.
	pub fn matches(&mut self, c: u16) -> bool {
		let transitions = self.current_state().transitions();
		for (trigger, target) in transitions {
			if trigger.contains(c) {
				self.current = target;
				self.recognized = self.current_state().recognizables();
				if !self.recognized.is_empty() {
					self.last_recognized = self.recognized.clone();
				}
				return true;
			}
		}
		false
	}

	/// Picks a uniformly-random outgoing transition of the current state,
	/// follows it, and returns a random code point drawn from that
	/// transition's trigger. Used by random-string generation; not
	/// meaningful on a state with no outgoing transitions.
	pub fn random_match(&mut self, rng: &mut impl Rng) -> Option<u16> {
		let transitions = self.current_state().transitions();
		if transitions.is_empty() {
			return None;
		}
		let (trigger, target) = &transitions[rng.gen_range(0..transitions.len())];
		let c = trigger.random(rng)?;
		self.current = *target;
		self.recognized = self.current_state().recognizables();
		if !self.recognized.is_empty() {
			self.last_recognized = self.recognized.clone();
		}
		Some(c)
	}
}
