use iregex_charset::CharSet;

use crate::automaton::{Automaton, StateId};

/// A borrowed view of one state of an [`Automaton`], giving the
/// spec-level vocabulary ("state", "recognizables", "transitions")
/// a concrete handle without exposing the arena's internals. All
/// accessors hand out defensive copies.
#[derive(Debug, Clone, Copy)]
pub struct State<'a, T> {
	automaton: &'a Automaton<T>,
	id: StateId,
}

impl<'a, T> State<'a, T> {
	pub fn id(&self) -> StateId {
		self.id
	}

	pub fn recognizables(&self) -> Vec<T>
	where
		T: Clone,
	{
		self.automaton.recognizables(self.id)
	}

	pub fn transitions(&self) -> Vec<(CharSet, StateId)> {
		self.automaton.transitions(self.id)
	}

	pub fn is_final(&self) -> bool {
		self.automaton.is_final(self.id)
	}
}

impl<T> Automaton<T> {
	pub fn state(&self, id: StateId) -> State<'_, T> {
		State { automaton: self, id }
	}
}
