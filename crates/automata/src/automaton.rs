use std::collections::{HashMap, HashSet};

use iregex_charset::CharSet;

/// Index of a state within an [`Automaton`]'s arena. States are never
/// referenced directly; only through this handle, so that automata with
/// cycles can be represented without shared ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
	pub fn index(self) -> usize {
		self.0
	}

	pub(crate) fn from_index(index: usize) -> Self {
		StateId(index)
	}
}

#[derive(Debug, Clone)]
pub(crate) struct StateData<T> {
	pub recognizables: Vec<T>,
	pub transitions: Vec<(CharSet, StateId)>,
}

/// A finite automaton over tag type `T`.
///
/// States are stored in an arena (insertion order is the traversal order
/// from [`Automaton::start`]), and transitions reference targets by
/// [`StateId`] rather than by shared pointer, so cyclic automata need no
/// reference counting and traversal can always be written as an explicit
/// work-list loop.
#[derive(Debug, Clone)]
pub struct Automaton<T> {
	pub(crate) states: Vec<StateData<T>>,
	pub(crate) start: StateId,
}

fn dedup_push<T: PartialEq>(into: &mut Vec<T>, tag: T) {
	if !into.iter().any(|t| t == &tag) {
		into.push(tag);
	}
}

fn dedup_extend<T: PartialEq>(into: &mut Vec<T>, tags: impl IntoIterator<Item = T>) {
	for tag in tags {
		dedup_push(into, tag);
	}
}

impl<T> Automaton<T> {
	/// Builds a single-state transient (non-accepting) automaton.
	pub fn transient() -> Self {
		Self {
			states: vec![StateData {
				recognizables: Vec::new(),
				transitions: Vec::new(),
			}],
			start: StateId(0),
		}
	}

	/// Builds a single-state accepting automaton whose start state carries
	/// the given (deduplicated) recognizable tags.
	pub fn accepting(tags: impl IntoIterator<Item = T>) -> Self
	where
		T: PartialEq,
	{
		let mut recognizables = Vec::new();
		dedup_extend(&mut recognizables, tags);
		Self {
			states: vec![StateData {
				recognizables,
				transitions: Vec::new(),
			}],
			start: StateId(0),
		}
	}

	pub fn start(&self) -> StateId {
		self.start
	}

	/// Assembles an automaton directly from an arena and a start id.
	/// Used by [`crate::determinize`] and [`crate::minimize`], which build
	/// their result state-by-state rather than through composition.
	pub(crate) fn from_parts(states: Vec<StateData<T>>, start: StateId) -> Self {
		Self { states, start }
	}

	pub(crate) fn state_data(&self, id: StateId) -> &StateData<T> {
		&self.states[id.0]
	}

	/// Number of reachable states (this is also the arena length: automata
	/// produced by composition are always kept compacted to their
	/// reachable set, see [`Automaton::reachable_compacted`]).
	pub fn state_count(&self) -> usize {
		self.states.len()
	}

	pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
		(0..self.states.len()).map(StateId)
	}

	/// A defensive copy of a state's recognizable tag set.
	pub fn recognizables(&self, id: StateId) -> Vec<T>
	where
		T: Clone,
	{
		self.states[id.0].recognizables.clone()
	}

	/// A defensive copy of a state's outgoing transitions.
	pub fn transitions(&self, id: StateId) -> Vec<(CharSet, StateId)> {
		self.states[id.0].transitions.clone()
	}

	pub fn is_final(&self, id: StateId) -> bool {
		!self.states[id.0].recognizables.is_empty()
	}

	/// An automaton is optional iff its start state is accepting (its
	/// language includes the empty string).
	pub fn is_optional(&self) -> bool {
		self.is_final(self.start)
	}

	/// Appends a new state, returning its id.
	pub fn add_state(&mut self, recognizables: Vec<T>) -> StateId {
		let id = StateId(self.states.len());
		self.states.push(StateData {
			recognizables,
			transitions: Vec::new(),
		});
		id
	}

	/// Adds a transition from `from` to `to` triggered by `trigger`. If
	/// `optimize` is set and `from` already has a transition to `to`, its
	/// trigger is widened to the union instead of appending a duplicate.
	pub fn add_transition(&mut self, from: StateId, trigger: CharSet, to: StateId, optimize: bool) {
		let transitions = &mut self.states[from.0].transitions;
		if optimize {
			if let Some((existing_trigger, _)) = transitions.iter_mut().find(|(_, t)| *t == to) {
				*existing_trigger = iregex_charset::union([existing_trigger.clone(), trigger]);
				return;
			}
		}
		transitions.push((trigger, to));
	}

	/// A deterministic automaton has, at every state, pairwise disjoint
	/// transition triggers.
	pub fn is_deterministic(&self) -> bool {
		self.states.iter().all(|sd| {
			for i in 0..sd.transitions.len() {
				for j in (i + 1)..sd.transitions.len() {
					let overlap = iregex_charset::intersection([
						sd.transitions[i].0.clone(),
						sd.transitions[j].0.clone(),
					]);
					if !overlap.is_empty() {
						return false;
					}
				}
			}
			true
		})
	}

	/// Rewrites a single state's outgoing transitions so their triggers
	/// become pairwise disjoint (spec §4.2 "re-organising trigger
	/// overlaps"). This is a no-opt append: a former overlap reappears as
	/// several disjoint-trigger transitions sharing duplicated targets.
	pub fn reorganize_state(&mut self, id: StateId)
	where
		T: Clone,
	{
		let reorganized = reorganize_transitions(&self.states[id.0].transitions);
		self.states[id.0].transitions = reorganized;
	}

	pub fn reorganize_all(&mut self)
	where
		T: Clone,
	{
		for i in 0..self.states.len() {
			self.reorganize_state(StateId(i));
		}
	}

	/// Re-maps every tag via `f`, keeping the automaton's shape (state
	/// count and transitions) unchanged. Used to retag a RegEx's accept
	/// marker with a token type when building a scanner's combined DFA.
	pub fn map_tags<U>(&self, f: impl Fn(&T) -> U) -> Automaton<U> {
		Automaton {
			states: self
				.states
				.iter()
				.map(|sd| StateData {
					recognizables: sd.recognizables.iter().map(&f).collect(),
					transitions: sd.transitions.clone(),
				})
				.collect(),
			start: self.start,
		}
	}

	/// Re-maps each state's whole recognizable set at once, rather than
	/// tag-by-tag. Used by the scanner to collapse a state that still
	/// carries several competing token types (after determinizing a
	/// choice of many patterns) down to the single highest-precedence one.
	pub fn map_state_tags<U>(&self, f: impl Fn(&[T]) -> Vec<U>) -> Automaton<U> {
		Automaton {
			states: self
				.states
				.iter()
				.map(|sd| StateData {
					recognizables: f(&sd.recognizables),
					transitions: sd.transitions.clone(),
				})
				.collect(),
			start: self.start,
		}
	}

	/// Renumbers states to the order they are first reached by a
	/// breadth-first traversal from `start`, dropping anything
	/// unreachable. Every composition operation ends by calling this, so
	/// the invariant "states are exactly the reachable set, in traversal
	/// order" always holds for a fresh [`Automaton`].
	pub fn reachable_compacted(&self) -> Automaton<T>
	where
		T: Clone,
	{
		let mut order = vec![self.start.0];
		let mut seen: HashSet<usize> = HashSet::new();
		seen.insert(self.start.0);

		let mut cursor = 0;
		while cursor < order.len() {
			let current = order[cursor];
			cursor += 1;
			for (_, target) in &self.states[current].transitions {
				if seen.insert(target.0) {
					order.push(target.0);
				}
			}
		}

		let remap: HashMap<usize, StateId> = order
			.iter()
			.enumerate()
			.map(|(new_i, &old_i)| (old_i, StateId(new_i)))
			.collect();

		let states = order
			.iter()
			.map(|&old_i| {
				let sd = &self.states[old_i];
				StateData {
					recognizables: sd.recognizables.clone(),
					transitions: sd
						.transitions
						.iter()
						.map(|(c, t)| (c.clone(), remap[&t.0]))
						.collect(),
				}
			})
			.collect();

		Automaton {
			states,
			start: StateId(0),
		}
	}
}

impl<T> Automaton<T>
where
	T: Clone + PartialEq,
{
	/// Subset-construction determinization: see [`crate::determinize::determinize`].
	pub fn determinize(&self) -> Automaton<T> {
		crate::determinize::determinize(self)
	}

	/// Deduplicating minimization: see [`crate::determinize::minimize`].
	pub fn minimize(&self) -> Automaton<T> {
		crate::determinize::minimize(self)
	}

	pub fn optional(&self) -> Automaton<T> {
		optional(self)
	}

	pub fn repeated(&self) -> Automaton<T> {
		repeated(self)
	}
}

fn reorganize_transitions(transitions: &[(CharSet, StateId)]) -> Vec<(CharSet, StateId)> {
	let sets: Vec<CharSet> = transitions.iter().map(|(c, _)| c.clone()).collect();
	let overlaps = iregex_charset::compute_overlaps(&sets);

	let mut out = Vec::new();
	for overlap in overlaps {
		for i in overlap.indices {
			out.push((overlap.set.clone(), transitions[i].1));
		}
	}
	out
}

/// Builds a new automaton recognizing the same language as `a`, but
/// optional: if `a` is already optional, returns a copy. Otherwise a
/// fresh start state is created whose recognizables are the union of
/// `a`'s final states' recognizables (making it final), and whose
/// transitions replicate `a`'s start's outbound edges.
pub fn optional<T>(a: &Automaton<T>) -> Automaton<T>
where
	T: Clone + PartialEq,
{
	if a.is_optional() {
		return a.clone();
	}

	let mut states = a.states.clone();

	let mut recognizables = Vec::new();
	for sd in &a.states {
		if !sd.recognizables.is_empty() {
			dedup_extend(&mut recognizables, sd.recognizables.iter().cloned());
		}
	}

	let new_start_transitions = a.states[a.start.0].transitions.clone();
	let new_start_id = StateId(states.len());
	states.push(StateData {
		recognizables,
		transitions: new_start_transitions,
	});

	Automaton {
		states,
		start: new_start_id,
	}
	.reachable_compacted()
}

/// Builds a new automaton recognizing one-or-more repetitions of `a`'s
/// language: clones `a`, then for every final state of the clone, copies
/// each outbound transition of the (cloned) start into it.
pub fn repeated<T>(a: &Automaton<T>) -> Automaton<T>
where
	T: Clone,
{
	let mut states = a.states.clone();
	let start_transitions = states[a.start.0].transitions.clone();

	for i in 0..states.len() {
		if !states[i].recognizables.is_empty() {
			states[i].transitions.extend(start_transitions.iter().cloned());
		}
	}

	Automaton {
		states,
		start: a.start,
	}
	.reachable_compacted()
}

/// Builds the choice (union) of several automata: a new start state whose
/// recognizables are the union of all operands' start recognizables
/// (final iff any operand is optional), with each operand's cloned
/// start's outbound transitions copied into it. All other states of all
/// operands are preserved.
pub fn choice<T>(automata: &[Automaton<T>]) -> Automaton<T>
where
	T: Clone + PartialEq,
{
	assert!(!automata.is_empty(), "choice() requires at least one operand");

	let mut states: Vec<StateData<T>> = Vec::new();
	let mut offsets = Vec::with_capacity(automata.len());

	for a in automata {
		offsets.push(states.len());
		for sd in &a.states {
			states.push(sd.clone());
		}
	}

	for (ai, a) in automata.iter().enumerate() {
		let offset = offsets[ai];
		for (si, sd) in a.states.iter().enumerate() {
			states[offset + si].transitions = sd
				.transitions
				.iter()
				.map(|(c, t)| (c.clone(), StateId(t.0 + offset)))
				.collect();
		}
	}

	let mut new_recognizables = Vec::new();
	let mut new_transitions = Vec::new();
	for (ai, a) in automata.iter().enumerate() {
		let offset = offsets[ai];
		let start_sd = &a.states[a.start.0];
		dedup_extend(&mut new_recognizables, start_sd.recognizables.iter().cloned());
		new_transitions.extend(
			start_sd
				.transitions
				.iter()
				.map(|(c, t)| (c.clone(), StateId(t.0 + offset))),
		);
	}

	let new_start = StateId(states.len());
	states.push(StateData {
		recognizables: new_recognizables,
		transitions: new_transitions,
	});

	Automaton {
		states,
		start: new_start,
	}
	.reachable_compacted()
}

/// Builds the concatenation of several automata (spec §4.3). Handles any
/// mix of optional/non-optional operands by tracking a "frontier" of
/// splice points instead of chaining through epsilon transitions: the
/// index `L` of the last non-optional operand decides, per operand,
/// whether its final states remain truly accepting in the result (only
/// operands at or after `L` do — operands strictly before `L` still
/// consume input but can never be a valid end of the whole
/// concatenation).
pub fn concat<T>(automata: &[Automaton<T>]) -> Automaton<T>
where
	T: Clone + PartialEq,
{
	assert!(!automata.is_empty(), "concat() requires at least one operand");

	let last_mandatory = automata.iter().rposition(|a| !a.is_optional());
	let l: isize = last_mandatory.map(|i| i as isize).unwrap_or(-1);

	let mut states: Vec<StateData<T>> = Vec::new();
	let mut offsets = Vec::with_capacity(automata.len());
	for a in automata {
		offsets.push(states.len());
		for sd in &a.states {
			states.push(sd.clone());
		}
	}

	for (i, a) in automata.iter().enumerate() {
		let offset = offsets[i];
		let preserve = (i as isize) >= l;
		for (si, sd) in a.states.iter().enumerate() {
			states[offset + si].recognizables = if preserve {
				sd.recognizables.clone()
			} else {
				Vec::new()
			};
			states[offset + si].transitions = sd
				.transitions
				.iter()
				.map(|(c, t)| (c.clone(), StateId(t.0 + offset)))
				.collect();
		}
	}

	// the pre-start sentinel: when every operand is optional (L == -1),
	// it is seeded from the first operand's start recognizables, so the
	// whole concatenation accepts the empty string; otherwise transient.
	let prestart_recognizables = if l == -1 {
		automata[0].states[automata[0].start.0].recognizables.clone()
	} else {
		Vec::new()
	};
	let prestart_id = StateId(states.len());
	states.push(StateData {
		recognizables: prestart_recognizables,
		transitions: Vec::new(),
	});

	let mut frontier: Vec<StateId> = vec![prestart_id];
	for (i, a) in automata.iter().enumerate() {
		let offset = offsets[i];
		let cloned_start_transitions: Vec<(CharSet, StateId)> = a.states[a.start.0]
			.transitions
			.iter()
			.map(|(c, t)| (c.clone(), StateId(t.0 + offset)))
			.collect();

		for &f in &frontier {
			states[f.0].transitions.extend(cloned_start_transitions.iter().cloned());
		}

		let mut new_frontier: Vec<StateId> = a
			.states
			.iter()
			.enumerate()
			.filter(|(_, sd)| !sd.recognizables.is_empty())
			.map(|(si, _)| StateId(offset + si))
			.collect();

		// if this operand can itself match zero characters, every splice
		// point that was valid *before* it stays valid after it too, so
		// the next operand's start-transitions must reach those as well
		// (otherwise "skip an optional operand entirely" would dead-end).
		if a.is_optional() {
			new_frontier.extend(frontier.iter().copied());
			new_frontier.sort_unstable();
			new_frontier.dedup();
		}
		frontier = new_frontier;
	}

	Automaton {
		states,
		start: prestart_id,
	}
	.reachable_compacted()
}

/// Structural equality of two states belonging to (possibly different)
/// automata's arenas, given a function mapping a state's own targets to
/// "current" canonical ids (used iteratively by [`super::determinize::minimize`]).
pub(crate) fn states_structurally_equal<T: PartialEq>(
	a: &StateData<T>,
	b: &StateData<T>,
) -> bool {
	if a.recognizables.len() != b.recognizables.len() {
		return false;
	}
	if !a.recognizables.iter().all(|t| b.recognizables.contains(t)) {
		return false;
	}
	if !b.recognizables.iter().all(|t| a.recognizables.contains(t)) {
		return false;
	}

	if a.transitions.len() != b.transitions.len() {
		return false;
	}

	let mut used = vec![false; b.transitions.len()];
	'outer: for (ca, qa) in &a.transitions {
		for (j, (cb, qb)) in b.transitions.iter().enumerate() {
			if !used[j] && ca == cb && qa == qb {
				used[j] = true;
				continue 'outer;
			}
		}
		return false;
	}

	true
}
