use std::collections::HashMap;

use iregex_charset::CharSet;

use crate::automaton::{states_structurally_equal, Automaton, StateData, StateId};

fn canonical_key(indices: &[usize]) -> Vec<usize> {
	let mut key = indices.to_vec();
	key.sort_unstable();
	key.dedup();
	key
}

fn dedup_extend<T: PartialEq>(into: &mut Vec<T>, tags: impl IntoIterator<Item = T>) {
	for tag in tags {
		if !into.iter().any(|t| t == &tag) {
			into.push(tag);
		}
	}
}

fn closure_recognizables<T: Clone + PartialEq>(a: &Automaton<T>, key: &[usize]) -> Vec<T> {
	let mut out = Vec::new();
	for &idx in key {
		dedup_extend(&mut out, a.recognizables(StateId::from_index(idx)));
	}
	out
}

/// Reorganizes the combined transition list of every member of a closure
/// (putting them "on a scratch state" per spec §4.4 step 2), then groups
/// the resulting disjoint-trigger transitions by identical trigger,
/// merging same-trigger targets into one set — the next closure.
fn expand_closure<T>(a: &Automaton<T>, closure: &[usize]) -> Vec<(CharSet, Vec<usize>)> {
	let mut combined: Vec<(CharSet, StateId)> = Vec::new();
	for &idx in closure {
		combined.extend(a.transitions(StateId::from_index(idx)));
	}

	let sets: Vec<CharSet> = combined.iter().map(|(c, _)| c.clone()).collect();
	let overlaps = iregex_charset::compute_overlaps(&sets);

	let mut grouped: HashMap<CharSet, Vec<usize>> = HashMap::new();
	for overlap in overlaps {
		let mut targets = Vec::new();
		for i in overlap.indices {
			targets.push(combined[i].1.index());
		}
		grouped.entry(overlap.set).or_default().extend(targets);
	}

	grouped
		.into_iter()
		.map(|(trigger, targets)| (trigger, canonical_key(&targets)))
		.collect()
}

/// Subset-construction determinization (spec §4.4). The result is
/// deterministic (pairwise disjoint triggers at every state) but not
/// necessarily minimal; call [`minimize`] afterwards to deduplicate
/// structurally-identical states.
pub fn determinize<T>(a: &Automaton<T>) -> Automaton<T>
where
	T: Clone + PartialEq,
{
	// step 1: reorganize overlaps at every state of the source automaton
	// first, so a singleton closure's own transitions are already
	// disjoint before expand_closure does the same combine-and-partition
	// work across a closure's (possibly several) member states.
	let mut a = a.clone();
	a.reorganize_all();
	let a = &a;

	let mut interned: HashMap<Vec<usize>, StateId> = HashMap::new();
	let mut states: Vec<StateData<T>> = Vec::new();
	let mut queue: Vec<Vec<usize>> = Vec::new();

	let start_key = canonical_key(&[a.start().index()]);
	let start_id = StateId::from_index(states.len());
	states.push(StateData {
		recognizables: closure_recognizables(a, &start_key),
		transitions: Vec::new(),
	});
	interned.insert(start_key.clone(), start_id);
	queue.push(start_key);

	let mut cursor = 0;
	while cursor < queue.len() {
		let closure_key = queue[cursor].clone();
		cursor += 1;
		let my_id = interned[&closure_key];

		let grouped = expand_closure(a, &closure_key);
		let mut out_transitions = Vec::with_capacity(grouped.len());
		for (trigger, target_key) in grouped {
			let target_id = *interned.entry(target_key.clone()).or_insert_with(|| {
				let id = StateId::from_index(states.len());
				states.push(StateData {
					recognizables: closure_recognizables(a, &target_key),
					transitions: Vec::new(),
				});
				queue.push(target_key);
				id
			});
			out_transitions.push((trigger, target_id));
		}
		states[my_id.index()].transitions = out_transitions;
	}

	Automaton::from_parts(states, start_id).reachable_compacted()
}

/// Deduplicates structurally-equal states (spec §4.4 step 3): repeatedly
/// collapses states sharing the same recognizables and the same
/// transition multiset (targets compared post-collapse), re-aiming
/// transitions at the surviving representative, until a pass leaves the
/// state count unchanged.
pub fn minimize<T>(a: &Automaton<T>) -> Automaton<T>
where
	T: Clone + PartialEq,
{
	let mut current = a.clone();
	loop {
		let before = current.state_count();
		let (deduped, changed) = dedup_pass(&current);
		if !changed {
			debug_assert_eq!(deduped.state_count(), before);
			return deduped;
		}
		current = deduped;
	}
}

fn dedup_pass<T>(a: &Automaton<T>) -> (Automaton<T>, bool)
where
	T: Clone + PartialEq,
{
	let n = a.state_count();
	let raw_states: Vec<&StateData<T>> = (0..n).map(|i| a.state_data(StateId::from_index(i))).collect();

	let mut representatives: Vec<usize> = Vec::new();
	let mut class_of = vec![0usize; n];

	for i in 0..n {
		let mut matched = None;
		for (class_idx, &rep) in representatives.iter().enumerate() {
			if states_structurally_equal(raw_states[rep], raw_states[i]) {
				matched = Some(class_idx);
				break;
			}
		}
		match matched {
			Some(class_idx) => class_of[i] = class_idx,
			None => {
				class_of[i] = representatives.len();
				representatives.push(i);
			}
		}
	}

	let changed = representatives.len() < n;

	let new_states = representatives
		.iter()
		.map(|&rep| {
			let sd = raw_states[rep];
			StateData {
				recognizables: sd.recognizables.clone(),
				transitions: sd
					.transitions
					.iter()
					.map(|(c, t)| (c.clone(), StateId::from_index(class_of[t.index()])))
					.collect(),
			}
		})
		.collect();

	let new_start = StateId::from_index(class_of[a.start().index()]);
	(Automaton::from_parts(new_states, new_start), changed)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::automaton::{self, Automaton};

	fn atom(c: u32) -> Automaton<bool> {
		let mut a = Automaton::transient();
		let accept = a.add_state(vec![true]);
		a.add_transition(a.start(), CharSet::char(c).unwrap(), accept, false);
		a
	}

	#[test]
	fn determinize_produces_deterministic_automaton() {
		let a = atom('a' as u32);
		let b = atom('b' as u32);
		let nfa = automaton::choice(&[a, b]);
		let dfa = determinize(&nfa);
		assert!(dfa.is_deterministic());
	}

	#[test]
	fn determinize_merges_overlapping_ranges() {
		// [a-n] and [h-z] overlap on [h-n]; determinizing must keep the
		// automaton deterministic and preserve the union language.
		let mut an = Automaton::transient();
		let s = an.add_state(vec![true]);
		an.add_transition(an.start(), CharSet::range('a' as u32, 'n' as u32).unwrap(), s, false);

		let mut hz = Automaton::transient();
		let s2 = hz.add_state(vec![true]);
		hz.add_transition(hz.start(), CharSet::range('h' as u32, 'z' as u32).unwrap(), s2, false);

		let nfa = automaton::choice(&[an, hz]);
		let dfa = determinize(&nfa);
		assert!(dfa.is_deterministic());

		for c in ['a', 'h', 'm', 'z'] {
			let mut cur = dfa.start();
			let (_, next) = dfa
				.transitions(cur)
				.into_iter()
				.find(|(t, _)| t.contains(c as u16))
				.unwrap_or_else(|| panic!("no transition for {c}"));
			cur = next;
			assert!(dfa.is_final(cur));
		}
	}

	#[test]
	fn minimize_collapses_equivalent_states() {
		// two independent paths both spelling "ab" should minimize to a
		// shared two-state chain (start -> mid -> end), not stay at four.
		let a = RegexLikeFixture::concat_chars(&['a', 'b']);
		let b = RegexLikeFixture::concat_chars(&['a', 'b']);
		let nfa = automaton::choice(&[a, b]);
		let dfa = determinize(&nfa);
		let min = minimize(&dfa);
		assert!(min.state_count() <= dfa.state_count());
		assert!(min.is_deterministic());
	}

	struct RegexLikeFixture;
	impl RegexLikeFixture {
		fn concat_chars(chars: &[char]) -> Automaton<bool> {
			let mut states: Vec<Automaton<bool>> = chars.iter().map(|&c| atom(c as u32)).collect();
			let mut acc = states.remove(0);
			for next in states {
				acc = automaton::concat(&[acc, next]);
			}
			acc
		}
	}
}
