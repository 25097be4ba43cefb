//! Canonical disjoint-range character sets over the 16-bit code-unit
//! alphabet `[0, 0xFFFF]`.
//!
//! A [`CharSet`] is always kept in *canonical form*: its ranges are
//! sorted ascending by `min` and no two ranges are adjacent or
//! overlapping (there is a gap of at least one code point between
//! consecutive ranges). This invariant is what makes equality,
//! `contains`, and the overlap-partitioning algorithm in
//! [`compute_overlaps`] simple and correct.

use std::collections::BTreeMap;

use rand::Rng;

/// The highest code point in the alphabet this crate operates over.
pub const MAX_CODE_POINT: u32 = 0xFFFF;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid char code {0} (must be in [0, {MAX_CODE_POINT:#x}])")]
	InvalidCharCode(u32),
}

pub type Result<T> = std::result::Result<T, Error>;

fn check(c: u32) -> Result<u16> {
	if c > MAX_CODE_POINT {
		Err(Error::InvalidCharCode(c))
	} else {
		Ok(c as u16)
	}
}

/// A closed interval `[min, max]` of code points, with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Range {
	pub min: u16,
	pub max: u16,
}

impl Range {
	/// Builds a range from two endpoints, swapping them if given backward.
	pub fn new(a: u16, b: u16) -> Self {
		if a <= b {
			Range { min: a, max: b }
		} else {
			Range { min: b, max: a }
		}
	}

	pub fn single(c: u16) -> Self {
		Range { min: c, max: c }
	}

	pub fn contains(&self, c: u16) -> bool {
		self.min <= c && c <= self.max
	}

	/// Number of code points covered by this range.
	pub fn len(&self) -> u32 {
		self.max as u32 - self.min as u32 + 1
	}

	pub fn is_empty(&self) -> bool {
		false
	}
}

/// A canonical, disjoint, non-adjacent sequence of [`Range`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CharSet {
	ranges: Vec<Range>,
}

impl CharSet {
	/// The empty set.
	pub fn empty() -> Self {
		Self::default()
	}

	/// The full alphabet `[0, 0xFFFF]`.
	pub fn full() -> Self {
		Self {
			ranges: vec![Range::new(0, MAX_CODE_POINT as u16)],
		}
	}

	/// A singleton set containing just `c`.
	pub fn char(c: u32) -> Result<Self> {
		let c = check(c)?;
		Ok(Self {
			ranges: vec![Range::single(c)],
		})
	}

	/// The set `[min(a, b), max(a, b)]`.
	pub fn range(a: u32, b: u32) -> Result<Self> {
		let a = check(a)?;
		let b = check(b)?;
		Ok(Self {
			ranges: vec![Range::new(a, b)],
		})
	}

	pub fn from_range(r: Range) -> Self {
		Self { ranges: vec![r] }
	}

	/// Builds a set directly from a sequence of (not necessarily
	/// canonical) ranges, canonicalizing them.
	pub fn from_ranges(ranges: impl IntoIterator<Item = Range>) -> Self {
		union(ranges.into_iter().map(Self::from_range))
	}

	pub fn is_empty(&self) -> bool {
		self.ranges.is_empty()
	}

	/// A defensive copy of the canonical ranges, sorted and disjoint.
	pub fn ranges(&self) -> Vec<Range> {
		self.ranges.clone()
	}

	/// Total number of code points covered by this set.
	pub fn size(&self) -> u64 {
		self.ranges.iter().map(|r| r.len() as u64).sum()
	}

	pub fn contains(&self, c: u16) -> bool {
		self.ranges
			.binary_search_by(|r| {
				if c < r.min {
					std::cmp::Ordering::Greater
				} else if c > r.max {
					std::cmp::Ordering::Less
				} else {
					std::cmp::Ordering::Equal
				}
			})
			.is_ok()
	}

	/// Picks a uniformly-random range, then a uniformly-random code
	/// point within it. Not weighted by range size: see module docs on
	/// `random` in the core spec — this is for test seeding, not
	/// statistical sampling.
	pub fn random(&self, rng: &mut impl Rng) -> Option<u16> {
		if self.ranges.is_empty() {
			return None;
		}
		let r = self.ranges[rng.gen_range(0..self.ranges.len())];
		Some(rng.gen_range(r.min..=r.max))
	}

	pub fn complement(&self) -> CharSet {
		complement(self)
	}

	pub fn union_with(&self, other: &CharSet) -> CharSet {
		union([self.clone(), other.clone()])
	}

	pub fn intersection_with(&self, other: &CharSet) -> CharSet {
		intersection([self.clone(), other.clone()])
	}
}

/// Merges any number of (possibly overlapping, possibly unsorted)
/// char sets into one canonical set. The empty set is the identity;
/// the full set is absorbing.
pub fn union(sets: impl IntoIterator<Item = CharSet>) -> CharSet {
	let mut all: Vec<Range> = sets.into_iter().flat_map(|s| s.ranges).collect();
	all.sort_by_key(|r| r.min);

	let mut merged: Vec<Range> = Vec::with_capacity(all.len());
	for r in all {
		match merged.last_mut() {
			// a gap of zero (adjacent) or negative (overlapping) coalesces.
			Some(last) if (r.min as u32) <= last.max as u32 + 1 => {
				if r.max > last.max {
					last.max = r.max;
				}
			}
			_ => merged.push(r),
		}
	}

	CharSet { ranges: merged }
}

/// The complement of `s` within `[0, 0xFFFF]`. An involution.
pub fn complement(s: &CharSet) -> CharSet {
	let mut ranges = Vec::new();
	let mut next_min: u32 = 0;

	for r in &s.ranges {
		if r.min as u32 > next_min {
			ranges.push(Range::new(next_min as u16, r.min - 1));
		}
		next_min = r.max as u32 + 1;
	}

	if next_min <= MAX_CODE_POINT {
		ranges.push(Range::new(next_min as u16, MAX_CODE_POINT as u16));
	}

	CharSet { ranges }
}

/// `intersection(sets) = complement(union(complements(sets)))`.
pub fn intersection(sets: impl IntoIterator<Item = CharSet>) -> CharSet {
	let complements: Vec<CharSet> = sets.into_iter().map(|s| complement(&s)).collect();
	complement(&union(complements))
}

/// One cell of an N-way overlap partition: the subset of input indices
/// whose sets all cover `set`, and none of the others do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
	pub indices: Vec<usize>,
	pub set: CharSet,
}

#[derive(Clone, Copy)]
enum Event {
	Enter(usize),
	Leave(usize),
}

/// Computes the N-way overlap partition of `sets` (spec §4.1). Produces
/// one [`Overlap`] per distinct non-empty membership set `I`, such that
/// the emitted sets are pairwise disjoint, their union equals the union
/// of all inputs, and for each `i`, the union of the overlaps
/// containing `i` equals `sets[i]`.
///
/// Implemented as a sweep over interval endpoints: "enter" events at
/// `r.min`, "leave" events (as exclusive, i.e. `r.max + 1`) for each
/// range of each input, with events at equal keys applied together
/// before the segment between consecutive keys is emitted.
pub fn compute_overlaps(sets: &[CharSet]) -> Vec<Overlap> {
	let mut events: Vec<(u32, Event)> = Vec::new();
	for (i, s) in sets.iter().enumerate() {
		for r in &s.ranges {
			events.push((r.min as u32, Event::Enter(i)));
			events.push((r.max as u32 + 1, Event::Leave(i)));
		}
	}

	if events.is_empty() {
		return Vec::new();
	}

	events.sort_by_key(|(k, _)| *k);

	let mut active: std::collections::BTreeSet<usize> = std::collections::BTreeSet::new();
	let mut grouped: BTreeMap<Vec<usize>, CharSet> = BTreeMap::new();

	let mut i = 0;
	while i < events.len() {
		let key = events[i].0;
		while i < events.len() && events[i].0 == key {
			match events[i].1 {
				Event::Enter(idx) => {
					active.insert(idx);
				}
				Event::Leave(idx) => {
					active.remove(&idx);
				}
			}
			i += 1;
		}

		if active.is_empty() {
			continue;
		}

		let next_key = if i < events.len() { events[i].0 } else { break };
		if next_key <= key {
			continue;
		}

		let seg = Range::new(key as u16, (next_key - 1) as u16);
		let index_vec: Vec<usize> = active.iter().copied().collect();
		grouped
			.entry(index_vec)
			.and_modify(|existing| *existing = union([existing.clone(), CharSet::from_range(seg)]))
			.or_insert_with(|| CharSet::from_range(seg));
	}

	grouped
		.into_iter()
		.map(|(indices, set)| Overlap { indices, set })
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;

	fn rng() -> impl Rng {
		rand::rngs::StdRng::seed_from_u64(42)
	}

	#[test]
	fn union_identity_and_zero() {
		let s = CharSet::range(10, 20).unwrap();
		assert_eq!(union([s.clone(), CharSet::empty()]), s);
		assert_eq!(union([s, CharSet::full()]), CharSet::full());
	}

	#[test]
	fn intersection_identity_and_zero() {
		let s = CharSet::range(10, 20).unwrap();
		assert_eq!(intersection([s.clone(), CharSet::full()]), s);
		assert_eq!(
			intersection([s, CharSet::empty()]),
			CharSet::empty()
		);
	}

	#[test]
	fn complement_is_involution() {
		let s = CharSet::from_ranges([Range::new(5, 10), Range::new(20, 30)]);
		assert_eq!(complement(&complement(&s)), s);
		assert_eq!(complement(&CharSet::empty()), CharSet::full());
		assert_eq!(complement(&CharSet::full()), CharSet::empty());
	}

	#[test]
	fn union_with_complement_is_full_intersection_is_empty() {
		let s = CharSet::from_ranges([Range::new(5, 10), Range::new(2000, 9000)]);
		let c = complement(&s);
		assert_eq!(union([s.clone(), c.clone()]), CharSet::full());
		assert_eq!(intersection([s, c]), CharSet::empty());
	}

	#[test]
	fn size_inclusion_exclusion() {
		let a = CharSet::from_ranges([Range::new(0, 10)]);
		let b = CharSet::from_ranges([Range::new(5, 15)]);
		let u = union([a.clone(), b.clone()]);
		let i = intersection([a.clone(), b.clone()]);
		assert_eq!(u.size(), a.size() + b.size() - i.size());
	}

	#[test]
	fn adjacent_ranges_coalesce() {
		let s = CharSet::from_ranges([Range::new(0, 9), Range::new(10, 20)]);
		assert_eq!(s.ranges(), vec![Range::new(0, 20)]);
	}

	#[test]
	fn overlap_partition_properties() {
		let a = CharSet::from_ranges([Range::new(0, 100)]);
		let b = CharSet::from_ranges([Range::new(50, 150)]);
		let c = CharSet::from_ranges([Range::new(120, 200)]);
		let sets = [a.clone(), b.clone(), c.clone()];
		let overlaps = compute_overlaps(&sets);

		// pairwise disjoint
		for i in 0..overlaps.len() {
			for j in (i + 1)..overlaps.len() {
				let inter = intersection([overlaps[i].set.clone(), overlaps[j].set.clone()]);
				assert!(inter.is_empty());
			}
		}

		// union of all partitions equals union of inputs
		let total: CharSet = union(overlaps.iter().map(|o| o.set.clone()));
		assert_eq!(total, union(sets.clone()));

		// for each i, union of partitions containing i equals sets[i]
		for (i, expected) in sets.iter().enumerate() {
			let reconstructed = union(
				overlaps
					.iter()
					.filter(|o| o.indices.contains(&i))
					.map(|o| o.set.clone()),
			);
			assert_eq!(&reconstructed, expected);
		}

		// membership sets are unique
		let mut seen = std::collections::HashSet::new();
		for o in &overlaps {
			assert!(seen.insert(o.indices.clone()));
		}
	}

	#[test]
	fn overlap_partition_disjoint_inputs() {
		let a = CharSet::from_ranges([Range::new(0, 10)]);
		let b = CharSet::from_ranges([Range::new(20, 30)]);
		let overlaps = compute_overlaps(&[a.clone(), b.clone()]);
		assert_eq!(overlaps.len(), 2);
		for o in &overlaps {
			assert_eq!(o.indices.len(), 1);
		}
	}

	#[test]
	fn contains_matches_ranges() {
		let s = CharSet::from_ranges([Range::new(10, 20), Range::new(30, 40)]);
		assert!(s.contains(15));
		assert!(!s.contains(25));
		assert!(s.contains(40));
		assert!(!s.contains(41));
	}

	#[test]
	fn accessors_are_defensive_copies() {
		let s = CharSet::from_ranges([Range::new(10, 20)]);
		let mut copy = s.ranges();
		copy.push(Range::new(100, 200));
		assert_eq!(s.ranges(), vec![Range::new(10, 20)]);
	}

	#[test]
	fn random_stays_within_set() {
		let s = CharSet::from_ranges([Range::new(10, 20), Range::new(100, 110)]);
		let mut rng = rng();
		for _ in 0..200 {
			let c = s.random(&mut rng).unwrap();
			assert!(s.contains(c));
		}
	}

	#[test]
	fn invalid_char_code_fails() {
		assert!(CharSet::char(0x1_0000).is_err());
		assert!(CharSet::char(0xFFFF).is_ok());
	}
}
