use rand::Rng;

use serde::{Deserialize, Serialize};

/// A selectable text unit of a pool.
///
/// A grapheme is a single letter (`"a"`), a digraph (`"sh"`) or any longer
/// sequence that must be picked atomically. Its `weight` is the relative
/// likelihood of being drawn from the pool that holds it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Grapheme {
	/// The text emitted when this grapheme is selected.
	pub value: String,
	/// Relative selection weight. `0` means never selected.
	pub weight: u32,
}

impl Grapheme {
	/// Creates a grapheme with the default weight of 1.
	pub fn new(value: impl Into<String>) -> Self {
		Self::weighted(value, 1)
	}

	/// Creates a grapheme with an explicit weight.
	pub fn weighted(value: impl Into<String>, weight: u32) -> Self {
		Self { value: value.into(), weight }
	}
}

/// An ordered collection of weighted graphemes.
///
/// Insertion order has no effect on the selection probabilities but is
/// preserved so that seeded generation is reproducible.
///
/// ## Invariants
/// - A pool is only sampled when it holds at least one grapheme of
///   non-zero weight; otherwise [`GraphemePool::sample`] returns `None`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct GraphemePool {
	graphemes: Vec<Grapheme>,
}

impl GraphemePool {
	/// Creates an empty pool.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, grapheme: Grapheme) {
		self.graphemes.push(grapheme);
	}

	pub fn extend<I: IntoIterator<Item = Grapheme>>(&mut self, graphemes: I) {
		self.graphemes.extend(graphemes);
	}

	pub fn len(&self) -> usize {
		self.graphemes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.graphemes.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Grapheme> {
		self.graphemes.iter()
	}

	/// Sum of all weights in the pool.
	pub fn total_weight(&self) -> u64 {
		self.graphemes.iter().map(|g| u64::from(g.weight)).sum()
	}

	/// Returns `true` if at least one grapheme can be drawn.
	pub fn is_selectable(&self) -> bool {
		self.total_weight() > 0
	}

	/// Sets the weight of every grapheme from index `start` to the end.
	///
	/// Used by pool handles to re-weight exactly the graphemes they added.
	pub(crate) fn set_weight_from(&mut self, start: usize, weight: u32) {
		for grapheme in self.graphemes.iter_mut().skip(start) {
			grapheme.weight = weight;
		}
	}

	/// Draws one grapheme using weighted random sampling.
	///
	/// The probability of selecting a grapheme is proportional to its weight.
	///
	/// This method performs:
	/// - a uniform draw in `[0, total_weight)`
	/// - an O(n) walk accumulating weights until the running total
	///   exceeds the draw
	///
	/// Returns `None` if the pool is empty or its total weight is 0.
	pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<&Grapheme> {
		let total = self.total_weight();
		if total == 0 {
			return None;
		}

		let draw = rng.random_range(0..total);

		let mut running = 0u64;
		for grapheme in &self.graphemes {
			running += u64::from(grapheme.weight);
			if running > draw {
				return Some(grapheme);
			}
		}

		// Unreachable: the running total ends at `total > draw`.
		None
	}
}

impl FromIterator<Grapheme> for GraphemePool {
	fn from_iter<I: IntoIterator<Item = Grapheme>>(iter: I) -> Self {
		Self { graphemes: iter.into_iter().collect() }
	}
}
