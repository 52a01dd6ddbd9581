use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;

use serde::{Deserialize, Serialize};

use super::grapheme::{Grapheme, GraphemePool};
use super::probability::{ProbabilityTable, Slot};
use crate::error::{GenerationError, Result};

/// The eight grapheme pools of a syllable generator.
///
/// Each structural role (leading consonant, vowel, trailing consonant,
/// final consonant) has a single-grapheme pool and a sequence pool.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PoolCategory {
	LeadingConsonant,
	LeadingConsonantSequence,
	Vowel,
	VowelSequence,
	TrailingConsonant,
	TrailingConsonantSequence,
	FinalConsonant,
	FinalConsonantSequence,
}

impl PoolCategory {
	pub fn is_sequence(self) -> bool {
		matches!(
			self,
			Self::LeadingConsonantSequence
				| Self::VowelSequence
				| Self::TrailingConsonantSequence
				| Self::FinalConsonantSequence
		)
	}

	/// The sequence pool of the same structural role.
	pub fn sequence(self) -> Self {
		match self {
			Self::LeadingConsonant | Self::LeadingConsonantSequence => Self::LeadingConsonantSequence,
			Self::Vowel | Self::VowelSequence => Self::VowelSequence,
			Self::TrailingConsonant | Self::TrailingConsonantSequence => Self::TrailingConsonantSequence,
			Self::FinalConsonant | Self::FinalConsonantSequence => Self::FinalConsonantSequence,
		}
	}

	/// The single-grapheme pool of the same structural role.
	pub fn single(self) -> Self {
		match self {
			Self::LeadingConsonant | Self::LeadingConsonantSequence => Self::LeadingConsonant,
			Self::Vowel | Self::VowelSequence => Self::Vowel,
			Self::TrailingConsonant | Self::TrailingConsonantSequence => Self::TrailingConsonant,
			Self::FinalConsonant | Self::FinalConsonantSequence => Self::FinalConsonant,
		}
	}

	/// Slot deciding whether this role appears in a syllable.
	pub fn exists_slot(self) -> Slot {
		match self.single() {
			Self::LeadingConsonant => Slot::LeadingConsonantExists,
			Self::Vowel => Slot::VowelExists,
			Self::TrailingConsonant => Slot::TrailingConsonantExists,
			_ => Slot::FinalConsonantExists,
		}
	}

	/// Slot deciding whether this role is drawn from its sequence pool.
	pub fn is_sequence_slot(self) -> Slot {
		match self.single() {
			Self::LeadingConsonant => Slot::LeadingConsonantIsSequence,
			Self::Vowel => Slot::VowelIsSequence,
			Self::TrailingConsonant => Slot::TrailingConsonantIsSequence,
			_ => Slot::FinalConsonantIsSequence,
		}
	}

	/// Slots that receive their default probability when this pool is
	/// populated for the first time.
	fn defaulted_slots(self) -> &'static [Slot] {
		match self {
			Self::LeadingConsonant => &[Slot::LeadingConsonantExists],
			Self::LeadingConsonantSequence => &[Slot::LeadingConsonantExists, Slot::LeadingConsonantIsSequence],
			Self::Vowel => &[Slot::VowelExists],
			Self::VowelSequence => &[Slot::VowelExists, Slot::VowelIsSequence],
			Self::TrailingConsonant => &[Slot::TrailingConsonantExists],
			Self::TrailingConsonantSequence => &[Slot::TrailingConsonantExists, Slot::TrailingConsonantIsSequence],
			Self::FinalConsonant => &[Slot::FinalConsonantExists],
			Self::FinalConsonantSequence => &[Slot::FinalConsonantExists, Slot::FinalConsonantIsSequence],
		}
	}
}

impl fmt::Display for PoolCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::LeadingConsonant => "leading consonant",
			Self::LeadingConsonantSequence => "leading consonant sequence",
			Self::Vowel => "vowel",
			Self::VowelSequence => "vowel sequence",
			Self::TrailingConsonant => "trailing consonant",
			Self::TrailingConsonantSequence => "trailing consonant sequence",
			Self::FinalConsonant => "final consonant",
			Self::FinalConsonantSequence => "final consonant sequence",
		};
		f.write_str(name)
	}
}

/// Position of a syllable inside a name.
///
/// Determines which assembly rules apply:
/// - `Starting`: may open with a lone vowel
/// - `Middle`: plain leading consonant + vowel + trailing consonant
/// - `Ending`: may close with a final consonant instead of a trailing one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyllablePosition {
	Starting,
	Middle,
	Ending,
}

/// Probabilistic syllable assembler.
///
/// Holds the eight grapheme pools and the probability table. Generation is
/// read-only: the random source is supplied by the caller, so a configured
/// generator can be shared between threads.
///
/// # Responsibilities
/// - Store pools and per-slot probabilities
/// - Apply default probabilities when a pool is first populated
/// - Assemble one syllable for a given position through independent
///   weighted coin-flips
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SyllableGenerator {
	pools: BTreeMap<PoolCategory, GraphemePool>,
	probabilities: ProbabilityTable,
	allow_empty: bool,
}

impl SyllableGenerator {
	/// Creates a generator with no pools and no probabilities.
	pub fn new() -> Self {
		Self::default()
	}

	/// A ready-made generator producing English-sounding syllables.
	pub fn standard() -> Self {
		let mut syllables = Self::new();
		syllables
			.add_chars(PoolCategory::LeadingConsonant, "bcdfghjklmnpqrstvwxyz")
			.sequences(["ch", "sh", "bl", "cl", "fl", "pl", "gl", "br", "cr", "dr", "pr", "tr", "th", "sc", "sp", "st", "sl", "spr"]);
		syllables
			.add_chars(PoolCategory::Vowel, "aeiou")
			.sequences(["ae", "ea", "ai", "ia", "au", "ay", "ie", "oi", "ou", "ey"]);
		syllables
			.add_chars(PoolCategory::TrailingConsonant, "bcdfghklmnprstvxz")
			.sequences(["ck", "st", "sc", "ng", "nk", "rsh", "lsh", "rk", "rst", "nct", "xt"]);
		syllables
	}

	/// Adds graphemes (one per item) to a pool.
	///
	/// Populating a pool applies the default probabilities of its slots
	/// unless they were configured explicitly.
	///
	/// Returns a handle on the graphemes just added so their weight,
	/// sequences or probability can be adjusted explicitly.
	pub fn add<I, S>(&mut self, category: PoolCategory, values: I) -> PoolHandle<'_>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let pool = self.pools.entry(category).or_default();
		let start = pool.len();
		pool.extend(values.into_iter().map(Grapheme::new));
		let added = pool.len() > start;

		if added {
			for slot in category.defaulted_slots() {
				self.probabilities.set_default(*slot);
			}
		}

		PoolHandle { syllables: self, category, start }
	}

	/// Adds every character of `letters` as its own grapheme.
	pub fn add_chars(&mut self, category: PoolCategory, letters: &str) -> PoolHandle<'_> {
		self.add(category, letters.chars().map(String::from))
	}

	/// Adds one grapheme with an explicit weight.
	pub fn add_weighted(&mut self, category: PoolCategory, value: impl Into<String>, weight: u32) -> PoolHandle<'_> {
		let value: String = value.into();
		self.add(category, [value]).weight(weight)
	}

	/// Sets a probability slot explicitly.
	///
	/// # Errors
	/// Returns `InvalidConfiguration` if `probability` is outside `[0.0, 1.0]`.
	pub fn set_probability(&mut self, slot: Slot, probability: f64) -> Result<&mut Self> {
		self.probabilities.set(slot, probability)?;
		Ok(self)
	}

	/// Disables a probability slot.
	pub fn clear_probability(&mut self, slot: Slot) -> &mut Self {
		self.probabilities.clear(slot);
		self
	}

	/// Allows or forbids syllables that assemble to the empty string.
	pub fn allow_empty(&mut self, allow: bool) -> &mut Self {
		self.allow_empty = allow;
		self
	}

	pub fn allows_empty(&self) -> bool {
		self.allow_empty
	}

	pub fn pool(&self, category: PoolCategory) -> Option<&GraphemePool> {
		self.pools.get(&category)
	}

	pub fn probabilities(&self) -> &ProbabilityTable {
		&self.probabilities
	}

	/// Checks the probability table after deserialisation.
	pub(crate) fn validate(&self) -> Result<()> {
		self.probabilities.validate()
	}

	/// Draws one grapheme from a pool.
	///
	/// # Errors
	/// Returns `EmptyPool` if the pool is missing, empty or weightless.
	fn sample<R: Rng>(&self, category: PoolCategory, rng: &mut R) -> Result<&str> {
		self.pools
			.get(&category)
			.and_then(|pool| pool.sample(rng))
			.map(|grapheme| grapheme.value.as_str())
			.ok_or(GenerationError::EmptyPool { category })
	}

	/// Coin-flip against an optional probability. Unset slots never fire.
	fn fires<R: Rng>(&self, slot: Slot, rng: &mut R) -> bool {
		match self.probabilities.get(slot) {
			Some(probability) => rng.random::<f64>() < probability,
			None => false,
		}
	}

	/// Emits one grapheme for a role, choosing between its single and
	/// sequence pools.
	///
	/// The sequence pool is used when the `is_sequence` slot is set and
	/// either the single pool cannot be sampled or the sub-flip fires.
	fn emit<R: Rng>(&self, role: PoolCategory, is_sequence: Slot, rng: &mut R, output: &mut String) -> Result<()> {
		let single = role.single();
		let use_sequence = match self.probabilities.get(is_sequence) {
			Some(probability) => {
				let single_selectable = self.pools.get(&single).is_some_and(GraphemePool::is_selectable);
				!single_selectable || rng.random::<f64>() < probability
			}
			None => false,
		};

		let category = if use_sequence { role.sequence() } else { single };
		output.push_str(self.sample(category, rng)?);
		Ok(())
	}

	/// Emits a role if its existence flip fires.
	fn emit_if_exists<R: Rng>(&self, role: PoolCategory, rng: &mut R, output: &mut String) -> Result<bool> {
		if self.fires(role.exists_slot(), rng) {
			self.emit(role, role.is_sequence_slot(), rng, output)?;
			return Ok(true);
		}
		Ok(false)
	}

	/// Assembles one syllable for the given position.
	///
	/// # Behavior
	/// 1. Starting syllables may open with a lone vowel
	///    (`StartingSyllableLeadingVowelExists`), which replaces the
	///    leading consonant + vowel step.
	/// 2. Otherwise an optional leading consonant, then an optional vowel.
	/// 3. Ending syllables may close with a final consonant.
	/// 4. If no final consonant was emitted, an optional trailing consonant.
	///
	/// # Errors
	/// - `EmptyPool` if a slot fires and its pool cannot be sampled
	/// - `DegenerateOutput` if the syllable is empty and empty output
	///   is not allowed
	pub fn next_syllable<R: Rng>(&self, position: SyllablePosition, rng: &mut R) -> Result<String> {
		let mut output = String::new();

		let leading_vowel = position == SyllablePosition::Starting
			&& self.fires(Slot::StartingSyllableLeadingVowelExists, rng);

		if leading_vowel {
			self.emit(PoolCategory::Vowel, Slot::StartingSyllableLeadingVowelIsSequence, rng, &mut output)?;
		} else {
			self.emit_if_exists(PoolCategory::LeadingConsonant, rng, &mut output)?;
			self.emit_if_exists(PoolCategory::Vowel, rng, &mut output)?;
		}

		// Final and trailing consonants are mutually exclusive on the ending syllable
		let has_final = position == SyllablePosition::Ending
			&& self.emit_if_exists(PoolCategory::FinalConsonant, rng, &mut output)?;
		if !has_final {
			self.emit_if_exists(PoolCategory::TrailingConsonant, rng, &mut output)?;
		}

		if output.is_empty() && !self.allow_empty {
			return Err(GenerationError::DegenerateOutput);
		}
		Ok(output)
	}

	pub fn next_starting_syllable<R: Rng>(&self, rng: &mut R) -> Result<String> {
		self.next_syllable(SyllablePosition::Starting, rng)
	}

	pub fn next_middle_syllable<R: Rng>(&self, rng: &mut R) -> Result<String> {
		self.next_syllable(SyllablePosition::Middle, rng)
	}

	pub fn next_ending_syllable<R: Rng>(&self, rng: &mut R) -> Result<String> {
		self.next_syllable(SyllablePosition::Ending, rng)
	}
}

/// Handle on graphemes just added to a pool.
///
/// Replaces implicit "last modified pool" state: every adjustment names the
/// pool it applies to.
pub struct PoolHandle<'a> {
	syllables: &'a mut SyllableGenerator,
	category: PoolCategory,
	start: usize,
}

impl<'a> PoolHandle<'a> {
	pub fn category(&self) -> PoolCategory {
		self.category
	}

	/// Sets the weight of the graphemes added through this handle.
	pub fn weight(self, weight: u32) -> Self {
		if let Some(pool) = self.syllables.pools.get_mut(&self.category) {
			pool.set_weight_from(self.start, weight);
		}
		self
	}

	/// Adds sequences to the sequence pool of the same role.
	pub fn sequences<I, S>(self, values: I) -> PoolHandle<'a>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let PoolHandle { syllables, category, .. } = self;
		syllables.add(category.sequence(), values)
	}

	/// Sets the existence probability of this pool's role explicitly.
	///
	/// # Errors
	/// Returns `InvalidConfiguration` if `probability` is outside `[0.0, 1.0]`.
	pub fn probability(self, probability: f64) -> Result<Self> {
		self.syllables.probabilities.set(self.category.exists_slot(), probability)?;
		Ok(self)
	}

	/// Sets the sequence-vs-single probability of this pool's role explicitly.
	pub fn sequence_probability(self, probability: f64) -> Result<Self> {
		self.syllables.probabilities.set(self.category.is_sequence_slot(), probability)?;
		Ok(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn rng() -> StdRng {
		StdRng::seed_from_u64(42)
	}

	#[test]
	fn populating_a_pool_applies_defaults() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::Vowel, "ae");
		syllables.add(PoolCategory::TrailingConsonantSequence, ["st"]);

		let table = syllables.probabilities();
		assert_eq!(table.get(Slot::VowelExists), Some(1.0));
		assert_eq!(table.get(Slot::VowelIsSequence), None);
		assert_eq!(table.get(Slot::TrailingConsonantExists), Some(0.10));
		assert_eq!(table.get(Slot::TrailingConsonantIsSequence), Some(0.25));
		assert_eq!(table.get(Slot::LeadingConsonantExists), None);
	}

	#[test]
	fn adding_nothing_applies_no_default() {
		let mut syllables = SyllableGenerator::new();
		syllables.add(PoolCategory::FinalConsonant, Vec::<String>::new());
		assert_eq!(syllables.probabilities().get(Slot::FinalConsonantExists), None);
	}

	#[test]
	fn explicit_probability_survives_more_graphemes() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::LeadingConsonant, "st");
		syllables.set_probability(Slot::LeadingConsonantExists, 0.3).unwrap();
		syllables.add_chars(PoolCategory::LeadingConsonant, "r");
		syllables.add(PoolCategory::LeadingConsonantSequence, ["str"]);

		assert_eq!(syllables.probabilities().get(Slot::LeadingConsonantExists), Some(0.3));
		assert_eq!(syllables.pool(PoolCategory::LeadingConsonant).unwrap().len(), 3);
	}

	#[test]
	fn handle_weights_only_its_own_graphemes() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::Vowel, "ae");
		syllables.add_chars(PoolCategory::Vowel, "io").weight(3).sequences(["ou"]).weight(2);

		let weights: Vec<u32> = syllables.pool(PoolCategory::Vowel).unwrap().iter().map(|g| g.weight).collect();
		assert_eq!(weights, vec![1, 1, 3, 3]);
		let sequence = syllables.pool(PoolCategory::VowelSequence).unwrap();
		assert_eq!(sequence.iter().map(|g| g.weight).collect::<Vec<_>>(), vec![2]);
	}

	#[test]
	fn handle_probability_targets_the_role() {
		let mut syllables = SyllableGenerator::new();
		syllables
			.add(PoolCategory::FinalConsonantSequence, ["nd"])
			.probability(0.8)
			.unwrap()
			.sequence_probability(1.0)
			.unwrap();
		assert_eq!(syllables.probabilities().get(Slot::FinalConsonantExists), Some(0.8));
		assert_eq!(syllables.probabilities().get(Slot::FinalConsonantIsSequence), Some(1.0));
		assert!(syllables.add_chars(PoolCategory::Vowel, "a").probability(2.0).is_err());
	}

	#[test]
	fn middle_syllable_uses_leading_vowel_trailing() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::LeadingConsonant, "t").probability(1.0).unwrap();
		syllables.add_chars(PoolCategory::Vowel, "a");
		syllables.add_chars(PoolCategory::TrailingConsonant, "n").probability(1.0).unwrap();
		syllables.add_chars(PoolCategory::FinalConsonant, "x").probability(1.0).unwrap();

		let mut rng = rng();
		assert_eq!(syllables.next_middle_syllable(&mut rng).unwrap(), "tan");
		assert_eq!(syllables.next_starting_syllable(&mut rng).unwrap(), "tan");
		// The final consonant replaces the trailing one on the ending syllable
		assert_eq!(syllables.next_ending_syllable(&mut rng).unwrap(), "tax");
	}

	#[test]
	fn trailing_consonant_used_when_final_does_not_fire() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::Vowel, "a");
		syllables.add_chars(PoolCategory::TrailingConsonant, "n").probability(1.0).unwrap();
		syllables.add_chars(PoolCategory::FinalConsonant, "x").probability(0.0).unwrap();

		let mut rng = rng();
		for _ in 0..50 {
			assert_eq!(syllables.next_ending_syllable(&mut rng).unwrap(), "an");
		}
	}

	#[test]
	fn leading_vowel_only_on_starting_syllable() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::LeadingConsonant, "k").probability(1.0).unwrap();
		syllables.add_chars(PoolCategory::Vowel, "o");
		syllables.set_probability(Slot::StartingSyllableLeadingVowelExists, 1.0).unwrap();

		let mut rng = rng();
		assert_eq!(syllables.next_starting_syllable(&mut rng).unwrap(), "o");
		assert_eq!(syllables.next_middle_syllable(&mut rng).unwrap(), "ko");
		assert_eq!(syllables.next_ending_syllable(&mut rng).unwrap(), "ko");
	}

	#[test]
	fn leading_vowel_sequence_sub_flip() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::Vowel, "o").sequences(["ou"]);
		syllables.set_probability(Slot::StartingSyllableLeadingVowelExists, 1.0).unwrap();
		syllables.set_probability(Slot::StartingSyllableLeadingVowelIsSequence, 1.0).unwrap();

		assert_eq!(syllables.next_starting_syllable(&mut rng()).unwrap(), "ou");
	}

	#[test]
	fn sequence_pool_is_used_when_single_pool_is_empty() {
		let mut syllables = SyllableGenerator::new();
		syllables.add(PoolCategory::VowelSequence, ["ae"]);

		let mut rng = rng();
		for _ in 0..20 {
			assert_eq!(syllables.next_middle_syllable(&mut rng).unwrap(), "ae");
		}
	}

	#[test]
	fn sequence_sub_flip_converges_to_its_probability() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::Vowel, "a").sequences(["ou"]).sequence_probability(0.25).unwrap();

		let mut rng = rng();
		let draws = 100_000;
		let sequences = (0..draws)
			.filter(|_| syllables.next_middle_syllable(&mut rng).unwrap() == "ou")
			.count();

		let frequency = sequences as f64 / draws as f64;
		assert!((frequency - 0.25).abs() < 0.01, "sequence drawn with frequency {frequency}");
	}

	#[test]
	fn unset_slots_disable_populated_pools() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::Vowel, "a");
		syllables.add_chars(PoolCategory::LeadingConsonant, "b");
		syllables.clear_probability(Slot::LeadingConsonantExists);

		assert_eq!(syllables.next_middle_syllable(&mut rng()).unwrap(), "a");
	}

	#[test]
	fn enabled_slot_with_empty_pool_fails() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::Vowel, "a");
		syllables.set_probability(Slot::TrailingConsonantExists, 1.0).unwrap();

		match syllables.next_middle_syllable(&mut rng()) {
			Err(GenerationError::EmptyPool { category }) => assert_eq!(category, PoolCategory::TrailingConsonant),
			other => panic!("expected EmptyPool, got {other:?}"),
		}
	}

	#[test]
	fn weightless_pool_fails() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_weighted(PoolCategory::Vowel, "a", 0);
		assert!(matches!(
			syllables.next_middle_syllable(&mut rng()),
			Err(GenerationError::EmptyPool { category: PoolCategory::Vowel })
		));
	}

	#[test]
	fn empty_syllables_are_degenerate_unless_allowed() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::Vowel, "a").probability(0.0).unwrap();

		assert!(matches!(
			syllables.next_middle_syllable(&mut rng()),
			Err(GenerationError::DegenerateOutput)
		));

		syllables.allow_empty(true);
		assert_eq!(syllables.next_middle_syllable(&mut rng()).unwrap(), "");
	}

	#[test]
	fn standard_generator_produces_letters() {
		let syllables = SyllableGenerator::standard();
		let mut rng = rng();
		for _ in 0..200 {
			let syllable = syllables.next_middle_syllable(&mut rng).unwrap();
			assert!(!syllable.is_empty());
			assert!(syllable.chars().all(|c| c.is_ascii_lowercase()));
		}
	}
}
