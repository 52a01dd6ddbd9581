use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// A named probability of the syllable assembler.
///
/// Each structural role has an `Exists` slot (does the role appear in the
/// syllable at all) and an `IsSequence` slot (is it drawn from the sequence
/// pool instead of the single-grapheme pool).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
	LeadingConsonantExists,
	LeadingConsonantIsSequence,
	VowelExists,
	VowelIsSequence,
	TrailingConsonantExists,
	TrailingConsonantIsSequence,
	FinalConsonantExists,
	FinalConsonantIsSequence,
	StartingSyllableLeadingVowelExists,
	StartingSyllableLeadingVowelIsSequence,
}

impl Slot {
	/// All slots, in declaration order.
	pub const ALL: [Slot; 10] = [
		Slot::LeadingConsonantExists,
		Slot::LeadingConsonantIsSequence,
		Slot::VowelExists,
		Slot::VowelIsSequence,
		Slot::TrailingConsonantExists,
		Slot::TrailingConsonantIsSequence,
		Slot::FinalConsonantExists,
		Slot::FinalConsonantIsSequence,
		Slot::StartingSyllableLeadingVowelExists,
		Slot::StartingSyllableLeadingVowelIsSequence,
	];

	/// Probability assigned when the slot's pool is first populated.
	///
	/// The starting-syllable slots are opt-in and have no default.
	pub fn default_probability(self) -> Option<f64> {
		match self {
			Slot::LeadingConsonantExists => Some(0.95),
			Slot::LeadingConsonantIsSequence => Some(0.25),
			Slot::VowelExists => Some(1.0),
			Slot::VowelIsSequence => Some(0.25),
			Slot::TrailingConsonantExists => Some(0.10),
			Slot::TrailingConsonantIsSequence => Some(0.25),
			Slot::FinalConsonantExists => Some(0.50),
			Slot::FinalConsonantIsSequence => Some(0.25),
			Slot::StartingSyllableLeadingVowelExists
			| Slot::StartingSyllableLeadingVowelIsSequence => None,
		}
	}
}

impl fmt::Display for Slot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Slot::LeadingConsonantExists => "leading consonant exists",
			Slot::LeadingConsonantIsSequence => "leading consonant is sequence",
			Slot::VowelExists => "vowel exists",
			Slot::VowelIsSequence => "vowel is sequence",
			Slot::TrailingConsonantExists => "trailing consonant exists",
			Slot::TrailingConsonantIsSequence => "trailing consonant is sequence",
			Slot::FinalConsonantExists => "final consonant exists",
			Slot::FinalConsonantIsSequence => "final consonant is sequence",
			Slot::StartingSyllableLeadingVowelExists => "starting syllable leading vowel exists",
			Slot::StartingSyllableLeadingVowelIsSequence => "starting syllable leading vowel is sequence",
		};
		f.write_str(name)
	}
}

/// Per-slot probabilities of the syllable assembler.
///
/// An unset slot disables its feature regardless of pool contents.
///
/// # Invariants
/// - Every stored probability lies in `[0.0, 1.0]`
/// - Defaults never overwrite an explicitly configured value
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct ProbabilityTable {
	values: BTreeMap<Slot, f64>,
}

impl ProbabilityTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the configured probability of a slot, if any.
	pub fn get(&self, slot: Slot) -> Option<f64> {
		self.values.get(&slot).copied()
	}

	/// Sets a slot explicitly.
	///
	/// # Errors
	/// Returns `InvalidConfiguration` if `probability` is outside `[0.0, 1.0]`.
	pub fn set(&mut self, slot: Slot, probability: f64) -> Result<()> {
		if !(0.0..=1.0).contains(&probability) {
			return Err(GenerationError::invalid_configuration(format!(
				"probability for '{slot}' must be between 0.0 and 1.0, got {probability}"
			)));
		}
		self.values.insert(slot, probability);
		Ok(())
	}

	/// Disables a slot.
	pub fn clear(&mut self, slot: Slot) {
		self.values.remove(&slot);
	}

	/// Applies the slot's default probability unless a value is already set.
	pub fn set_default(&mut self, slot: Slot) {
		if let Some(default) = slot.default_probability() {
			self.values.entry(slot).or_insert(default);
		}
	}

	/// Iterates over the configured slots.
	pub fn iter(&self) -> impl Iterator<Item = (Slot, f64)> + '_ {
		self.values.iter().map(|(slot, p)| (*slot, *p))
	}

	/// Re-checks every stored probability.
	///
	/// Needed after deserialisation, which bypasses [`ProbabilityTable::set`].
	pub fn validate(&self) -> Result<()> {
		for (slot, probability) in self.iter() {
			if !(0.0..=1.0).contains(&probability) {
				return Err(GenerationError::invalid_configuration(format!(
					"probability for '{slot}' must be between 0.0 and 1.0, got {probability}"
				)));
			}
		}
		Ok(())
	}
}
