use std::fmt;
use std::sync::Arc;

use rand::Rng;

use serde::{Deserialize, Serialize};

use super::name::Name;
use super::pattern::Pattern;
use crate::error::{BoxError, GenerationError, Result};

type Callback = dyn Fn(&mut Name) -> std::result::Result<(), BoxError> + Send + Sync;

/// A user-supplied edit applied to a name in place.
///
/// Callbacks are code, not data: they are skipped by serialisation and must
/// be re-attached after a configuration is loaded.
#[derive(Clone)]
pub struct CustomStep(Arc<Callback>);

impl CustomStep {
	pub fn new<F>(callback: F) -> Self
	where
		F: Fn(&mut Name) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
	{
		Self(Arc::new(callback))
	}

	fn call(&self, name: &mut Name) -> Result<()> {
		(self.0)(name).map_err(GenerationError::Custom)
	}
}

impl fmt::Debug for CustomStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("CustomStep(..)")
	}
}

/// One edit of a mutation.
///
/// Indices may be negative to count from the end: `-1` is the last syllable.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Step {
	ReplaceSyllable { index: isize, text: String },
	InsertSyllable { index: isize, text: String },
	AppendSyllable { text: String },
	RemoveSyllable { index: isize },
	#[serde(skip)]
	Custom(CustomStep),
}

/// Resolves a possibly negative index against `len` slots.
fn resolve(index: isize, len: usize) -> Option<usize> {
	let resolved = if index < 0 { len as isize + index } else { index };
	if resolved >= 0 && (resolved as usize) < len {
		Some(resolved as usize)
	} else {
		None
	}
}

impl Step {
	/// Applies the step to `name` in place.
	///
	/// # Errors
	/// - `IndexOutOfRange` if a replace, insert or remove index does not exist
	/// - `InvalidOperation` if a remove would leave the name without syllables
	/// - `Custom` if a callback fails
	pub fn apply(&self, name: &mut Name) -> Result<()> {
		let len = name.len();
		match self {
			Step::ReplaceSyllable { index, text } => {
				let i = resolve(*index, len).ok_or(GenerationError::IndexOutOfRange { index: *index, len })?;
				name.syllables_mut()[i] = text.clone();
			}
			Step::InsertSyllable { index, text } => {
				// Positive indices may point one past the end; -1 inserts before the last syllable
				let slots = if *index < 0 { len } else { len + 1 };
				let i = resolve(*index, slots).ok_or(GenerationError::IndexOutOfRange { index: *index, len })?;
				name.syllables_mut().insert(i, text.clone());
			}
			Step::AppendSyllable { text } => name.syllables_mut().push(text.clone()),
			Step::RemoveSyllable { index } => {
				let i = resolve(*index, len).ok_or(GenerationError::IndexOutOfRange { index: *index, len })?;
				if len == 1 {
					return Err(GenerationError::InvalidOperation(
						"removing the only syllable would leave an empty name".to_owned(),
					));
				}
				name.syllables_mut().remove(i);
			}
			Step::Custom(step) => step.call(name)?,
		}
		Ok(())
	}
}

/// Gate deciding whether a mutation may apply to a name.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Condition {
	/// `None`: the pattern may match anywhere in the rendered name.
	/// `Some(i)`: the pattern must match syllable `i`.
	pub index: Option<isize>,
	pub pattern: Pattern,
}

impl Condition {
	/// # Errors
	/// Returns `InvalidPattern` if `pattern` does not compile.
	pub fn new(index: Option<isize>, pattern: &str) -> Result<Self> {
		Ok(Self { index, pattern: Pattern::new(pattern)? })
	}

	/// A syllable index outside the name never satisfies the condition.
	pub fn is_satisfied(&self, name: &Name) -> bool {
		match self.index {
			None => self.pattern.is_match(&name.render()),
			Some(index) => resolve(index, name.len())
				.is_some_and(|i| self.pattern.is_match(&name.syllables()[i])),
		}
	}
}

/// A reusable, optionally gated recipe of edits.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Mutation {
	pub steps: Vec<Step>,
	pub condition: Option<Condition>,
}

impl Mutation {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn replace_syllable(mut self, index: isize, text: impl Into<String>) -> Self {
		self.steps.push(Step::ReplaceSyllable { index, text: text.into() });
		self
	}

	pub fn insert_syllable(mut self, index: isize, text: impl Into<String>) -> Self {
		self.steps.push(Step::InsertSyllable { index, text: text.into() });
		self
	}

	pub fn append_syllable(mut self, text: impl Into<String>) -> Self {
		self.steps.push(Step::AppendSyllable { text: text.into() });
		self
	}

	pub fn remove_syllable(mut self, index: isize) -> Self {
		self.steps.push(Step::RemoveSyllable { index });
		self
	}

	pub fn custom<F>(mut self, callback: F) -> Self
	where
		F: Fn(&mut Name) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
	{
		self.steps.push(Step::Custom(CustomStep::new(callback)));
		self
	}

	/// Gates the mutation behind a pattern.
	///
	/// # Errors
	/// Returns `InvalidPattern` if `pattern` does not compile.
	pub fn when(mut self, index: Option<isize>, pattern: &str) -> Result<Self> {
		self.condition = Some(Condition::new(index, pattern)?);
		Ok(self)
	}

	pub fn is_eligible(&self, name: &Name) -> bool {
		self.condition.as_ref().is_none_or(|condition| condition.is_satisfied(name))
	}

	/// Applies every step in order.
	pub fn apply(&self, name: &mut Name) -> Result<()> {
		for step in &self.steps {
			step.apply(name)?;
		}
		Ok(())
	}
}

/// How a mutator picks among eligible mutations.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
	/// One eligible mutation chosen uniformly at random.
	#[default]
	RandomOne,
	/// Every eligible mutation, in configured order.
	All,
}

/// Mutation engine producing bounded variations of existing names.
///
/// # Responsibilities
/// - Hold an ordered list of mutations and an activation probability
/// - Select the mutations whose condition holds for a name
/// - Apply the selected steps to a copy of the name
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Mutator {
	mutations: Vec<Mutation>,
	probability: f64,
	mode: SelectionMode,
}

impl Default for Mutator {
	fn default() -> Self {
		Self { mutations: Vec::new(), probability: 1.0, mode: SelectionMode::default() }
	}
}

impl Mutator {
	/// Creates an empty mutator that always fires.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_mutation(mut self, mutation: Mutation) -> Self {
		self.mutations.push(mutation);
		self
	}

	/// Sets the activation probability used by the name generator.
	///
	/// # Errors
	/// Returns `InvalidConfiguration` if `probability` is outside `[0.0, 1.0]`.
	pub fn with_probability(mut self, probability: f64) -> Result<Self> {
		Self::check_probability(probability)?;
		self.probability = probability;
		Ok(self)
	}

	pub fn with_mode(mut self, mode: SelectionMode) -> Self {
		self.mode = mode;
		self
	}

	pub fn probability(&self) -> f64 {
		self.probability
	}

	pub fn mutations(&self) -> &[Mutation] {
		&self.mutations
	}

	fn check_probability(probability: f64) -> Result<()> {
		if !(0.0..=1.0).contains(&probability) {
			return Err(GenerationError::invalid_configuration(format!(
				"mutation probability must be between 0.0 and 1.0, got {probability}"
			)));
		}
		Ok(())
	}

	pub(crate) fn validate(&self) -> Result<()> {
		Self::check_probability(self.probability)
	}

	/// Draws against the activation probability.
	pub fn fires<R: Rng>(&self, rng: &mut R) -> bool {
		rng.random::<f64>() < self.probability
	}

	/// Produces a variation of `name`, leaving the original untouched.
	///
	/// # Behavior
	/// - `RandomOne`: eligible mutations are those whose condition is unset
	///   or satisfied; one is chosen uniformly at random. No eligible
	///   mutation returns an unmodified copy.
	/// - `All`: each mutation is checked against the name as it stands
	///   after the previous ones, and applied if eligible.
	///
	/// The activation probability is not consulted here.
	///
	/// # Errors
	/// Propagates step failures (`IndexOutOfRange`, `InvalidOperation`,
	/// `Custom`).
	pub fn vary<R: Rng>(&self, name: &Name, rng: &mut R) -> Result<Name> {
		let mut variation = name.clone();

		match self.mode {
			SelectionMode::RandomOne => {
				let eligible: Vec<&Mutation> =
					self.mutations.iter().filter(|m| m.is_eligible(&variation)).collect();
				if eligible.is_empty() {
					return Ok(variation);
				}
				let chosen = eligible[rng.random_range(0..eligible.len())];
				chosen.apply(&mut variation)?;
			}
			SelectionMode::All => {
				for mutation in &self.mutations {
					if mutation.is_eligible(&variation) {
						mutation.apply(&mut variation)?;
					}
				}
			}
		}

		Ok(variation)
	}
}
