use std::collections::HashSet;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use serde::{Deserialize, Serialize};

use super::filter::NameFilter;
use super::mutation::Mutator;
use super::name::Name;
use super::syllable::{SyllableGenerator, SyllablePosition};
use crate::error::{GenerationError, Result};
use crate::io;

/// Default number of attempts before a generation call gives up.
pub const DEFAULT_MAX_RETRIES: usize = 1000;

/// Largest syllable count a single name may have.
pub const MAX_SYLLABLES: usize = 256;

/// Complete, immutable description of a name generator.
///
/// Everything here is read-only during generation, so a configuration can be
/// shared between threads while each thread owns its random source.
///
/// # Invariants (checked by [`GeneratorConfig::validate`])
/// - `1 <= minimum_syllables <= maximum_syllables <= MAX_SYLLABLES`
/// - `max_retries >= 1`
/// - Every probability lies in `[0.0, 1.0]`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GeneratorConfig {
	/// Syllable assembler (pools and probabilities).
	pub syllables: SyllableGenerator,
	/// Lower bound of the random syllable count (inclusive).
	pub minimum_syllables: usize,
	/// Upper bound of the random syllable count (inclusive).
	pub maximum_syllables: usize,
	/// Hard cap on the number of attempts of one generation call.
	pub max_retries: usize,
	/// Optional set of invalidating patterns.
	pub filter: Option<NameFilter>,
	/// Optional mutation engine applied after assembly.
	pub mutator: Option<Mutator>,
	/// Re-validate the output of [`NameGenerator::vary`] against the filter.
	pub validate_variations: bool,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self {
			syllables: SyllableGenerator::new(),
			minimum_syllables: 2,
			maximum_syllables: 2,
			max_retries: DEFAULT_MAX_RETRIES,
			filter: None,
			mutator: None,
			validate_variations: false,
		}
	}
}

impl GeneratorConfig {
	/// Creates a configuration around a syllable generator with default
	/// bounds (two syllables) and retry ceiling.
	pub fn new(syllables: SyllableGenerator) -> Self {
		Self { syllables, ..Self::default() }
	}

	/// Standard English-like pools, two to three syllables.
	pub fn standard() -> Self {
		Self { maximum_syllables: 3, ..Self::new(SyllableGenerator::standard()) }
	}

	pub fn with_syllable_range(mut self, minimum: usize, maximum: usize) -> Self {
		self.minimum_syllables = minimum;
		self.maximum_syllables = maximum;
		self
	}

	pub fn with_max_retries(mut self, max_retries: usize) -> Self {
		self.max_retries = max_retries;
		self
	}

	pub fn with_filter(mut self, filter: NameFilter) -> Self {
		self.filter = Some(filter);
		self
	}

	pub fn with_mutator(mut self, mutator: Mutator) -> Self {
		self.mutator = Some(mutator);
		self
	}

	pub fn with_validated_variations(mut self, validate: bool) -> Self {
		self.validate_variations = validate;
		self
	}

	/// Checks the invariants listed on the type.
	///
	/// # Errors
	/// Returns `InvalidConfiguration` describing the first violation.
	pub fn validate(&self) -> Result<()> {
		if self.minimum_syllables < 1 {
			return Err(GenerationError::invalid_configuration("minimum syllable count must be >= 1"));
		}
		if self.maximum_syllables < self.minimum_syllables {
			return Err(GenerationError::invalid_configuration(format!(
				"maximum syllable count ({}) is lower than the minimum ({})",
				self.maximum_syllables, self.minimum_syllables
			)));
		}
		if self.maximum_syllables > MAX_SYLLABLES {
			return Err(GenerationError::invalid_configuration(format!(
				"maximum syllable count ({}) exceeds {MAX_SYLLABLES}",
				self.maximum_syllables
			)));
		}
		if self.max_retries < 1 {
			return Err(GenerationError::invalid_configuration("retry ceiling must be >= 1"));
		}
		self.syllables.validate()?;
		if let Some(mutator) = &self.mutator {
			mutator.validate()?;
		}
		Ok(())
	}

	/// Loads a JSON configuration, using a binary cache when available.
	///
	/// # Behavior
	/// - If a `.bin` sibling exists and is not older than the JSON file,
	///   it is decoded with `postcard`.
	/// - Otherwise the JSON file is parsed and the `.bin` cache is written
	///   for future fast loading.
	/// - The result is validated in both cases.
	pub fn load<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		let binary_data_path = io::build_output_path(&filepath, "bin")?;

		if io::is_fresh_cache(&filepath, &binary_data_path) {
			log::info!("Loading configuration cache {}", binary_data_path.display());
			let config: Self = io::read_binary(&binary_data_path)?;
			config.validate()?;
			return Ok(config);
		}

		let config: Self = io::read_json(&filepath)?;
		config.validate()?;
		io::write_binary(&binary_data_path, &config)?;
		Ok(config)
	}

	/// Writes the configuration as pretty-printed JSON.
	///
	/// # Errors
	/// Fails on I/O errors, or if a mutation holds a custom step, which
	/// cannot be serialised.
	pub fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<()> {
		io::write_json(filepath, self)
	}

	/// Draws a syllable count uniformly in `[minimum, maximum]`.
	///
	/// The range is checked when the owning [`NameGenerator`] is built.
	fn random_syllable_count<R: Rng>(&self, rng: &mut R) -> usize {
		rng.random_range(self.minimum_syllables..=self.maximum_syllables)
	}

	/// Assembles a name without mutation or filtering.
	///
	/// The first syllable uses starting rules and the last one ending rules
	/// only when the name has more than one syllable.
	fn assemble<R: Rng>(&self, syllable_count: usize, rng: &mut R) -> Result<Name> {
		let mut syllables = Vec::new();
		for index in 0..syllable_count {
			let position = if syllable_count == 1 {
				SyllablePosition::Middle
			} else if index == 0 {
				SyllablePosition::Starting
			} else if index == syllable_count - 1 {
				SyllablePosition::Ending
			} else {
				SyllablePosition::Middle
			};
			syllables.push(self.syllables.next_syllable(position, rng)?);
		}
		Ok(Name::from(syllables))
	}

	fn is_valid(&self, name: &Name) -> bool {
		self.filter.as_ref().is_none_or(|filter| filter.is_valid(name))
	}

	/// Rejects mutation output that assembly itself could never produce.
	///
	/// # Errors
	/// - `InvalidOperation` if the name has no syllable left
	/// - `DegenerateOutput` if a syllable is empty and empty output is
	///   disallowed
	fn check_variation(&self, name: &Name) -> Result<()> {
		if name.is_empty() {
			return Err(GenerationError::InvalidOperation(
				"mutation left the name without syllables".to_owned(),
			));
		}
		if !self.syllables.allows_empty() && name.syllables().iter().any(String::is_empty) {
			return Err(GenerationError::DegenerateOutput);
		}
		Ok(())
	}

	fn mutate<R: Rng>(&self, mutator: &Mutator, name: &Name, rng: &mut R) -> Result<Name> {
		let variation = mutator.vary(name, rng)?;
		self.check_variation(&variation)?;
		Ok(variation)
	}

	/// Assemble → optionally mutate → validate, retried up to `max_retries`
	/// attempts.
	fn generate<R: Rng>(&self, syllable_count: usize, rng: &mut R) -> Result<Name> {
		if !(1..=MAX_SYLLABLES).contains(&syllable_count) {
			return Err(GenerationError::InvalidSyllableCount(syllable_count));
		}

		for attempt in 1..=self.max_retries {
			let mut name = self.assemble(syllable_count, rng)?;

			if let Some(mutator) = &self.mutator {
				if mutator.fires(rng) {
					name = self.mutate(mutator, &name, rng)?;
				}
			}

			if self.is_valid(&name) {
				return Ok(name);
			}
			log::debug!("Attempt {attempt}: '{name}' rejected by filter");
		}

		log::warn!("No valid name after {} attempts", self.max_retries);
		Err(GenerationError::RetriesExhausted { attempts: self.max_retries })
	}

	fn vary<R: Rng>(&self, name: &Name, rng: &mut R) -> Result<Name> {
		let Some(mutator) = &self.mutator else {
			return Ok(name.clone());
		};

		if !self.validate_variations {
			return self.mutate(mutator, name, rng);
		}

		for _ in 0..self.max_retries {
			let variation = self.mutate(mutator, name, rng)?;
			if self.is_valid(&variation) {
				return Ok(variation);
			}
		}
		Err(GenerationError::RetriesExhausted { attempts: self.max_retries })
	}
}

/// High-level name generator.
///
/// Owns a configuration and its own seedable random source. Sharing one
/// generator between threads requires external synchronisation (the server
/// wraps it in a `Mutex`); [`NameGenerator::generate_unique`] instead hands
/// each worker thread its own seeded random source.
#[derive(Debug)]
pub struct NameGenerator {
	config: GeneratorConfig,
	rng: StdRng,
}

impl NameGenerator {
	/// Creates a generator seeded from the operating system.
	///
	/// # Errors
	/// Returns `InvalidConfiguration` if the configuration is invalid.
	pub fn new(config: GeneratorConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { config, rng: StdRng::from_os_rng() })
	}

	/// Creates a deterministic generator.
	pub fn with_seed(config: GeneratorConfig, seed: u64) -> Result<Self> {
		config.validate()?;
		Ok(Self { config, rng: StdRng::seed_from_u64(seed) })
	}

	/// Loads the configuration from a JSON file (see [`GeneratorConfig::load`]).
	pub fn from_file<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		Self::new(GeneratorConfig::load(filepath)?)
	}

	pub fn config(&self) -> &GeneratorConfig {
		&self.config
	}

	/// Generates a name of exactly `syllable_count` syllables.
	///
	/// # Errors
	/// - `InvalidSyllableCount` if `syllable_count` is not in `1..=MAX_SYLLABLES`
	/// - `RetriesExhausted` if the filter rejects every attempt
	/// - `EmptyPool` / `DegenerateOutput` / step errors, immediately
	pub fn generate(&mut self, syllable_count: usize) -> Result<Name> {
		self.config.generate(syllable_count, &mut self.rng)
	}

	/// Generates a name whose syllable count is drawn in the configured range.
	pub fn next_name(&mut self) -> Result<Name> {
		let syllable_count = self.config.random_syllable_count(&mut self.rng);
		self.generate(syllable_count)
	}

	/// Generates a rendered name.
	pub fn next_rendered(&mut self) -> Result<String> {
		Ok(self.next_name()?.render())
	}

	/// Produces a variation of an existing name through the mutator.
	///
	/// Variations skip the filter unless `validate_variations` is set, in
	/// which case new variations are drawn until one passes, bounded by the
	/// retry ceiling. Without a mutator the name is returned unchanged.
	///
	/// # Errors
	/// - Step failures (`IndexOutOfRange`, `InvalidOperation`, `Custom`)
	/// - `InvalidOperation` if the variation has no syllable left
	/// - `DegenerateOutput` if the variation holds an empty syllable and
	///   empty output is disallowed
	pub fn vary(&mut self, name: &Name) -> Result<Name> {
		self.config.vary(name, &mut self.rng)
	}

	/// Generates `count` distinct rendered names.
	///
	/// # Behavior
	/// - Splits the work across one scoped thread per CPU.
	/// - Each worker owns a random source seeded from this generator, so
	///   results are reproducible for a seeded generator.
	/// - Partial results are collected over a channel and deduplicated
	///   in worker order.
	/// - Any shortfall is topped up sequentially; `max_retries` consecutive
	///   duplicates end the call with `RetriesExhausted`.
	pub fn generate_unique(&mut self, count: usize) -> Result<Vec<String>> {
		if count == 0 {
			return Ok(Vec::new());
		}

		let workers = num_cpus::get().clamp(1, count);
		let chunk_size = count.div_ceil(workers);
		let seeds: Vec<u64> = (0..workers).map(|_| self.rng.random()).collect();
		let config = &self.config;

		let mut partials: Vec<(usize, Result<Vec<Name>>)> = thread::scope(|scope| {
			let (tx, rx) = mpsc::channel();
			for (worker, seed) in seeds.into_iter().enumerate() {
				let tx = tx.clone();
				let quota = chunk_size.min(count - worker.saturating_mul(chunk_size).min(count));
				scope.spawn(move || {
					let mut rng = StdRng::seed_from_u64(seed);
					let names = (0..quota)
						.map(|_| {
							let syllable_count = config.random_syllable_count(&mut rng);
							config.generate(syllable_count, &mut rng)
						})
						.collect::<Result<Vec<Name>>>();
					// The receiver is alive until every worker is done
					let _ = tx.send((worker, names));
				});
			}
			drop(tx);
			rx.iter().collect()
		});

		partials.sort_by_key(|(worker, _)| *worker);

		let mut seen = HashSet::new();
		let mut names = Vec::new();
		for (_, partial) in partials {
			for name in partial? {
				let rendered = name.render();
				if names.len() < count && seen.insert(rendered.clone()) {
					names.push(rendered);
				}
			}
		}

		let mut duplicates = 0;
		while names.len() < count {
			let rendered = self.next_rendered()?;
			if seen.insert(rendered.clone()) {
				names.push(rendered);
				duplicates = 0;
			} else {
				duplicates += 1;
				if duplicates >= self.config.max_retries {
					log::warn!("Only {} distinct names out of {count} requested", names.len());
					return Err(GenerationError::RetriesExhausted { attempts: duplicates });
				}
			}
		}

		Ok(names)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::mutation::Mutation;
	use crate::model::probability::Slot;
	use crate::model::syllable::PoolCategory;
	use regex::Regex;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	/// Pools from the reference scenario: s/t/r, a/e, trailing z.
	fn scenario_syllables() -> SyllableGenerator {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::LeadingConsonant, "str");
		syllables.add_chars(PoolCategory::Vowel, "ae");
		syllables.add_chars(PoolCategory::TrailingConsonant, "z").probability(0.10).unwrap();
		syllables
	}

	fn seeded(config: GeneratorConfig) -> NameGenerator {
		NameGenerator::with_seed(config, 1234).unwrap()
	}

	#[test]
	fn scenario_names_follow_the_grammar() {
		let grammar = Regex::new("^([str]?[ae]z?)+$").unwrap();
		let mut generator = seeded(GeneratorConfig::new(scenario_syllables()));

		for _ in 0..500 {
			let name = generator.generate(3).unwrap();
			assert_eq!(name.len(), 3);
			assert!(grammar.is_match(&name.render()), "{name}");
			for syllable in name.syllables() {
				assert!(Regex::new("^[str]?[ae]z?$").unwrap().is_match(syllable), "{syllable}");
			}
		}
	}

	#[test]
	fn first_and_last_syllables_follow_position_rules() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::LeadingConsonant, "k").probability(1.0).unwrap();
		syllables.add_chars(PoolCategory::Vowel, "a");
		syllables.add_chars(PoolCategory::FinalConsonant, "n").probability(1.0).unwrap();
		syllables.set_probability(Slot::StartingSyllableLeadingVowelExists, 1.0).unwrap();
		let mut generator = seeded(GeneratorConfig::new(syllables));

		assert_eq!(generator.generate(2).unwrap(), Name::new(["a", "kan"]));
		assert_eq!(generator.generate(4).unwrap(), Name::new(["a", "ka", "ka", "kan"]));
		// A single syllable is neither starting nor ending
		assert_eq!(generator.generate(1).unwrap(), Name::new(["ka"]));
	}

	#[test]
	fn filter_is_never_violated() {
		let filter = NameFilter::with_patterns(["^.{0,2}$"]).unwrap();
		let config = GeneratorConfig::new(scenario_syllables()).with_filter(filter);
		let mut generator = seeded(config);

		for _ in 0..300 {
			assert!(generator.generate(1).unwrap().render().chars().count() > 2);
		}
	}

	#[test]
	fn pathological_filter_exhausts_within_the_ceiling() {
		let attempts = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&attempts);
		let counting = Mutator::new().with_mutation(Mutation::new().custom(move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}));

		let config = GeneratorConfig::new(scenario_syllables())
			.with_filter(NameFilter::with_patterns([".*"]).unwrap())
			.with_mutator(counting)
			.with_max_retries(1000);
		let mut generator = seeded(config);

		match generator.generate(3) {
			Err(GenerationError::RetriesExhausted { attempts: reported }) => assert_eq!(reported, 1000),
			other => panic!("expected RetriesExhausted, got {other:?}"),
		}
		assert_eq!(attempts.load(Ordering::SeqCst), 1000);
	}

	#[test]
	fn invalid_counts_and_ranges_are_rejected() {
		let mut generator = seeded(GeneratorConfig::new(scenario_syllables()));
		assert!(matches!(generator.generate(0), Err(GenerationError::InvalidSyllableCount(0))));

		for config in [
			GeneratorConfig::new(scenario_syllables()).with_syllable_range(3, 2),
			GeneratorConfig::new(scenario_syllables()).with_syllable_range(0, 2),
			GeneratorConfig::new(scenario_syllables()).with_max_retries(0),
		] {
			assert!(matches!(NameGenerator::new(config), Err(GenerationError::InvalidConfiguration(_))));
		}
	}

	#[test]
	fn oversized_counts_are_rejected() {
		let mut generator = seeded(GeneratorConfig::new(scenario_syllables()));
		assert!(matches!(
			generator.generate(usize::MAX),
			Err(GenerationError::InvalidSyllableCount(usize::MAX))
		));
		assert!(matches!(
			generator.generate(MAX_SYLLABLES + 1),
			Err(GenerationError::InvalidSyllableCount(_))
		));
		assert_eq!(generator.generate(MAX_SYLLABLES).unwrap().len(), MAX_SYLLABLES);

		let unbounded = GeneratorConfig::new(scenario_syllables()).with_syllable_range(1, usize::MAX);
		assert!(matches!(NameGenerator::new(unbounded), Err(GenerationError::InvalidConfiguration(_))));
	}

	#[test]
	fn mutations_cannot_produce_empty_syllables() {
		for mutation in [
			Mutation::new().replace_syllable(0, ""),
			Mutation::new().insert_syllable(1, ""),
			Mutation::new().append_syllable(""),
		] {
			let mutator = Mutator::new().with_mutation(mutation);
			let config = GeneratorConfig::new(scenario_syllables()).with_mutator(mutator);

			let mut generator = seeded(config.clone());
			assert!(matches!(generator.generate(2), Err(GenerationError::DegenerateOutput)));
			assert!(matches!(generator.vary(&Name::new(["ta", "ri"])), Err(GenerationError::DegenerateOutput)));

			let mut permissive = config;
			permissive.syllables.allow_empty(true);
			let name = seeded(permissive).generate(2).unwrap();
			assert!(name.syllables().iter().any(String::is_empty));
		}
	}

	#[test]
	fn mutations_cannot_empty_the_name() {
		let clear = Mutator::new().with_mutation(Mutation::new().custom(|name| {
			name.syllables_mut().clear();
			Ok(())
		}));
		let mut generator = seeded(GeneratorConfig::new(scenario_syllables()).with_mutator(clear));

		assert!(matches!(generator.generate(2), Err(GenerationError::InvalidOperation(_))));
		assert!(matches!(generator.vary(&Name::new(["ta"])), Err(GenerationError::InvalidOperation(_))));
	}

	#[test]
	fn random_counts_stay_in_range() {
		let config = GeneratorConfig::new(scenario_syllables()).with_syllable_range(2, 4);
		let mut generator = seeded(config);
		let mut lengths = HashSet::new();
		for _ in 0..200 {
			lengths.insert(generator.next_name().unwrap().len());
		}
		assert_eq!(lengths, HashSet::from([2, 3, 4]));
	}

	#[test]
	fn assembly_errors_abort_immediately() {
		let mut syllables = scenario_syllables();
		syllables.set_probability(Slot::FinalConsonantExists, 1.0).unwrap();
		let mut generator = seeded(GeneratorConfig::new(syllables));
		assert!(matches!(generator.generate(2), Err(GenerationError::EmptyPool { .. })));
	}

	#[test]
	fn seeded_generators_are_reproducible() {
		let mut a = seeded(GeneratorConfig::standard());
		let mut b = seeded(GeneratorConfig::standard());
		for _ in 0..20 {
			assert_eq!(a.next_rendered().unwrap(), b.next_rendered().unwrap());
		}
	}

	#[test]
	fn mutator_activation_probability() {
		let always = Mutator::new().with_mutation(Mutation::new().replace_syllable(0, "zo"));
		let mut generator = seeded(GeneratorConfig::new(scenario_syllables()).with_mutator(always.clone()));
		assert_eq!(generator.generate(2).unwrap().syllables()[0], "zo");

		let never = always.with_probability(0.0).unwrap();
		let mut generator = seeded(GeneratorConfig::new(scenario_syllables()).with_mutator(never));
		for _ in 0..50 {
			assert_ne!(generator.generate(2).unwrap().syllables()[0], "zo");
		}
	}

	#[test]
	fn variations_skip_the_filter_unless_configured() {
		let mutator = Mutator::new()
			.with_mutation(Mutation::new().replace_syllable(0, "q"))
			.with_mutation(Mutation::new().replace_syllable(0, "zo"))
			.with_probability(0.0)
			.unwrap();
		let filter = NameFilter::with_patterns(["^q"]).unwrap();
		let config = GeneratorConfig::new(scenario_syllables()).with_mutator(mutator).with_filter(filter);
		let original = Name::new(["ta", "ri"]);

		let mut unchecked = seeded(config.clone());
		let variations: HashSet<Name> = (0..50).map(|_| unchecked.vary(&original).unwrap()).collect();
		assert!(variations.contains(&Name::new(["q", "ri"])));

		let mut checked = seeded(config.with_validated_variations(true));
		for _ in 0..50 {
			assert_eq!(checked.vary(&original).unwrap(), Name::new(["zo", "ri"]));
		}
	}

	#[test]
	fn validated_variations_can_exhaust() {
		let mutator = Mutator::new().with_mutation(Mutation::new().replace_syllable(0, "q"));
		let config = GeneratorConfig::new(scenario_syllables())
			.with_mutator(mutator)
			.with_filter(NameFilter::with_patterns(["^q"]).unwrap())
			.with_max_retries(10)
			.with_validated_variations(true);

		assert!(matches!(
			seeded(config).vary(&Name::new(["ta"])),
			Err(GenerationError::RetriesExhausted { attempts: 10 })
		));
	}

	#[test]
	fn vary_without_mutator_returns_a_copy() {
		let mut generator = seeded(GeneratorConfig::new(scenario_syllables()));
		let name = Name::new(["ta", "ri"]);
		assert_eq!(generator.vary(&name).unwrap(), name);
	}

	#[test]
	fn unique_batches_have_no_duplicates() {
		let mut generator = seeded(GeneratorConfig::standard());
		let names = generator.generate_unique(200).unwrap();
		assert_eq!(names.len(), 200);
		assert_eq!(names.iter().collect::<HashSet<_>>().len(), 200);
	}

	#[test]
	fn unique_batches_are_bounded_by_the_pools() {
		let mut syllables = SyllableGenerator::new();
		syllables.add_chars(PoolCategory::Vowel, "ae");
		// Only four distinct two-syllable names exist
		let config = GeneratorConfig::new(syllables).with_max_retries(50);
		let mut generator = seeded(config);

		assert_eq!(generator.generate_unique(4).unwrap().len(), 4);
		assert!(matches!(generator.generate_unique(5), Err(GenerationError::RetriesExhausted { .. })));
	}
}
