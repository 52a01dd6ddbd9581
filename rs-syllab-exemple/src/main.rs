use rs_syllab_core::model::filter::NameFilter;
use rs_syllab_core::model::generator::{GeneratorConfig, NameGenerator};
use rs_syllab_core::model::mutation::{Mutation, Mutator};
use rs_syllab_core::model::name::Name;
use rs_syllab_core::model::probability::Slot;
use rs_syllab_core::model::syllable::{PoolCategory, SyllableGenerator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Start from the standard English-like pools
    let mut syllables = SyllableGenerator::standard();

    // Names may end with a final consonant, 'nd' being three times as likely as the others
    syllables.add_chars(PoolCategory::FinalConsonant, "lnr");
    syllables.add_weighted(PoolCategory::FinalConsonant, "nd", 3);

    // One name out of five starts with a vowel
    syllables.set_probability(Slot::StartingSyllableLeadingVowelExists, 0.2)?;

    // Trailing consonants are rarer than the default
    syllables.set_probability(Slot::TrailingConsonantExists, 0.05)?;

    // Reject very short names, 'q' at the end of a syllable and triple vowels
    let mut filter = NameFilter::new();
    filter
        .reject_pattern("^.{0,3}$")?
        .reject_syllable_pattern("q$")?
        .reject_pattern("[aeiouy]{3}")?;

    // A third of the names get a variation
    let mutator = Mutator::new()
        .with_mutation(Mutation::new().append_syllable("ia"))
        .with_mutation(Mutation::new().replace_syllable(-1, "dor").when(Some(-1), "^d")?)
        .with_mutation(Mutation::new().insert_syllable(1, "'"))
        .with_probability(0.3)?;

    let config = GeneratorConfig::new(syllables)
        .with_syllable_range(2, 4)
        .with_filter(filter)
        .with_mutator(mutator);

    // Seeded generators are reproducible; `NameGenerator::new` seeds from the OS
    let mut app = NameGenerator::with_seed(config, 2024)?;

    // Generate 10 names using the configured syllable range
    for i in 0..10 {
        println!("Generated name {}: {}", i + 1, app.next_name()?.capitalized());
    }

    // Structured names keep their syllables
    let name = app.generate(3)?;
    println!("Syllables of '{}': {:?}", name, name.syllables());

    // Variations of an existing name (not re-validated by default)
    let existing = Name::new(["ta", "ri", "don"]);
    for _ in 0..3 {
        println!("Variation of '{}': {}", existing, app.vary(&existing)?);
    }

    // Errors are reported, never swallowed
    match app.generate(0) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Zero syllables: {e}"),
    }
    match NameFilter::with_patterns(["(unclosed"]) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Bad pattern: {e}"),
    }
    match NameGenerator::new(GeneratorConfig::standard().with_syllable_range(4, 2)) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Bad range: {e}"),
    }

    // A filter rejecting everything exhausts the retry ceiling
    let impossible = GeneratorConfig::standard()
        .with_filter(NameFilter::with_patterns([".*"])?)
        .with_max_retries(100);
    match NameGenerator::new(impossible)?.next_rendered() {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Impossible filter: {e}"),
    }

    // Many distinct names at once, generated in parallel
    let batch = app.generate_unique(20)?;
    println!("Batch: {}", batch.join(", "));

    // Save the configuration so the server can load it with `?name=exemple`
    std::fs::create_dir_all("./data")?;
    app.config().save("./data/exemple.json")?;
    println!("Configuration saved to ./data/exemple.json");

    Ok(())
}
