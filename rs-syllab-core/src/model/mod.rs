//! Top-level module for the syllable-based name generation system.
//!
//! This module provides the generation-validation engine, including:
//! - Weighted grapheme pools (`GraphemePool`)
//! - Per-slot assembly probabilities (`ProbabilityTable`)
//! - The position-aware syllable assembler (`SyllableGenerator`)
//! - Structured names (`Name`)
//! - Name variations (`Mutator`) and rejection patterns (`NameFilter`)
//! - A high-level generation interface (`NameGenerator`)

/// High-level interface composing assembly, mutation and filtering.
///
/// Exposes configuration loading, bounded-retry generation, variations
/// and parallel unique batches.
pub mod generator;

/// Probabilistic syllable assembler and its grapheme pools.
///
/// Handles pool configuration through explicit handles, default
/// probabilities and position-dependent assembly rules.
pub mod syllable;

/// Weighted graphemes and pool sampling.
pub mod grapheme;

/// Named per-slot probabilities and their default values.
pub mod probability;

/// Ordered syllable sequence representing one name.
pub mod name;

/// Conditionally gated edit recipes producing name variations.
pub mod mutation;

/// Invalidating patterns a generated name must not match.
pub mod filter;

/// Serialisable compiled regular expression.
///
/// Shared by filters and mutation conditions.
pub mod pattern;
