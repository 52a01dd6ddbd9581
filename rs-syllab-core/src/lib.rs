//! Syllable-based name generation library.
//!
//! This crate provides a procedural name generator including:
//! - Weighted phoneme pools composed into syllables by independent coin-flips
//! - Position-aware rules for starting and ending syllables
//! - Conditional mutations producing variations of existing names
//! - Pattern filters with a bounded retry loop
//! - JSON configuration files with a compact binary cache
//!
//! ```no_run
//! use rs_syllab_core::model::generator::{GeneratorConfig, NameGenerator};
//!
//! let mut generator = NameGenerator::new(GeneratorConfig::standard())?;
//! println!("{}", generator.next_rendered()?);
//! # Ok::<(), rs_syllab_core::error::GenerationError>(())
//! ```

/// Core generation engine: pools, assembler, names, mutations, filters
/// and the high-level generator.
pub mod model;

/// Error taxonomy shared by every operation.
pub mod error;

/// I/O utilities (path helpers, JSON and binary configuration files).
pub mod io;
