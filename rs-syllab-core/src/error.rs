//! Error taxonomy of the generation engine.
//!
//! Every failing operation reports one of these variants to its immediate
//! caller. Only filter rejections are retried internally (up to the retry
//! ceiling) before surfacing as [`GenerationError::RetriesExhausted`].

use thiserror::Error;

use crate::model::syllable::PoolCategory;

/// Boxed error returned by custom mutation callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors raised while configuring or running a generator.
#[derive(Error, Debug)]
pub enum GenerationError {
	/// A slot fired but its backing pool has no selectable grapheme.
	#[error("Pool '{category}' is empty or has zero total weight")]
	EmptyPool { category: PoolCategory },

	/// The assembled syllable is empty and empty output is not allowed.
	#[error("Assembled syllable is empty and empty syllables are not allowed")]
	DegenerateOutput,

	/// A name was requested with fewer than one syllable.
	#[error("Syllable count must be >= 1, got {0}")]
	InvalidSyllableCount(usize),

	/// Out-of-domain configuration parameter.
	#[error("Invalid configuration: {0}")]
	InvalidConfiguration(String),

	/// The filter rejected every attempt up to the retry ceiling.
	#[error("No valid name produced after {attempts} attempts")]
	RetriesExhausted { attempts: usize },

	/// A mutation step referenced a syllable that does not exist.
	#[error("Syllable index {index} out of range for a name of {len} syllables")]
	IndexOutOfRange { index: isize, len: usize },

	/// A mutation step would leave the name in an unsupported state.
	#[error("Invalid operation: {0}")]
	InvalidOperation(String),

	/// A filter or condition pattern failed to compile.
	#[error("Invalid pattern '{pattern}': {source}")]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	/// A custom mutation callback failed.
	#[error("Custom mutation step failed: {0}")]
	Custom(#[source] BoxError),

	/// Reading or writing a configuration file failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON configuration could not be parsed or written.
	#[error("JSON configuration error: {0}")]
	Json(#[from] serde_json::Error),

	/// Binary configuration cache could not be decoded or encoded.
	#[error("Binary configuration error: {0}")]
	Binary(#[from] postcard::Error),
}

impl GenerationError {
	/// Create an InvalidConfiguration error.
	pub fn invalid_configuration(reason: impl Into<String>) -> Self {
		Self::InvalidConfiguration(reason.into())
	}

	/// Returns `true` for errors that require the caller to fix its
	/// configuration before trying again.
	///
	/// `RetriesExhausted` is excluded: it signals a filter that is too strict
	/// for the pools rather than a malformed parameter.
	pub fn is_configuration_error(&self) -> bool {
		matches!(
			self,
			Self::EmptyPool { .. }
				| Self::DegenerateOutput
				| Self::InvalidSyllableCount(_)
				| Self::InvalidConfiguration(_)
				| Self::InvalidPattern { .. }
		)
	}
}
