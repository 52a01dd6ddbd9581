use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// A compiled regular expression that serialises as its source text.
///
/// Compilation happens once, when the pattern is configured or loaded, so a
/// malformed pattern is reported as `InvalidPattern` before any generation
/// starts.
#[derive(Serialize, Deserialize, Clone)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
	regex: Regex,
}

impl Pattern {
	/// Compiles a pattern.
	///
	/// # Errors
	/// Returns `InvalidPattern` if the expression is malformed.
	pub fn new(pattern: &str) -> Result<Self> {
		let regex = Regex::new(pattern).map_err(|source| GenerationError::InvalidPattern {
			pattern: pattern.to_owned(),
			source,
		})?;
		Ok(Self { regex })
	}

	/// Builds a pattern matching `literal` verbatim.
	pub fn literal(literal: &str) -> Result<Self> {
		Self::new(&regex::escape(literal))
	}

	pub fn as_str(&self) -> &str {
		self.regex.as_str()
	}

	/// Unanchored match: anchors must be part of the pattern itself.
	pub fn is_match(&self, text: &str) -> bool {
		self.regex.is_match(text)
	}
}

impl fmt::Debug for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Pattern").field(&self.as_str()).finish()
	}
}

impl PartialEq for Pattern {
	fn eq(&self, other: &Self) -> bool {
		self.as_str() == other.as_str()
	}
}

impl TryFrom<String> for Pattern {
	type Error = GenerationError;

	fn try_from(value: String) -> Result<Self> {
		Self::new(&value)
	}
}

impl From<Pattern> for String {
	fn from(pattern: Pattern) -> Self {
		pattern.regex.as_str().to_owned()
	}
}
