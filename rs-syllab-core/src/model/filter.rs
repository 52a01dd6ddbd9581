use serde::{Deserialize, Serialize};

use super::name::Name;
use super::pattern::Pattern;
use crate::error::Result;

/// What an invalidating pattern is matched against.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterScope {
	/// The rendered name.
	#[default]
	Name,
	/// Each syllable on its own; one matching syllable invalidates the name.
	AnySyllable,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FilterPattern {
	pub pattern: Pattern,
	pub scope: FilterScope,
}

impl FilterPattern {
	fn matches(&self, name: &Name, rendered: &str) -> bool {
		match self.scope {
			FilterScope::Name => self.pattern.is_match(rendered),
			FilterScope::AnySyllable => name.syllables().iter().any(|s| self.pattern.is_match(s)),
		}
	}
}

/// Set of invalidating patterns a generated name must not match.
///
/// Patterns are unanchored: `"ae"` rejects any name containing `ae`, while
/// `"^.{0,2}$"` rejects names of at most two characters. Patterns are
/// compiled when added, so a malformed pattern fails at configuration time.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NameFilter {
	patterns: Vec<FilterPattern>,
}

impl NameFilter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a filter rejecting names that match any of `patterns`.
	///
	/// # Errors
	/// Returns `InvalidPattern` on the first pattern that does not compile.
	pub fn with_patterns<I, S>(patterns: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut filter = Self::new();
		for pattern in patterns {
			filter.reject_pattern(pattern.as_ref())?;
		}
		Ok(filter)
	}

	fn push(&mut self, pattern: Pattern, scope: FilterScope) -> &mut Self {
		self.patterns.push(FilterPattern { pattern, scope });
		self
	}

	/// Rejects names whose rendered text matches `pattern`.
	pub fn reject_pattern(&mut self, pattern: &str) -> Result<&mut Self> {
		Ok(self.push(Pattern::new(pattern)?, FilterScope::Name))
	}

	/// Rejects names having at least one syllable matching `pattern`.
	pub fn reject_syllable_pattern(&mut self, pattern: &str) -> Result<&mut Self> {
		Ok(self.push(Pattern::new(pattern)?, FilterScope::AnySyllable))
	}

	/// Rejects names starting with `prefix` (taken literally).
	pub fn reject_start(&mut self, prefix: &str) -> Result<&mut Self> {
		let pattern = Pattern::new(&format!("^{}", regex::escape(prefix)))?;
		Ok(self.push(pattern, FilterScope::Name))
	}

	/// Rejects names ending with `suffix` (taken literally).
	pub fn reject_end(&mut self, suffix: &str) -> Result<&mut Self> {
		let pattern = Pattern::new(&format!("{}$", regex::escape(suffix)))?;
		Ok(self.push(pattern, FilterScope::Name))
	}

	/// Rejects names containing `substring` (taken literally).
	pub fn reject_substring(&mut self, substring: &str) -> Result<&mut Self> {
		Ok(self.push(Pattern::literal(substring)?, FilterScope::Name))
	}

	pub fn patterns(&self) -> &[FilterPattern] {
		&self.patterns
	}

	/// Returns `true` iff no pattern matches the name.
	pub fn is_valid(&self, name: &Name) -> bool {
		let rendered = name.render();
		!self.patterns.iter().any(|p| p.matches(name, &rendered))
	}
}
