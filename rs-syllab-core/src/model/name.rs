use std::fmt;

use serde::{Deserialize, Serialize};

/// A generated name as an ordered list of syllables.
///
/// Two names are equal when their syllable sequences are equal, so
/// `["ta", "ri"]` and `["tar", "i"]` differ even though both render
/// as `"tari"`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Name {
	syllables: Vec<String>,
}

impl Name {
	/// Creates a name from its syllables.
	pub fn new<I, S>(syllables: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { syllables: syllables.into_iter().map(Into::into).collect() }
	}

	pub fn syllables(&self) -> &[String] {
		&self.syllables
	}

	/// Mutable access for mutation steps and custom callbacks.
	pub fn syllables_mut(&mut self) -> &mut Vec<String> {
		&mut self.syllables
	}

	pub fn len(&self) -> usize {
		self.syllables.len()
	}

	pub fn is_empty(&self) -> bool {
		self.syllables.is_empty()
	}

	/// Concatenates the syllables in order.
	pub fn render(&self) -> String {
		self.syllables.concat()
	}

	/// Renders the name with its first character upper-cased.
	pub fn capitalized(&self) -> String {
		let rendered = self.render();
		let mut chars = rendered.chars();
		match chars.next() {
			Some(first) => first.to_uppercase().chain(chars).collect(),
			None => String::new(),
		}
	}
}

impl fmt::Display for Name {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for syllable in &self.syllables {
			f.write_str(syllable)?;
		}
		Ok(())
	}
}

impl From<Vec<String>> for Name {
	fn from(syllables: Vec<String>) -> Self {
		Self { syllables }
	}
}
