//! Global mapper settings.

use serde::{Deserialize, Serialize};

/// Behavior switches applied to every type pair unless a map overrides them.
///
/// Loadable from any serde format; missing keys take their defaults.
///
/// ```toml
/// strict = true
/// name-matching = "exact"
/// null-ignore = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MapperSettings {
	/// Fail resolution when a writable destination member cannot be mapped,
	/// instead of skipping it.
	pub strict: bool,
	/// How source and destination member names are paired by convention.
	pub name_matching: NameMatching,
	/// Leave destination members untouched when their source value is `None`.
	pub null_ignore: bool,
}

impl Default for MapperSettings {
	fn default() -> Self {
		Self {
			strict: false,
			name_matching: NameMatching::CaseInsensitive,
			null_ignore: false,
		}
	}
}

/// Member name pairing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameMatching {
	/// ASCII case-insensitive comparison.
	#[default]
	CaseInsensitive,
	/// Byte-for-byte comparison.
	Exact,
}

impl NameMatching {
	/// Returns true if `source` and `destination` name the same member.
	pub fn matches(self, source: &str, destination: &str) -> bool {
		match self {
			NameMatching::CaseInsensitive => source.eq_ignore_ascii_case(destination),
			NameMatching::Exact => source == destination,
		}
	}
}
