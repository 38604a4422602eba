use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of an ordinary, pre-authored question module.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleNumber(u32);

impl ModuleNumber {
    /// Creates a new `ModuleNumber`
    #[must_use]
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Identifies a progress record: either an ordinary module or the random mix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModuleId {
    Ordinary(ModuleNumber),
    RandomMix,
}

impl ModuleId {
    /// Textual form of the random-mix identifier.
    pub const RANDOM_MIX_KEY: &'static str = "random";

    #[must_use]
    pub fn ordinary(number: u32) -> Self {
        Self::Ordinary(ModuleNumber::new(number))
    }

    #[must_use]
    pub fn is_random_mix(&self) -> bool {
        matches!(self, Self::RandomMix)
    }

    /// Returns the module number for ordinary modules.
    #[must_use]
    pub fn module_number(&self) -> Option<ModuleNumber> {
        match self {
            Self::Ordinary(number) => Some(*number),
            Self::RandomMix => None,
        }
    }
}

impl From<ModuleNumber> for ModuleId {
    fn from(number: ModuleNumber) -> Self {
        Self::Ordinary(number)
    }
}

impl fmt::Debug for ModuleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleNumber({})", self.0)
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinary(number) => write!(f, "ModuleId::Ordinary({})", number.0),
            Self::RandomMix => f.write_str("ModuleId::RandomMix"),
        }
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for ModuleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinary(number) => write!(f, "{number}"),
            Self::RandomMix => f.write_str(Self::RANDOM_MIX_KEY),
        }
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from {:?}", self.kind, self.raw)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for ModuleNumber {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(ModuleNumber::new)
            .map_err(|_| ParseIdError {
                kind: "ModuleNumber",
                raw: s.to_owned(),
            })
    }
}

impl FromStr for ModuleId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(Self::RANDOM_MIX_KEY) {
            return Ok(Self::RandomMix);
        }
        trimmed
            .parse::<ModuleNumber>()
            .map(Self::Ordinary)
            .map_err(|_| ParseIdError {
                kind: "ModuleId",
                raw: s.to_owned(),
            })
    }
}

impl TryFrom<String> for ModuleId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.to_string()
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id_display() {
        assert_eq!(ModuleId::ordinary(3).to_string(), "3");
        assert_eq!(ModuleId::RandomMix.to_string(), "random");
    }

    #[test]
    fn test_module_id_from_str() {
        let id: ModuleId = "7".parse().unwrap();
        assert_eq!(id, ModuleId::ordinary(7));
        let id: ModuleId = "Random".parse().unwrap();
        assert_eq!(id, ModuleId::RandomMix);
    }

    #[test]
    fn test_numeric_ids_are_always_ordinary() {
        let id: ModuleId = "99".parse().unwrap();
        assert_eq!(id.module_number(), Some(ModuleNumber::new(99)));
        assert!(!id.is_random_mix());
    }

    #[test]
    fn test_module_id_from_str_invalid() {
        assert!("mix".parse::<ModuleId>().is_err());
        assert!("-1".parse::<ModuleNumber>().is_err());
    }

    #[test]
    fn test_module_ids_sort_ordinary_first() {
        let mut ids = vec![ModuleId::RandomMix, ModuleId::ordinary(2), ModuleId::ordinary(1)];
        ids.sort();
        assert_eq!(
            ids,
            vec![ModuleId::ordinary(1), ModuleId::ordinary(2), ModuleId::RandomMix]
        );
    }

    #[test]
    fn test_module_id_serializes_as_string() {
        let json = serde_json::to_string(&ModuleId::RandomMix).unwrap();
        assert_eq!(json, "\"random\"");
        let back: ModuleId = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(back, ModuleId::ordinary(4));
    }
}
