use crate::error::ModelError;

use std::fmt;

/// Server-assigned runner identity.
///
/// The API hands these out as opaque strings (document ids), so no structure
/// is assumed beyond being non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct RunnerId(String);

impl RunnerId {
    pub fn new(raw: impl Into<String>) -> Self {
        RunnerId(raw.into())
    }

    /// Build an id, rejecting blank input.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyIdentity);
        }
        Ok(RunnerId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RunnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunnerId {
    fn from(value: &str) -> Self {
        RunnerId::new(value)
    }
}

impl fmt::Display for RunnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-facing bib number.
///
/// Live location events may only carry this, so it doubles as a secondary
/// join key. Some producers send it as a JSON number; both forms decode to
/// the same value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct RunnerNumber(String);

impl RunnerNumber {
    pub fn new(raw: impl Into<String>) -> Self {
        RunnerNumber(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunnerNumber {
    fn from(value: &str) -> Self {
        RunnerNumber::new(value)
    }
}

impl fmt::Display for RunnerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RunnerNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => RunnerNumber(text),
            Raw::Number(number) => RunnerNumber(number.to_string()),
        })
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn runner_number_accepts_string_and_integer() {
        let text: RunnerNumber = serde_json::from_str("\"M-102\"").unwrap();
        let number: RunnerNumber = serde_json::from_str("102").unwrap();

        assert_eq!(text.as_str(), "M-102");
        assert_eq!(number.as_str(), "102");
    }

    #[test]
    fn blank_runner_id_is_rejected() {
        assert_eq!(RunnerId::parse("   "), Err(ModelError::EmptyIdentity));
        assert_eq!(RunnerId::parse(" abc ").unwrap().as_str(), "abc");
    }
}
