//! Patient identity.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Patient (client) identifier.
///
/// The backend sends IDs as JSON numbers from the database and as strings
/// when they round-trip through form values, so both are accepted. The
/// canonical form is the decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        PatientId(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PatientId {
    fn from(s: &str) -> Self {
        PatientId::new(s)
    }
}

impl From<String> for PatientId {
    fn from(s: String) -> Self {
        PatientId::new(s)
    }
}

impl From<u64> for PatientId {
    fn from(n: u64) -> Self {
        PatientId(n.to_string())
    }
}

impl std::str::FromStr for PatientId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PatientId::new(s))
    }
}

impl<'de> Deserialize<'de> for PatientId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => PatientId::new(s),
            Raw::Int(n) => PatientId(n.to_string()),
            Raw::Float(f) if f.fract() == 0.0 => PatientId(format!("{}", f as i64)),
            Raw::Float(f) => PatientId(f.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_number_and_string() {
        let a: PatientId = serde_json::from_str("42").unwrap();
        let b: PatientId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "42");
    }

    #[test]
    fn test_integral_float_drops_fraction() {
        let id: PatientId = serde_json::from_str("7.0").unwrap();
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn test_serializes_as_string() {
        let id = PatientId::from(12u64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"12\"");
    }

    #[test]
    fn test_blank_after_trim() {
        assert!(PatientId::new("   ").is_blank());
        assert!(!PatientId::new(" 3 ").is_blank());
    }
}
