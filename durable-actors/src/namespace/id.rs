//! Actor instance identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors parsing a [`DurableId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier string was empty.
    #[error("identifier cannot be empty")]
    Empty,

    /// The identifier string was not hex.
    #[error("identifier is not valid hex: {0}")]
    InvalidHex(String),
}

/// Opaque lowercase-hex identifier of one actor instance.
///
/// # Derivation
///
/// - [`from_name`](Self::from_name): deterministic, distinct names give
///   distinct ids
/// - [`unique`](Self::unique): random, never derived from a name
/// - [`parse`](Self::parse): round-trips [`Display`](fmt::Display)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DurableId(String);

impl DurableId {
    /// Id of the instance addressed by `name`.
    pub fn from_name(name: &str) -> Self {
        Self(hex::encode(name.as_bytes()))
    }

    /// Fresh random id.
    pub fn unique() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Parse the string form of an id.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` for an empty string, `IdError::InvalidHex`
    /// when the string is not an even-length hex string.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        hex::decode(s).map_err(|e| IdError::InvalidHex(e.to_string()))?;
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// The hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DurableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DurableId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_deterministic() {
        assert_eq!(DurableId::from_name("alice"), DurableId::from_name("alice"));
        assert_ne!(DurableId::from_name("alice"), DurableId::from_name("bob"));
        assert_eq!(DurableId::from_name("abc").as_str(), "616263");
    }

    #[test]
    fn test_unique_ids_differ() {
        let a = DurableId::unique();
        let b = DurableId::unique();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = DurableId::from_name("counter");
        assert_eq!(DurableId::parse(&id.to_string()), Ok(id.clone()));

        let upper: DurableId = "ABCD".parse().expect("hex");
        assert_eq!(upper.as_str(), "abcd");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(DurableId::parse(""), Err(IdError::Empty));
        assert!(matches!(DurableId::parse("xyz1"), Err(IdError::InvalidHex(_))));
        assert!(matches!(DurableId::parse("abc"), Err(IdError::InvalidHex(_))));
    }
}
