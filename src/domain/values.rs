//! Validated text and ordering values shared by groups and categories.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TrackingError};

pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 1000;

/// Non-empty display name, compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Name(String);

impl Name {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(TrackingError::EmptyName);
        }
        if value.chars().count() > NAME_MAX_LEN {
            return Err(TrackingError::NameTooLong { max: NAME_MAX_LEN });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Name {
    type Error = TrackingError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Description(String);

impl Description {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.chars().count() > DESCRIPTION_MAX_LEN {
            return Err(TrackingError::DescriptionTooLong {
                max: DESCRIPTION_MAX_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<String> for Description {
    type Error = TrackingError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of a group in the dashboard listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayOrder(u32);

impl DisplayOrder {
    pub fn new(value: i64) -> Result<Self> {
        u32::try_from(value)
            .map(Self)
            .map_err(|_| TrackingError::InvalidOrder(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert_eq!(Name::new(""), Err(TrackingError::EmptyName));
        assert!(Name::new("a".repeat(NAME_MAX_LEN)).is_ok());
        assert_eq!(
            Name::new("a".repeat(NAME_MAX_LEN + 1)),
            Err(TrackingError::NameTooLong { max: NAME_MAX_LEN })
        );
        assert_ne!(Name::new("Food").unwrap(), Name::new("food").unwrap());
    }

    #[test]
    fn description_may_be_empty_but_bounded() {
        assert!(Description::new("").unwrap().is_empty());
        assert!(Description::new("x".repeat(DESCRIPTION_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn loading_applies_the_same_rules() {
        assert_eq!(serde_json::to_string(&Name::new("Food").unwrap()).unwrap(), "\"Food\"");
        assert_eq!(serde_json::from_str::<Name>("\"Food\"").unwrap().as_str(), "Food");
        assert!(serde_json::from_str::<Name>("\"\"").is_err());
        let too_long = format!("\"{}\"", "x".repeat(DESCRIPTION_MAX_LEN + 1));
        assert!(serde_json::from_str::<Description>(&too_long).is_err());
    }

    #[test]
    fn order_rejects_negative_values() {
        assert_eq!(DisplayOrder::new(-1), Err(TrackingError::InvalidOrder(-1)));
        assert_eq!(DisplayOrder::new(3).unwrap().value(), 3);
    }
}
