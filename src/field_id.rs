//! Field identifier module.
//!
//! Provides the `FieldId` type, the registry key for a field. Uses
//! `Arc<str>` so names are cheap to clone into nodes, events and reports.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Interned string identifier for fields.
///
/// Every registered field and every composite entry carries one. Cloning
/// shares the underlying allocation.
///
/// # Examples
///
/// ```rust
/// use sfxcost::FieldId;
///
/// let effect = FieldId::from_str("Effect");
/// let effect2: FieldId = "Effect".into();
/// let effect3: FieldId = String::from("Effect").into();
///
/// assert_eq!(effect, effect2);
/// assert_eq!(effect, effect3);
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldId(Arc<str>);

impl Serialize for FieldId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(FieldId::from(s))
    }
}

impl FieldId {
    /// Create a new `FieldId` from a string slice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sfxcost::FieldId;
    ///
    /// let id = FieldId::from_str("Duration");
    /// assert_eq!(id.as_str(), "Duration");
    /// ```
    pub fn from_str(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the string representation of this `FieldId`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldId {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for FieldId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_id_creation() {
        let id1 = FieldId::from_str("Range");
        let id2 = FieldId::from_str("Range");
        assert_eq!(id1, id2);
        assert_eq!(id1.as_str(), "Range");
    }

    #[test]
    fn test_field_id_serializes_as_plain_string() {
        let id = FieldId::from_str("Mandatory");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Mandatory\"");
        let back: FieldId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_field_id_display() {
        let id: FieldId = "Casting".into();
        assert_eq!(id.to_string(), "Casting");
    }
}
