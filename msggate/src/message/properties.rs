//! Ordered string property bag with unique keys.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Errors produced while building a property bag.
///
/// Property keys and values are restricted to 7-bit text so that the wire
/// codec round-trips them without an encoding negotiation, and keys must be
/// non-empty.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropertyError {
    /// The property key was empty
    #[error("property key must be non-empty")]
    EmptyKey,

    /// The property key contained bytes outside the 7-bit range
    #[error("property key is not 7-bit text: {0:?}")]
    NonAsciiKey(String),

    /// The property value contained bytes outside the 7-bit range
    #[error("property value for key {key:?} is not 7-bit text")]
    NonAsciiValue {
        /// Key whose value failed validation
        key: String,
    },
}

/// Ordered set of unique-key string properties attached to a message.
///
/// The bag preserves insertion order, which makes serialization
/// deterministic; lookup by key is unordered by contract. Setting an
/// existing key overwrites the value in place, keeping the key's original
/// position.
///
/// # Example
///
/// ```rust
/// use msggate::message::MessageProperties;
///
/// let mut properties = MessageProperties::new();
/// properties.set("source", "sensor-1").unwrap();
/// properties.set("unit", "celsius").unwrap();
///
/// assert_eq!(properties.get("source"), Some("sensor-1"));
/// let keys: Vec<&str> = properties.iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, ["source", "unit"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageProperties {
    entries: Vec<(String, String)>,
}

impl MessageProperties {
    /// Create an empty property bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, overwriting any existing value for the key.
    ///
    /// An overwritten key keeps its original position in the iteration
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] when the key is empty or when the key or
    /// value is not 7-bit text.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), PropertyError> {
        let key = key.into();
        let value = value.into();

        if key.is_empty() {
            return Err(PropertyError::EmptyKey);
        }
        if !key.is_ascii() {
            return Err(PropertyError::NonAsciiKey(key));
        }
        if !value.is_ascii() {
            return Err(PropertyError::NonAsciiValue { key });
        }

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
        Ok(())
    }

    /// Look up a property value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of properties in the bag.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut properties = MessageProperties::new();
        properties.set("k", "v").unwrap();

        assert_eq!(properties.get("k"), Some("v"));
        assert_eq!(properties.get("missing"), None);
        assert_eq!(properties.len(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut properties = MessageProperties::new();
        properties.set("c", "3").unwrap();
        properties.set("a", "1").unwrap();
        properties.set("b", "2").unwrap();

        let keys: Vec<&str> = properties.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["c", "a", "b"]);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut properties = MessageProperties::new();
        properties.set("first", "1").unwrap();
        properties.set("second", "2").unwrap();
        properties.set("first", "updated").unwrap();

        assert_eq!(properties.len(), 2);
        assert_eq!(properties.get("first"), Some("updated"));

        let keys: Vec<&str> = properties.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["first", "second"]);
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut properties = MessageProperties::new();
        let result = properties.set("", "v");

        assert_eq!(result, Err(PropertyError::EmptyKey));
        assert!(properties.is_empty());
    }

    #[test]
    fn test_non_ascii_key_rejected() {
        let mut properties = MessageProperties::new();
        let result = properties.set("clé", "v");

        assert!(matches!(result, Err(PropertyError::NonAsciiKey(_))));
    }

    #[test]
    fn test_non_ascii_value_rejected() {
        let mut properties = MessageProperties::new();
        let result = properties.set("k", "ünïcode");

        assert!(matches!(result, Err(PropertyError::NonAsciiValue { .. })));
        assert!(!properties.contains_key("k"));
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let mut left = MessageProperties::new();
        left.set("a", "1").unwrap();
        left.set("b", "2").unwrap();

        let mut right = MessageProperties::new();
        right.set("b", "2").unwrap();
        right.set("a", "1").unwrap();

        assert_ne!(left, right);
    }
}
