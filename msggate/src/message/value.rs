//! The immutable message value.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use bytes::Bytes;

// Layer 3: Internal module imports
use super::properties::MessageProperties;

/// Reference-counted handle to an immutable [`Message`].
///
/// Cloning is O(1) and bumps the atomic reference count; the message is
/// freed when the last holder drops its handle. The broker takes one clone
/// per destination at publish time and each delivery worker releases its
/// clone after the module's `receive` returns.
pub type SharedMessage = Arc<Message>;

/// Immutable message: an opaque byte payload plus a string property bag.
///
/// Messages never change after construction, so any number of readers may
/// inspect a shared message concurrently without synchronization.
///
/// # Example
///
/// ```rust
/// use msggate::message::{Message, MessageProperties};
///
/// let mut properties = MessageProperties::new();
/// properties.set("k", "v").unwrap();
///
/// let message = Message::new("hello", properties);
/// assert_eq!(message.payload(), b"hello");
/// assert_eq!(message.properties().get("k"), Some("v"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Bytes,
    properties: MessageProperties,
}

impl Message {
    /// Create a message from a payload and a property bag.
    ///
    /// A zero-length payload is valid.
    pub fn new(payload: impl Into<Bytes>, properties: MessageProperties) -> Self {
        Self {
            payload: payload.into(),
            properties,
        }
    }

    /// Create a message carrying only a payload.
    pub fn from_payload(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, MessageProperties::new())
    }

    /// Wrap the message in its shared, reference-counted form.
    pub fn into_shared(self) -> SharedMessage {
        Arc::new(self)
    }

    /// The opaque payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The message properties.
    pub fn properties(&self) -> &MessageProperties {
        &self.properties
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_construction() {
        let mut properties = MessageProperties::new();
        properties.set("k", "v").unwrap();

        let message = Message::new(vec![1u8, 2, 3], properties);
        assert_eq!(message.payload(), &[1, 2, 3]);
        assert_eq!(message.properties().get("k"), Some("v"));
    }

    #[test]
    fn test_empty_payload_is_valid() {
        let message = Message::from_payload(Vec::new());
        assert!(message.payload().is_empty());
        assert!(message.properties().is_empty());
    }

    #[test]
    fn test_shared_clone_bumps_count() {
        let shared = Message::from_payload("x").into_shared();
        assert_eq!(Arc::strong_count(&shared), 1);

        let clone = Arc::clone(&shared);
        assert_eq!(Arc::strong_count(&shared), 2);

        drop(clone);
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[test]
    fn test_message_equality() {
        let left = Message::from_payload("same");
        let right = Message::from_payload("same");
        assert_eq!(left, right);

        let other = Message::from_payload("different");
        assert_ne!(left, other);
    }
}
