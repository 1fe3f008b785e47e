//! Immutable message values shared by reference counting.
//!
//! A [`Message`] carries an opaque byte payload and an ordered bag of string
//! properties. Messages never change after construction, so clones of a
//! [`SharedMessage`] are safe to hand to any number of delivery queues
//! without locking; the atomic reference count is the only mutable state.

pub mod codec;
pub mod properties;
pub mod value;

pub use codec::MessageCodecError;
pub use properties::{MessageProperties, PropertyError};
pub use value::{Message, SharedMessage};
