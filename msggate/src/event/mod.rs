//! Lifecycle event dispatch to registered observers.
//!
//! The gateway reports lifecycle transitions here; a single worker task
//! serializes observer callbacks off the mutating thread, so a slow or
//! misbehaving observer can delay later events but never a gateway
//! operation. Events are observed in the order they were reported.

pub mod system;
pub mod types;

pub use system::EventSystem;
pub use types::{EventCallback, GatewayEvent};
