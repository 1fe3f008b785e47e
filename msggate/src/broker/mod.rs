//! Message distribution fabric between gateway modules.
//!
//! The broker owns one delivery queue and one delivery worker per attached
//! module and routes every published message to the sinks subscribed to its
//! producer, excluding the producer itself. Subscriptions come in two
//! flavors, unified only at publish time:
//!
//! - **explicit**: `(source, sink)` pairs,
//! - **wildcard**: sinks that receive traffic from every producer.
//!
//! # Delivery semantics
//!
//! - Per `(producer, sink)` pair messages arrive in publish order; the
//!   interleaving across producers is unspecified.
//! - A message is never delivered to its own producer.
//! - `publish` returns once every destination has been enqueued; delivery is
//!   asynchronous on the sinks' workers.
//! - A module that panics inside `receive` is contained and logged; the
//!   broker and the other queues keep running.
//!
//! # Modules
//!
//! This mod.rs file contains only module declarations and re-exports.
//!
//! - [`error`]: broker error types
//! - [`subscription`]: the explicit + wildcard routing view
//! - [`delivery`]: per-module delivery channel and worker
//! - [`fabric`]: the [`Broker`] itself

pub mod delivery;
pub mod error;
pub mod fabric;
pub mod subscription;

pub use error::BrokerError;
pub use fabric::Broker;
