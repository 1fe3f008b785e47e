//! # msggate - In-Process Message Gateway
//!
//! A gateway hosting a configurable graph of independently implemented
//! modules and routing typed, opaque messages between them over a shared
//! broker. Modules implement a small lifecycle contract (construct, start,
//! receive, drop); the broker owns delivery and isolates producers from
//! consumers; the gateway assembles the graph from a declarative
//! configuration and reports lifecycle events to registered observers.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use msggate::prelude::*;
//!
//! // 1. Implement a module
//! struct Printer;
//!
//! #[async_trait::async_trait]
//! impl Module for Printer {
//!     async fn receive(&self, message: SharedMessage) {
//!         println!("{:?}", message.payload());
//!     }
//! }
//!
//! // 2. Expose it through a library + loader
//! struct PrinterLibrary;
//!
//! impl ModuleLibrary for PrinterLibrary {
//!     fn create(&self, _broker: Broker, _config: &serde_json::Value)
//!         -> Result<Arc<dyn Module>, LoaderError>
//!     {
//!         Ok(Arc::new(Printer))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     LoaderRegistry::global().register(
//!         "printer",
//!         Arc::new(StaticModuleLoader::new(Arc::new(PrinterLibrary))),
//!     )?;
//!
//!     // 3. Describe the graph and run it
//!     let config = GatewayConfig::new()
//!         .with_module(ModuleEntry::new("printer", "printer"))
//!         .with_link(LinkEntry::from_any("printer"));
//!
//!     let gateway = Gateway::create(Some(config)).await?;
//!     gateway.start().await?;
//!     // ... modules publish through their retained Broker clone ...
//!     gateway.destroy().await;
//!     Ok(())
//! }
//! ```
//!
//! # Delivery Guarantees
//!
//! - **Per-producer FIFO**: messages from one producer reach each of its
//!   sinks in publish order; interleaving across producers is unspecified.
//! - **No self-delivery**: a module never receives its own publications,
//!   wildcard links included.
//! - **Wildcard coverage**: a sink linked from `"*"` receives every other
//!   module's output, including modules added later.
//! - **Containment**: a module that panics in `receive` is logged and
//!   contained; the broker, its queues, and the publisher are unaffected.
//! - **Asynchronous fan-out**: `Broker::publish` returns once every
//!   destination queue holds a reference; delivery happens on the sinks'
//!   dedicated workers.
//!
//! # Module Organization
//!
//! - [`message`] - Immutable message values, property bags, and the wire codec
//! - [`broker`] - Delivery queues, subscription view, and concurrent fan-out
//! - [`module`] - The module capability contract and loader machinery
//! - [`gateway`] - The controller: registry, links, lifecycle, snapshots
//! - [`event`] - Ordered lifecycle event dispatch to observers
//! - [`util`] - Identifiers
//!
//! # Concurrency Model
//!
//! Preemptive, parallel tasks on the async runtime: one delivery worker per
//! attached module, one lazily-spawned event dispatch worker, and any number
//! of application tasks calling the controller or publishing. Controller
//! operations serialize against one another through a single lock and never
//! block message delivery.

pub mod broker;
pub mod event;
pub mod gateway;
pub mod message;
pub mod module;
pub mod util;

// Re-export commonly used types
pub use broker::{Broker, BrokerError};
pub use event::{EventCallback, EventSystem, GatewayEvent};
pub use gateway::{
    ErrorKind, Gateway, GatewayConfig, GatewayError, LinkEntry, ModuleEntry, ModuleInfo,
    ModuleList, WILDCARD_SOURCE,
};
pub use message::{
    Message, MessageCodecError, MessageProperties, PropertyError, SharedMessage,
};
pub use module::{
    LoaderError, LoaderRegistry, Module, ModuleLibrary, ModuleLoader, StaticModuleLoader,
    GATEWAY_API_VERSION,
};
pub use util::ModuleHandle;

/// Convenience re-exports for embedding applications.
pub mod prelude {
    pub use crate::broker::{Broker, BrokerError};
    pub use crate::event::GatewayEvent;
    pub use crate::gateway::{
        Gateway, GatewayConfig, GatewayError, LinkEntry, ModuleEntry, ModuleList,
    };
    pub use crate::message::{Message, MessageProperties, SharedMessage};
    pub use crate::module::{
        LoaderError, LoaderRegistry, Module, ModuleLibrary, ModuleLoader, StaticModuleLoader,
    };
    pub use crate::util::ModuleHandle;
}
