//! The gateway controller: module/link registry and lifecycle supervisor.
//!
//! The controller owns the broker, the event system, and the registry of
//! modules and links. It assembles the graph from a declarative
//! configuration, mutates it while the broker keeps running, and reports
//! every lifecycle transition to registered observers.
//!
//! # Modules
//!
//! - [`config`]: the configuration shape delivered by an external parser
//! - [`error`]: typed mutator failures and the error taxonomy
//! - [`snapshot`]: defensive module-list snapshots
//! - [`controller`]: the [`Gateway`] itself

pub mod config;
pub mod controller;
pub mod error;
pub mod snapshot;

pub use config::{GatewayConfig, LinkEntry, ModuleEntry, WILDCARD_SOURCE};
pub use controller::Gateway;
pub use error::{ErrorKind, GatewayError};
pub use snapshot::{ModuleInfo, ModuleList};
