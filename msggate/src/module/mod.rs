//! The module capability contract and the loader machinery around it.
//!
//! A module is a pluggable processing unit: the gateway constructs it
//! through a [`ModuleLoader`], attaches it to the broker, and from then on
//! the module's whole life is `receive` (and optionally `start`) until it is
//! dropped. Loaders are discovered through the process-wide
//! [`LoaderRegistry`], keyed by unique loader name.

pub mod loader;
pub mod static_loader;
pub mod traits;

pub use loader::{LoaderError, LoaderRegistry, ModuleLoader};
pub use static_loader::StaticModuleLoader;
pub use traits::{Module, ModuleLibrary, GATEWAY_API_VERSION};
