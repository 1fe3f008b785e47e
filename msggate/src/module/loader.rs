//! Loader contract and the process-wide loader registry.

// Layer 1: Standard library imports
use std::sync::{Arc, OnceLock};

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;

// Layer 3: Internal module imports
use super::traits::ModuleLibrary;

/// Failure modes of module loading and construction.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The loader could not produce a module library
    #[error("loader failed to load module library: {0}")]
    LoadFailed(String),

    /// The loader entrypoint payload was malformed
    #[error("invalid loader entrypoint: {0}")]
    InvalidEntrypoint(String),

    /// The module configuration payload was malformed
    #[error("invalid module configuration: {0}")]
    InvalidConfiguration(String),

    /// The library refused to construct the module instance
    #[error("module construction failed: {0}")]
    CreateFailed(String),

    /// A loader with the same name is already registered
    #[error("loader already registered: {0}")]
    AlreadyRegistered(String),
}

/// Loads module libraries and builds their final configuration.
///
/// A loader hides how a module implementation comes into the process.
/// The gateway consumes `load`, `unload`, and `build_module_configuration`
/// at runtime; everything else about a loader (parsing its entrypoint out
/// of a configuration file, for instance) belongs to the external
/// configuration layer.
pub trait ModuleLoader: Send + Sync {
    /// Resolve the entrypoint payload to a loaded module library.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::LoadFailed`] or
    /// [`LoaderError::InvalidEntrypoint`] when the payload does not name a
    /// loadable library.
    fn load(&self, entrypoint: &Value) -> Result<Arc<dyn ModuleLibrary>, LoaderError>;

    /// Release a library obtained from [`load`](Self::load).
    ///
    /// The default does nothing; loaders that hold external resources per
    /// library override it.
    fn unload(&self, library: Arc<dyn ModuleLibrary>) {
        let _ = library;
    }

    /// Build the configuration value handed to
    /// [`ModuleLibrary::create`] from the entrypoint and the
    /// module-specific configuration payload.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidConfiguration`] when the pair cannot
    /// be combined into a usable configuration.
    fn build_module_configuration(
        &self,
        entrypoint: &Value,
        configuration: &Value,
    ) -> Result<Value, LoaderError>;
}

/// Process-wide registry of module loaders, keyed by unique loader name.
///
/// The registry is initialized once per process on first use; gateways
/// resolve the loader named by each module entry here, and `add_module`
/// fails when the configuration references a name that was never
/// registered. Registrations live for the rest of the process.
///
/// # Example
///
/// ```ignore
/// use msggate::module::{LoaderRegistry, StaticModuleLoader};
///
/// LoaderRegistry::global().register("sensors", Arc::new(loader))?;
/// let loader = LoaderRegistry::global().resolve("sensors").unwrap();
/// ```
pub struct LoaderRegistry {
    loaders: DashMap<String, Arc<dyn ModuleLoader>>,
}

impl LoaderRegistry {
    fn new() -> Self {
        Self {
            loaders: DashMap::new(),
        }
    }

    /// The process-wide registry instance.
    pub fn global() -> &'static LoaderRegistry {
        static REGISTRY: OnceLock<LoaderRegistry> = OnceLock::new();
        REGISTRY.get_or_init(LoaderRegistry::new)
    }

    /// Register a loader under a unique name.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::AlreadyRegistered`] when the name is taken;
    /// the existing registration is untouched.
    pub fn register(
        &self,
        name: impl Into<String>,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<(), LoaderError> {
        let name = name.into();
        match self.loaders.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(LoaderError::AlreadyRegistered(name))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(loader);
                Ok(())
            }
        }
    }

    /// Look up a loader by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn ModuleLoader>> {
        self.loaders.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a registration; returns whether the name was present.
    pub fn unregister(&self, name: &str) -> bool {
        self.loaders.remove(name).is_some()
    }

    /// Number of registered loaders.
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Check whether no loader is registered.
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::broker::Broker;
    use crate::module::Module;

    struct NullLibrary;

    impl ModuleLibrary for NullLibrary {
        fn create(
            &self,
            _broker: Broker,
            _configuration: &Value,
        ) -> Result<Arc<dyn Module>, LoaderError> {
            Err(LoaderError::CreateFailed("null library".to_string()))
        }
    }

    struct NullLoader;

    impl ModuleLoader for NullLoader {
        fn load(&self, _entrypoint: &Value) -> Result<Arc<dyn ModuleLibrary>, LoaderError> {
            Ok(Arc::new(NullLibrary))
        }

        fn build_module_configuration(
            &self,
            _entrypoint: &Value,
            configuration: &Value,
        ) -> Result<Value, LoaderError> {
            Ok(configuration.clone())
        }
    }

    // Registry tests run against private instances; the global one is
    // shared with every other test in the process.
    #[test]
    fn test_register_and_resolve() {
        let registry = LoaderRegistry::new();
        registry.register("null", Arc::new(NullLoader)).unwrap();

        assert!(registry.resolve("null").is_some());
        assert!(registry.resolve("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let registry = LoaderRegistry::new();
        registry.register("null", Arc::new(NullLoader)).unwrap();

        let result = registry.register("null", Arc::new(NullLoader));
        assert!(matches!(result, Err(LoaderError::AlreadyRegistered(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = LoaderRegistry::new();
        registry.register("null", Arc::new(NullLoader)).unwrap();

        assert!(registry.unregister("null"));
        assert!(!registry.unregister("null"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_global_registry_is_a_singleton() {
        let first: *const LoaderRegistry = LoaderRegistry::global();
        let second: *const LoaderRegistry = LoaderRegistry::global();
        assert_eq!(first, second);
    }
}
