//! Loader for modules compiled into the host process.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use serde_json::Value;

// Layer 3: Internal module imports
use super::loader::{LoaderError, ModuleLoader};
use super::traits::ModuleLibrary;

/// Loader serving a single in-process module library.
///
/// Out-of-process and foreign-runtime loaders resolve their entrypoint to
/// a library; for a library that is already linked into the host there is
/// nothing to resolve, so `load` ignores the entrypoint and hands out the
/// wrapped library, and the module configuration passes through unchanged.
///
/// Register one instance per in-process module implementation:
///
/// ```ignore
/// LoaderRegistry::global().register(
///     "thermometer",
///     Arc::new(StaticModuleLoader::new(Arc::new(ThermometerLibrary))),
/// )?;
/// ```
pub struct StaticModuleLoader {
    library: Arc<dyn ModuleLibrary>,
}

impl StaticModuleLoader {
    /// Wrap an in-process module library.
    pub fn new(library: Arc<dyn ModuleLibrary>) -> Self {
        Self { library }
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, _entrypoint: &Value) -> Result<Arc<dyn ModuleLibrary>, LoaderError> {
        Ok(Arc::clone(&self.library))
    }

    fn build_module_configuration(
        &self,
        _entrypoint: &Value,
        configuration: &Value,
    ) -> Result<Value, LoaderError> {
        Ok(configuration.clone())
    }
}
