//! Capability contract implemented by every gateway module.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;

// Layer 3: Internal module imports
use super::loader::LoaderError;
use crate::broker::Broker;
use crate::message::SharedMessage;

/// Highest module API version this gateway accepts.
///
/// A [`ModuleLibrary`] reporting a greater version is rejected by
/// `Gateway::add_module` before the module is constructed.
pub const GATEWAY_API_VERSION: u32 = 1;

/// A pluggable processing unit participating in the message graph.
///
/// The gateway constructs modules through a loader, attaches them to the
/// broker, and delivers inbound messages on a dedicated worker. Releasing
/// a module is `Drop`: whatever the module holds (broker clone, sockets,
/// background state) is released when the gateway drops its last handle
/// after detach.
///
/// # Contract
///
/// - `receive` is invoked by the module's delivery worker, one message at a
///   time and in per-producer publish order. It must not call destructive
///   gateway operations (remove itself, destroy the gateway); publishing
///   through the retained [`Broker`] clone is permitted.
/// - `start` is invoked once all configured modules are constructed;
///   modules that emit traffic on startup do it here. The default is a
///   no-op.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use msggate::broker::Broker;
/// use msggate::message::{Message, SharedMessage};
/// use msggate::module::Module;
///
/// struct Echo {
///     name: String,
///     broker: Broker,
/// }
///
/// #[async_trait]
/// impl Module for Echo {
///     async fn receive(&self, message: SharedMessage) {
///         let reply = Message::new(message.payload().to_vec(), Default::default());
///         let _ = self.broker.publish(&self.name, &reply.into_shared());
///     }
/// }
/// ```
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Handle one inbound message.
    async fn receive(&self, message: SharedMessage);

    /// Optional startup hook, called by `Gateway::start` /
    /// `Gateway::start_module` for modules that were not started yet.
    async fn start(&self) {}
}

/// A loaded module implementation, ready to construct instances.
///
/// This is the Rust rendition of the loader's "get the module's API"
/// step: one value that reports the API version it was built against and
/// constructs module instances from a built configuration.
pub trait ModuleLibrary: Send + Sync {
    /// API version the library was built against.
    ///
    /// The gateway refuses libraries whose version exceeds
    /// [`GATEWAY_API_VERSION`].
    fn api_version(&self) -> u32 {
        GATEWAY_API_VERSION
    }

    /// Construct a module instance.
    ///
    /// The instance retains `broker` for later publishing. `configuration`
    /// is the value produced by the loader's
    /// [`build_module_configuration`](super::loader::ModuleLoader::build_module_configuration).
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::CreateFailed`] (or a more specific variant)
    /// when the configuration is unusable or construction fails.
    fn create(&self, broker: Broker, configuration: &Value)
        -> Result<Arc<dyn Module>, LoaderError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Inert;

    #[async_trait]
    impl Module for Inert {
        async fn receive(&self, _message: SharedMessage) {}
    }

    struct InertLibrary;

    impl ModuleLibrary for InertLibrary {
        fn create(
            &self,
            _broker: Broker,
            _configuration: &Value,
        ) -> Result<Arc<dyn Module>, LoaderError> {
            Ok(Arc::new(Inert))
        }
    }

    #[tokio::test]
    async fn test_default_start_is_a_noop() {
        let module = Inert;
        module.start().await;
    }

    #[test]
    fn test_default_api_version_matches_gateway() {
        let library = InertLibrary;
        assert_eq!(library.api_version(), GATEWAY_API_VERSION);
    }

    #[test]
    fn test_library_creates_instances() {
        let library = InertLibrary;
        let module = library.create(Broker::new(), &Value::Null);
        assert!(module.is_ok());
    }
}
