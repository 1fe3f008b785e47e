//! Shared harness for gateway integration tests.
//!
//! A probe module records everything it receives into a channel the test
//! holds, counts `start` invocations, and exposes the broker clone it was
//! constructed with so tests can publish on its behalf.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)] // Not every test binary uses every helper

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;

use msggate::broker::Broker;
use msggate::message::{Message, MessageProperties, SharedMessage};
use msggate::module::{
    LoaderError, LoaderRegistry, Module, ModuleLibrary, StaticModuleLoader,
};

/// Test-side view of one probe module.
pub struct ProbeHandle {
    /// Broker clone captured at module construction
    pub broker: Arc<OnceLock<Broker>>,
    /// Everything the module's `receive` was invoked with
    pub received: mpsc::UnboundedReceiver<SharedMessage>,
    /// Number of `start` invocations
    pub starts: Arc<AtomicUsize>,
}

struct ProbeModule {
    received: mpsc::UnboundedSender<SharedMessage>,
    starts: Arc<AtomicUsize>,
}

#[async_trait]
impl Module for ProbeModule {
    async fn receive(&self, message: SharedMessage) {
        let _ = self.received.send(message);
    }

    async fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }
}

struct ProbeLibrary {
    broker: Arc<OnceLock<Broker>>,
    received: mpsc::UnboundedSender<SharedMessage>,
    starts: Arc<AtomicUsize>,
}

impl ModuleLibrary for ProbeLibrary {
    fn create(
        &self,
        broker: Broker,
        _configuration: &Value,
    ) -> Result<Arc<dyn Module>, LoaderError> {
        let _ = self.broker.set(broker);
        Ok(Arc::new(ProbeModule {
            received: self.received.clone(),
            starts: Arc::clone(&self.starts),
        }))
    }
}

/// Register a probe loader under `loader_name` (which must be unique across
/// the whole test process) and return the test-side handle.
pub fn install_probe_loader(loader_name: &str) -> ProbeHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let broker = Arc::new(OnceLock::new());
    let starts = Arc::new(AtomicUsize::new(0));

    let library = ProbeLibrary {
        broker: Arc::clone(&broker),
        received: tx,
        starts: Arc::clone(&starts),
    };
    LoaderRegistry::global()
        .register(loader_name, Arc::new(StaticModuleLoader::new(Arc::new(library))))
        .expect("probe loader names must be unique per test");

    ProbeHandle {
        broker,
        received: rx,
        starts,
    }
}

/// Publish `message` on behalf of the module named `source`, through the
/// broker captured by `probe`.
pub fn publish_as(probe: &ProbeHandle, source: &str, message: &SharedMessage) {
    probe
        .broker
        .get()
        .expect("module was never constructed")
        .publish(source, message)
        .expect("publish failed");
}

/// Build a shared message with a payload and optional properties.
pub fn message(payload: &[u8], properties: &[(&str, &str)]) -> SharedMessage {
    let mut bag = MessageProperties::new();
    for (key, value) in properties {
        bag.set(*key, *value).unwrap();
    }
    Message::new(payload.to_vec(), bag).into_shared()
}

/// Await the next delivery with a guard timeout.
pub async fn expect_message(probe: &mut ProbeHandle) -> SharedMessage {
    timeout(Duration::from_secs(5), probe.received.recv())
        .await
        .expect("timed out waiting for a delivery")
        .expect("probe channel closed")
}

/// Assert that nothing is delivered within a grace period.
pub async fn expect_silence(probe: &mut ProbeHandle) {
    let outcome = timeout(Duration::from_millis(150), probe.received.recv()).await;
    assert!(outcome.is_err(), "unexpected delivery: {outcome:?}");
}
