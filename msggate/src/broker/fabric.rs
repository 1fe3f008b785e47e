//! The broker: attach/detach, subscriptions, and concurrent fan-out.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use super::delivery::DeliveryChannel;
use super::error::BrokerError;
use super::subscription::SubscriptionTable;
use crate::message::SharedMessage;
use crate::module::Module;

/// In-process message broker routing publications between attached modules.
///
/// Clones are cheap and share the same state; the gateway hands a clone to
/// every module it constructs so the module can publish from `receive` or
/// `start`.
///
/// # Example (system-level usage)
///
/// ```ignore
/// use msggate::broker::Broker;
///
/// let broker = Broker::new();
/// broker.attach("sensor", sensor_module)?;
/// broker.attach("printer", printer_module)?;
/// broker.add_subscription("sensor", "printer")?;
///
/// broker.publish("sensor", &message)?; // printer's worker delivers it
/// ```
#[derive(Clone)]
pub struct Broker {
    inner: Arc<BrokerInner>,
}

struct BrokerInner {
    /// Delivery channel per attached module, keyed by module name
    channels: DashMap<String, DeliveryChannel>,

    /// Routing view (explicit pairs + wildcard sinks)
    subscriptions: SubscriptionTable,

    /// Once set, every mutating call and publication is refused
    shutting_down: AtomicBool,
}

impl Broker {
    /// Create an empty broker with no attached modules.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                channels: DashMap::new(),
                subscriptions: SubscriptionTable::new(),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// Attach a module, allocating its delivery queue and worker.
    ///
    /// # Errors
    ///
    /// - [`BrokerError::AlreadyAttached`] if a module of that name is
    ///   already attached (attach is not idempotent).
    /// - [`BrokerError::ShuttingDown`] once teardown has begun.
    pub fn attach(&self, name: &str, module: Arc<dyn Module>) -> Result<(), BrokerError> {
        if self.inner.shutting_down.load(Ordering::Acquire) {
            return Err(BrokerError::ShuttingDown);
        }
        match self.inner.channels.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(BrokerError::AlreadyAttached(name.to_owned())),
            Entry::Vacant(slot) => {
                slot.insert(DeliveryChannel::spawn(name.to_owned(), module));
                Ok(())
            }
        }
    }

    /// Detach a module: stop routing to it, wake its worker with the
    /// terminal signal, and wait for the worker to exit.
    ///
    /// References still queued when the worker exits are released, not
    /// delivered. Subscriptions naming the module as either endpoint are
    /// purged from the routing view.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::NotAttached`] for an unknown module.
    pub async fn detach(&self, name: &str) -> Result<(), BrokerError> {
        let (_, channel) = self
            .inner
            .channels
            .remove(name)
            .ok_or_else(|| BrokerError::NotAttached(name.to_owned()))?;

        self.inner.subscriptions.purge(name);
        channel.begin_shutdown();
        channel.join().await;
        Ok(())
    }

    /// Record that `sink` receives everything published by `source`.
    ///
    /// Repeating an existing pair is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::ShuttingDown`] once teardown has begun.
    pub fn add_subscription(&self, source: &str, sink: &str) -> Result<(), BrokerError> {
        if self.inner.shutting_down.load(Ordering::Acquire) {
            return Err(BrokerError::ShuttingDown);
        }
        self.inner.subscriptions.add(source, sink);
        Ok(())
    }

    /// Record that `sink` receives everything published by any producer.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::ShuttingDown`] once teardown has begun.
    pub fn add_wildcard_subscription(&self, sink: &str) -> Result<(), BrokerError> {
        if self.inner.shutting_down.load(Ordering::Acquire) {
            return Err(BrokerError::ShuttingDown);
        }
        self.inner.subscriptions.add_wildcard(sink);
        Ok(())
    }

    /// Remove an explicit subscription; removing a pair that does not exist
    /// is a silent success.
    pub fn remove_subscription(&self, source: &str, sink: &str) {
        self.inner.subscriptions.remove(source, sink);
    }

    /// Remove a wildcard subscription; removing a sink that does not exist
    /// is a silent success.
    pub fn remove_wildcard_subscription(&self, sink: &str) {
        self.inner.subscriptions.remove_wildcard(sink);
    }

    /// Publish a message on behalf of `source`.
    ///
    /// Resolves the destination set (explicit sinks of `source`, plus every
    /// wildcard sink, minus `source` itself, deduplicated), takes one
    /// reference per destination, and enqueues it on that destination's
    /// queue. Returns once every enqueue completed; delivery happens
    /// asynchronously on the sinks' workers.
    ///
    /// Fan-out is best-effort: a destination whose queue has closed is
    /// logged and skipped, and enqueues already made for earlier
    /// destinations stand.
    ///
    /// # Errors
    ///
    /// - [`BrokerError::ShuttingDown`] once teardown has begun.
    /// - [`BrokerError::NotAttached`] when `source` is not attached; in
    ///   particular, publishing after the producer's detach has begun is
    ///   refused.
    pub fn publish(&self, source: &str, message: &SharedMessage) -> Result<(), BrokerError> {
        if self.inner.shutting_down.load(Ordering::Acquire) {
            warn!(module = %source, "publish refused: broker is shutting down");
            return Err(BrokerError::ShuttingDown);
        }
        if !self.inner.channels.contains_key(source) {
            warn!(module = %source, "publish refused: producer is not attached");
            return Err(BrokerError::NotAttached(source.to_owned()));
        }

        for sink in self.inner.subscriptions.destinations_for(source) {
            // Channels are taken one at a time; nothing is held across
            // destinations.
            match self.inner.channels.get(&sink) {
                Some(channel) => {
                    if !channel.deliver(Arc::clone(message)) {
                        debug!(module = %sink, "destination queue closed; reference dropped");
                    }
                }
                None => {
                    // The sink detached between resolution and enqueue.
                    debug!(module = %sink, "destination vanished during fan-out");
                }
            }
        }
        Ok(())
    }

    /// Number of currently attached modules.
    pub fn module_count(&self) -> usize {
        self.inner.channels.len()
    }

    /// Tear the broker down: refuse all further publications and detach
    /// every remaining module, draining and joining their workers.
    pub async fn shutdown(&self) {
        self.inner.shutting_down.store(true, Ordering::Release);

        let names: Vec<String> = self
            .inner
            .channels
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for name in names {
            if let Some((_, channel)) = self.inner.channels.remove(&name) {
                channel.begin_shutdown();
                channel.join().await;
            }
        }
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}
