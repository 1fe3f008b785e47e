//! The broker's routing view: explicit subscriptions plus wildcard sinks.

// Layer 1: Standard library imports
use std::collections::BTreeSet;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use parking_lot::RwLock;

// Layer 3: Internal module imports
// (none)

/// Routing view mapping producers to subscribed sinks.
///
/// Keeps the wildcard subscriptions in a separate set from the explicit
/// `(source, sink)` pairs; the two are unified only when resolving the
/// destinations of a publication. Adds deduplicate, removes of absent
/// entries are silent successes.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionTable {
    /// Explicit subscriptions: producer name → sink names
    explicit: DashMap<String, Vec<String>>,

    /// Sinks subscribed to every producer
    wildcard: RwLock<Vec<String>>,
}

impl SubscriptionTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record that `sink` receives everything published by `source`.
    ///
    /// Repeating an existing pair is a no-op.
    pub(crate) fn add(&self, source: &str, sink: &str) {
        let mut sinks = self.explicit.entry(source.to_owned()).or_default();
        if !sinks.iter().any(|s| s == sink) {
            sinks.push(sink.to_owned());
        }
    }

    /// Record that `sink` receives everything published by any producer.
    pub(crate) fn add_wildcard(&self, sink: &str) {
        let mut wildcard = self.wildcard.write();
        if !wildcard.iter().any(|s| s == sink) {
            wildcard.push(sink.to_owned());
        }
    }

    /// Remove an explicit pair; absent pairs are a silent success.
    pub(crate) fn remove(&self, source: &str, sink: &str) {
        let now_empty = match self.explicit.get_mut(source) {
            Some(mut sinks) => {
                sinks.retain(|s| s != sink);
                sinks.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.explicit.remove_if(source, |_, sinks| sinks.is_empty());
        }
    }

    /// Remove a wildcard sink; absent sinks are a silent success.
    pub(crate) fn remove_wildcard(&self, sink: &str) {
        self.wildcard.write().retain(|s| s != sink);
    }

    /// Resolve the destination set for one publication.
    ///
    /// Union of the producer's explicit sinks and the wildcard sinks, with
    /// the producer itself always excluded. The `BTreeSet` both deduplicates
    /// a sink reachable through both collections and fixes the fan-out
    /// order by sink name.
    pub(crate) fn destinations_for(&self, producer: &str) -> BTreeSet<String> {
        let mut destinations = BTreeSet::new();
        if let Some(sinks) = self.explicit.get(producer) {
            destinations.extend(sinks.iter().cloned());
        }
        destinations.extend(self.wildcard.read().iter().cloned());
        destinations.remove(producer);
        destinations
    }

    /// Drop every subscription that references `name` as either endpoint.
    ///
    /// Used when a module detaches so no stale routing entry survives it.
    pub(crate) fn purge(&self, name: &str) {
        self.explicit.remove(name);
        self.explicit.retain(|_, sinks| {
            sinks.retain(|s| s != name);
            !sinks.is_empty()
        });
        self.remove_wildcard(name);
    }
}
