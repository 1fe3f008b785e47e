//! Event kinds, observer closures, and dispatch rows.

// Layer 1: Standard library imports
use std::fmt::{self, Display};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};

// Layer 3: Internal module imports
use crate::gateway::ModuleList;

/// Lifecycle events a gateway reports to its observers.
///
/// [`ModuleListChanged`](GatewayEvent::ModuleListChanged) carries a
/// [`ModuleList`] snapshot as its context; the other kinds carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayEvent {
    /// The gateway finished constructing (configuration applied)
    Created,
    /// Every module's startup hook has been invoked
    Started,
    /// A module or link was added or removed
    ModuleListChanged,
    /// Gateway teardown has begun
    Destroyed,
}

impl GatewayEvent {
    /// Number of event kinds; sizes the per-kind observer lists.
    pub(crate) const COUNT: usize = 4;

    /// Dense index for per-kind storage.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Created => 0,
            Self::Started => 1,
            Self::ModuleListChanged => 2,
            Self::Destroyed => 3,
        }
    }
}

impl Display for GatewayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "gateway-created",
            Self::Started => "gateway-started",
            Self::ModuleListChanged => "module-list-changed",
            Self::Destroyed => "gateway-destroyed",
        };
        write!(f, "{name}")
    }
}

/// Observer closure invoked by the dispatch worker.
///
/// The closure receives the event kind and, for
/// [`GatewayEvent::ModuleListChanged`], the module-list snapshot taken when
/// the event was reported. State an observer needs travels by capture.
pub type EventCallback = Arc<dyn Fn(GatewayEvent, Option<&ModuleList>) + Send + Sync>;

/// One reported event bound to the observers registered at report time.
///
/// The row owns the snapshot context; it is released when the row is
/// dropped, after the last observer of the row has run.
pub(crate) struct DispatchRow {
    pub(crate) event: GatewayEvent,
    pub(crate) callbacks: Vec<EventCallback>,
    pub(crate) context: Option<Arc<ModuleList>>,
    #[allow(dead_code)] // Recorded for tracing and debugging
    pub(crate) reported_at: DateTime<Utc>,
}
