//! Single-consumer dispatcher for gateway lifecycle events.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error};

// Layer 3: Internal module imports
use super::types::{DispatchRow, EventCallback, GatewayEvent};
use crate::gateway::ModuleList;

/// How long the dispatch worker waits on an empty queue before re-checking
/// whether it should keep running.
const EMPTY_QUEUE_IDLE_TIMEOUT: Duration = Duration::from_millis(200);

/// Ordered dispatcher of lifecycle events to registered observers.
///
/// A single worker task drains a FIFO queue of dispatch rows; within a row,
/// observers run in registration order, and rows run in report order, so
/// observers see events exactly as they were reported. The worker is
/// spawned lazily on the first report and joined at destroy.
///
/// Any internal failure latches a sticky error flag: further reports are
/// logged and dropped, while observer registration keeps succeeding.
pub struct EventSystem {
    inner: Arc<EventSystemInner>,
}

struct EventSystemInner {
    /// Observer lists, one per event kind
    callbacks: [Mutex<Vec<EventCallback>>; GatewayEvent::COUNT],

    /// Sender half of the dispatch queue; taken at destroy to close it
    queue: Mutex<Option<UnboundedSender<DispatchRow>>>,

    /// The dispatch worker, once spawned
    worker: Mutex<Option<JoinHandle<()>>>,

    /// While set, the worker keeps waiting through idle timeouts
    keep_alive: Arc<AtomicBool>,

    /// Sticky error latch; reports short-circuit once set
    errored: AtomicBool,
}

impl EventSystem {
    /// Allocate an event system with no observers and no worker.
    ///
    /// The worker task is spawned lazily by the first report.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EventSystemInner {
                callbacks: std::array::from_fn(|_| Mutex::new(Vec::new())),
                queue: Mutex::new(None),
                worker: Mutex::new(None),
                keep_alive: Arc::new(AtomicBool::new(true)),
                errored: AtomicBool::new(false),
            }),
        }
    }

    /// Register an observer for one event kind.
    ///
    /// Safe to call from any thread at any time, including from inside a
    /// running callback: the new observer takes effect on the next report,
    /// because each report snapshots the list. Registration succeeds even
    /// after the error latch has been set.
    pub fn add_callback(&self, event: GatewayEvent, callback: EventCallback) {
        self.inner.callbacks[event.index()].lock().push(callback);
    }

    /// Report an event, with an optional module-list snapshot as context.
    ///
    /// Snapshots the observer list for `event`; when no observer is
    /// registered the report is dropped without building a row. Never
    /// blocks on observer execution.
    pub fn report(&self, event: GatewayEvent, context: Option<ModuleList>) {
        if self.inner.errored.load(Ordering::Acquire) {
            debug!(%event, "event dropped: event system is errored");
            return;
        }

        let callbacks = self.inner.callbacks[event.index()].lock().clone();
        if callbacks.is_empty() {
            return;
        }

        let row = DispatchRow {
            event,
            callbacks,
            context: context.map(Arc::new),
            reported_at: Utc::now(),
        };

        let mut queue = self.inner.queue.lock();
        let sender = queue.get_or_insert_with(|| self.spawn_worker());
        if sender.send(row).is_err() {
            self.inner.errored.store(true, Ordering::Release);
            error!(%event, "dispatch queue closed; no further events will be delivered");
        }
    }

    /// Spawn the dispatch worker and return the queue sender.
    fn spawn_worker(&self) -> UnboundedSender<DispatchRow> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let keep_alive = Arc::clone(&self.inner.keep_alive);
        let worker = tokio::spawn(dispatch_loop(receiver, keep_alive));
        *self.inner.worker.lock() = Some(worker);
        sender
    }

    /// Tear the event system down.
    ///
    /// Clears the keep-alive flag, closes the dispatch queue, and waits for
    /// the worker, which drains every row still queued (invoking its
    /// observers and releasing its context) before exiting.
    pub async fn destroy(&self) {
        self.inner.keep_alive.store(false, Ordering::Release);
        let sender = self.inner.queue.lock().take();
        drop(sender);

        let worker = self.inner.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker loop: pop rows FIFO and invoke each row's observers in
/// registration order.
///
/// The bounded wait keeps the worker responsive to teardown: on an idle
/// timeout it exits if the keep-alive flag was cleared, otherwise it keeps
/// waiting. A closed queue (destroy) ends the loop once drained.
async fn dispatch_loop(
    mut receiver: UnboundedReceiver<DispatchRow>,
    keep_alive: Arc<AtomicBool>,
) {
    loop {
        match timeout(EMPTY_QUEUE_IDLE_TIMEOUT, receiver.recv()).await {
            Ok(Some(row)) => {
                for callback in &row.callbacks {
                    callback(row.event, row.context.as_deref());
                }
                // Dropping the row here releases the snapshot context only
                // after every observer of this row has run.
            }
            Ok(None) => break,
            Err(_) => {
                if !keep_alive.load(Ordering::Acquire) {
                    break;
                }
            }
        }
    }
}
