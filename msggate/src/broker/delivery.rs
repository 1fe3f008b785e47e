//! Per-module delivery channel and worker.
//!
//! Every attached module gets one FIFO channel of [`DeliveryCommand`]s and
//! one worker task draining it. The channel replaces a hand-rolled
//! queue/lock/condition trio: enqueueing never waits, the worker parks on
//! `recv`, and the terminal [`DeliveryCommand::Shutdown`] plays the role of
//! the detach flag. Dropping the receiver releases every message reference
//! still queued.

// Layer 1: Standard library imports
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::error;

// Layer 3: Internal module imports
use crate::message::SharedMessage;
use crate::module::Module;

/// One unit of work on a module's delivery queue.
#[derive(Debug)]
pub(crate) enum DeliveryCommand {
    /// Deliver one message reference to the module
    Deliver(SharedMessage),
    /// Stop the worker; references still queued behind this are released
    Shutdown,
}

/// A module's delivery queue plus the worker draining it.
pub(crate) struct DeliveryChannel {
    sender: UnboundedSender<DeliveryCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryChannel {
    /// Allocate the queue and spawn the delivery worker for `module`.
    pub(crate) fn spawn(name: String, module: Arc<dyn Module>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(delivery_loop(name, module, receiver));
        Self {
            sender,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueue one message reference; never waits.
    ///
    /// Returns `false` when the worker has already exited and the reference
    /// was dropped instead of delivered.
    pub(crate) fn deliver(&self, message: SharedMessage) -> bool {
        self.sender.send(DeliveryCommand::Deliver(message)).is_ok()
    }

    /// Wake the worker with the terminal signal.
    pub(crate) fn begin_shutdown(&self) {
        let _ = self.sender.send(DeliveryCommand::Shutdown);
    }

    /// Wait for the worker to observe the shutdown signal and exit.
    pub(crate) async fn join(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

/// Worker loop: drain the queue in FIFO order and invoke the module.
///
/// A `receive` that panics is contained here so a misbehaving module cannot
/// take down its queue, the broker, or the publisher.
async fn delivery_loop(
    name: String,
    module: Arc<dyn Module>,
    mut receiver: UnboundedReceiver<DeliveryCommand>,
) {
    while let Some(command) = receiver.recv().await {
        match command {
            DeliveryCommand::Deliver(message) => {
                let outcome = AssertUnwindSafe(module.receive(message))
                    .catch_unwind()
                    .await;
                if outcome.is_err() {
                    error!(module = %name, "module panicked in receive; message dropped");
                }
            }
            DeliveryCommand::Shutdown => break,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::message::Message;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Recorder {
        delivered: mpsc::UnboundedSender<SharedMessage>,
    }

    #[async_trait]
    impl Module for Recorder {
        async fn receive(&self, message: SharedMessage) {
            let _ = self.delivered.send(message);
        }
    }

    struct Exploder {
        hits: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Module for Exploder {
        async fn receive(&self, _message: SharedMessage) {
            self.hits.fetch_add(1, Ordering::SeqCst);
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn test_fifo_delivery() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let channel = DeliveryChannel::spawn("m".to_string(), Arc::new(Recorder { delivered: tx }));

        for i in 0..5u8 {
            assert!(channel.deliver(Message::from_payload(vec![i]).into_shared()));
        }

        for i in 0..5u8 {
            let message = rx.recv().await.unwrap();
            assert_eq!(message.payload(), &[i]);
        }

        channel.begin_shutdown();
        channel.join().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_worker_and_releases_queue() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let channel = DeliveryChannel::spawn("m".to_string(), Arc::new(Recorder { delivered: tx }));

        let message = Message::from_payload("queued-behind-shutdown").into_shared();
        let weak = Arc::downgrade(&message);

        channel.begin_shutdown();
        // Enqueued after the terminal signal: must be released, not delivered.
        channel.deliver(message);
        channel.join().await;

        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_panicking_module_is_contained() {
        let hits = Arc::new(AtomicUsize::new(0));
        let channel = DeliveryChannel::spawn(
            "m".to_string(),
            Arc::new(Exploder {
                hits: Arc::clone(&hits),
            }),
        );

        channel.deliver(Message::from_payload("a").into_shared());
        channel.deliver(Message::from_payload("b").into_shared());

        // The worker must survive the first panic and process the second
        // message.
        tokio::time::timeout(Duration::from_secs(5), async {
            while hits.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        channel.begin_shutdown();
        channel.join().await;
    }
}
