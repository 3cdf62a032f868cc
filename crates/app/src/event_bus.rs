//! In-process event dispatcher backed by a tokio [`mpsc`] queue.
//!
//! Publishers enqueue snapshots without waiting. A single dispatch loop
//! drains the queue and hands each event to every registered subscriber in
//! turn. A subscriber whose callback fails or panics is evicted; the others
//! keep receiving events.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use aroma_domain::error::DispatchError;
use aroma_domain::event::Event;
use aroma_domain::id::SubscriptionId;

use crate::control_loop::{LoopHandle, lock};
use crate::ports::EventPublisher;

type Callback = Arc<dyn Fn(&Event) -> Result<(), DispatchError> + Send + Sync>;

enum QueueSender {
    Unbounded(mpsc::UnboundedSender<Event>),
    Bounded(mpsc::Sender<Event>),
}

enum QueueReceiver {
    Unbounded(mpsc::UnboundedReceiver<Event>),
    Bounded(mpsc::Receiver<Event>),
}

impl QueueReceiver {
    async fn recv(&mut self) -> Option<Event> {
        match self {
            Self::Unbounded(rx) => rx.recv().await,
            Self::Bounded(rx) => rx.recv().await,
        }
    }
}

struct Inner {
    sender: QueueSender,
    /// Parked here whenever the dispatch loop is not running.
    receiver: Mutex<Option<QueueReceiver>>,
    /// Kept in registration order.
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
    running: Mutex<Option<LoopHandle>>,
}

/// Fans published events out to subscriber callbacks.
///
/// Cloning is cheap; every clone feeds the same queue and subscriber set.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<Inner>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    /// Create a dispatcher with an unbounded queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self::from_queue(QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
    }

    /// Create a dispatcher whose queue holds at most `capacity` pending
    /// events. Events published while the queue is full are dropped.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self::from_queue(QueueSender::Bounded(tx), QueueReceiver::Bounded(rx))
    }

    fn from_queue(sender: QueueSender, receiver: QueueReceiver) -> Self {
        Self {
            inner: Arc::new(Inner {
                sender,
                receiver: Mutex::new(Some(receiver)),
                subscribers: Mutex::new(Vec::new()),
                running: Mutex::new(None),
            }),
        }
    }

    /// Register `callback` for every event dispatched from now on.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        lock(&self.inner.subscribers).push((id, Arc::new(callback)));
        tracing::debug!(subscriber = %id, "subscriber added");
        id
    }

    /// Remove a subscriber. Unknown or already removed ids are ignored, and
    /// a callback may remove itself while it is being invoked.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subscribers = lock(&self.inner.subscribers);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        if subscribers.len() != before {
            tracing::debug!(subscriber = %id, "subscriber removed");
        }
    }

    /// Remove every subscriber, dropping their callbacks.
    pub fn unsubscribe_all(&self) {
        let removed = std::mem::take(&mut *lock(&self.inner.subscribers));
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "all subscribers removed");
        }
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).len()
    }

    /// Drain the queue until `cancel` fires.
    ///
    /// Events still queued when the token is cancelled stay queued and are
    /// delivered by the next run. Returns immediately if another run is
    /// already in progress.
    pub async fn run(&self, cancel: CancellationToken) {
        let receiver = lock(&self.inner.receiver).take();
        let Some(mut queue) = receiver else {
            tracing::warn!("event dispatcher is already running");
            return;
        };

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = queue.recv() => next,
            };
            match next {
                Some(event) => self.deliver(&event),
                None => break,
            }
        }

        *lock(&self.inner.receiver) = Some(queue);
        tracing::debug!("event dispatcher loop exited");
    }

    /// Spawn [`run`](Self::run) on the current runtime. No-op when already
    /// started.
    pub fn start(&self) {
        let mut running = lock(&self.inner.running);
        if running.is_some() {
            return;
        }
        let this = self.clone();
        *running = Some(LoopHandle::spawn(move |cancel| async move {
            this.run(cancel).await;
        }));
        tracing::info!("started event dispatcher");
    }

    /// Cancel the dispatch loop and wait for it to return. Safe to call when
    /// the dispatcher was never started.
    pub async fn stop(&self) {
        let handle = lock(&self.inner.running).take();
        let Some(handle) = handle else {
            return;
        };
        if let Err(err) = handle.shutdown().await {
            tracing::error!(%err, "event dispatcher terminated abnormally");
        }
        tracing::info!("stopped event dispatcher");
    }

    fn deliver(&self, event: &Event) {
        let subscribers = lock(&self.inner.subscribers).clone();
        for (id, callback) in subscribers {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(subscriber = %id, %err, "failed to deliver event, evicting subscriber");
                    self.unsubscribe(id);
                }
                Err(_panic) => {
                    tracing::warn!(subscriber = %id, "subscriber panicked, evicting subscriber");
                    self.unsubscribe(id);
                }
            }
        }
    }
}

impl EventPublisher for EventDispatcher {
    fn publish(&self, event: Event) {
        let result = match &self.inner.sender {
            QueueSender::Unbounded(tx) => tx.send(event).map_err(|_| "queue closed"),
            QueueSender::Bounded(tx) => tx.try_send(event).map_err(|err| match err {
                TrySendError::Full(_) => "queue full",
                TrySendError::Closed(_) => "queue closed",
            }),
        };
        if let Err(reason) = result {
            tracing::error!(reason, "failed to queue event");
        }
    }
}
