//! Shared plumbing for the background loops: timing, task handles and
//! poison-tolerant locking.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

/// Cadence of a controller loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// Longest wait for a command before the loop runs again.
    pub tick: Duration,
    /// Pause after a failed iteration.
    pub backoff: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            backoff: Duration::from_secs(1),
        }
    }
}

/// What a loop should do after one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Exit,
}

/// A spawned loop together with the token that stops it.
pub(crate) struct LoopHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl LoopHandle {
    /// Spawn `body` on the current tokio runtime, handing it a fresh token.
    pub(crate) fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(body(cancel.clone()));
        Self { cancel, task }
    }

    /// Cancel the loop and wait until it has returned.
    pub(crate) async fn shutdown(self) -> Result<(), JoinError> {
        self.cancel.cancel();
        self.task.await
    }
}

/// Lock `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
