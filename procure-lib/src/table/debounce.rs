//! Cancellable one-shot timer.

use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Runs an action once a quiet period has passed since the last [`arm`](Self::arm).
///
/// Arming again before the delay elapses resets the timer; only the most
/// recently armed action runs.
pub struct Debouncer {
    delay: Duration,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Creates a debouncer that spawns its timers on `runtime`.
    pub fn new(delay: Duration, runtime: Handle) -> Self {
        Self {
            delay,
            runtime,
            pending: Mutex::new(None),
        }
    }

    /// Returns the quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `action`, cancelling any action still waiting.
    pub fn arm<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });
        let previous = self.slot().replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Cancels the waiting action. Returns `true` if one was waiting.
    pub fn cancel(&self) -> bool {
        match self.slot().take() {
            Some(task) if !task.is_finished() => {
                task.abort();
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if an action is waiting to run.
    pub fn is_pending(&self) -> bool {
        self.slot().as_ref().is_some_and(|task| !task.is_finished())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}
