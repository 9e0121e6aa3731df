use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Cooperative cancellation handle shared between a run controller and one
/// in-flight backend turn. Triggering is advisory: the backend is expected to
/// observe the signal and terminate its own event stream.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal {
    inner: Arc<AbortInner>,
}

#[derive(Debug, Default)]
struct AbortInner {
    triggered: AtomicBool,
    notify: Notify,
}

impl AbortSignal {
    /// Create an untriggered signal.
    /// Allocation: one Arc. Complexity: O(1).
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the signal and wake all waiters. Idempotent.
    /// Allocation: none. Complexity: O(waiters).
    pub fn trigger(&self) {
        self.inner.triggered.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Snapshot of the triggered flag.
    /// Allocation: none. Complexity: O(1).
    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::Acquire)
    }

    /// Suspend until the signal fires. Returns immediately when already fired.
    pub async fn triggered(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}
