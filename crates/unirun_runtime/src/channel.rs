use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;
use tracing::warn;

use crate::errors::ChannelError;
use crate::events::RuntimeEvent;

/// Default buffer bound. Chosen large relative to typical per-run event volume
/// so a slow consumer may lose intermediate deltas but never the terminal event
/// (which is always pushed last).
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

/// Single-producer/single-consumer event sequence for one run.
///
/// Backpressure policy is drop-oldest: pushing into a full buffer evicts the
/// oldest buffered item. Exactly one consumer may ever be taken.
#[derive(Clone, Debug)]
pub struct EventChannel {
    inner: Arc<ChannelInner>,
}

#[derive(Debug)]
struct ChannelInner {
    state: Mutex<ChannelState>,
    notify: Notify,
}

#[derive(Debug)]
struct ChannelState {
    buf: VecDeque<RuntimeEvent>,
    capacity: usize,
    closed: bool,
    consumer_taken: bool,
    dropped: u64,
}

impl EventChannel {
    /// Create a channel with an explicit capacity bound.
    /// Allocation: one Arc + buffer headroom. Complexity: O(1).
    pub fn new(capacity: usize) -> Result<Self, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::ZeroCapacity);
        }
        Ok(Self::with_capacity(capacity))
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                state: Mutex::new(ChannelState {
                    buf: VecDeque::with_capacity(capacity.min(64)),
                    capacity,
                    closed: false,
                    consumer_taken: false,
                    dropped: 0,
                }),
                notify: Notify::new(),
            }),
        }
    }

    /// Append one event, evicting the oldest buffered item when full.
    /// Pushes after close are dropped. Complexity: amortized O(1).
    pub fn push(&self, event: RuntimeEvent) {
        {
            let mut state = lock_state(&self.inner);
            if state.closed {
                return;
            }
            if state.buf.len() == state.capacity {
                state.buf.pop_front();
                state.dropped += 1;
                if state.dropped == 1 {
                    warn!(
                        run_id = %event.run_id,
                        capacity = state.capacity,
                        "event channel full; dropping oldest events"
                    );
                }
            }
            state.buf.push_back(event);
        }
        self.inner.notify.notify_one();
    }

    /// Close the channel. Idempotent; wakes a suspended consumer so it observes
    /// end-of-sequence instead of stalling.
    pub fn close(&self) {
        {
            let mut state = lock_state(&self.inner);
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.inner.notify.notify_waiters();
    }

    /// Take the single-use consumer. A second take fails loudly: it signals a
    /// consumer/producer wiring bug upstream.
    pub fn take_consumer(&self) -> Result<EventConsumer, ChannelError> {
        let mut state = lock_state(&self.inner);
        if state.consumer_taken {
            return Err(ChannelError::ConsumerTaken);
        }
        state.consumer_taken = true;
        Ok(EventConsumer {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Count of events evicted by backpressure so far.
    pub fn dropped(&self) -> u64 {
        lock_state(&self.inner).dropped
    }
}

impl Default for EventChannel {
    /// Channel with [`DEFAULT_EVENT_CAPACITY`].
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

/// Consuming end of an [`EventChannel`], yielding items in push order.
#[derive(Debug)]
pub struct EventConsumer {
    inner: Arc<ChannelInner>,
}

impl EventConsumer {
    /// Next event in push order, or `None` after close with an empty buffer.
    ///
    /// Suspends cooperatively while the buffer is empty and the channel open.
    /// The notify permit is created before the empty-check so a push between
    /// check and await cannot be lost.
    pub async fn next(&mut self) -> Option<RuntimeEvent> {
        loop {
            let notified = self.inner.notify.notified();
            {
                let mut state = lock_state(&self.inner);
                if let Some(event) = state.buf.pop_front() {
                    return Some(event);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }
}

fn lock_state(inner: &ChannelInner) -> MutexGuard<'_, ChannelState> {
    match inner.state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
