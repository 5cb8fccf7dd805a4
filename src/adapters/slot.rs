//! Latest-value slot between a reader thread and the tick loop.
//!
//! ```text
//!   capture thread                      tick thread
//!   SlotPublisher::publish ──▶ [ Option<T> ] ──▶ LatestSlot::read_latest
//!                               (overwrite)        (take)
//! ```
//!
//! The publisher overwrites whatever is in the slot; the poller takes it.
//! A sample is therefore delivered at most once, and a slow poller only
//! ever sees the newest value.  The lock is held for a single move on
//! either side, so `read_latest` never waits on a capture.

use std::sync::{Arc, Mutex, PoisonError};

use crate::app::ports::SamplePort;

/// Producer half, owned by a reader thread.
pub struct SlotPublisher<T> {
    slot: Arc<Mutex<Option<T>>>,
}

/// Consumer half, polled by the acquisition loop.
pub struct LatestSlot<T> {
    slot: Arc<Mutex<Option<T>>>,
}

/// Create a connected publisher/poller pair.
pub fn latest_slot<T>() -> (SlotPublisher<T>, LatestSlot<T>) {
    let slot = Arc::new(Mutex::new(None));
    (
        SlotPublisher {
            slot: Arc::clone(&slot),
        },
        LatestSlot { slot },
    )
}

impl<T> SlotPublisher<T> {
    pub fn publish(&self, sample: T) {
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(sample);
    }
}

impl<T> Clone for SlotPublisher<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> SamplePort for LatestSlot<T> {
    type Sample = T;

    fn read_latest(&mut self) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
