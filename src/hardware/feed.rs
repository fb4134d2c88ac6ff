//! Bounded hand-off between the receiver's producer context and `process()`
//!
//! The producer side (a UART interrupt, a reader thread) pushes decoded
//! events without ever blocking. When the buffer is full the event is dropped
//! and counted. The consumer side is drained by the driver from the
//! cooperative `process()` loop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;

use thiserror::Error;

use crate::core::Fix;
use crate::hardware::DriverEvent;

/// Errors returned to the producer side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Buffer full; the event was dropped
    #[error("event buffer full, event dropped")]
    Full,
    /// Consumer side no longer exists
    #[error("event feed closed")]
    Closed,
}

/// Create a bounded event feed. A capacity of zero is treated as one.
pub fn event_feed(capacity: usize) -> (EventProducer, EventFeed) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    let dropped = Arc::new(AtomicUsize::new(0));

    let producer = EventProducer {
        tx,
        dropped: Arc::clone(&dropped),
    };
    let feed = EventFeed {
        rx,
        dropped,
        reported_drops: 0,
    };
    (producer, feed)
}

/// Producer handle; cheap to clone and safe to move to another thread
#[derive(Debug, Clone)]
pub struct EventProducer {
    tx: SyncSender<DriverEvent>,
    dropped: Arc<AtomicUsize>,
}

impl EventProducer {
    /// Enqueue an event without blocking
    pub fn push(&self, event: DriverEvent) -> Result<(), FeedError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(FeedError::Full)
            }
            Err(TrySendError::Disconnected(_)) => Err(FeedError::Closed),
        }
    }

    pub fn push_fix(&self, fix: Fix) -> Result<(), FeedError> {
        self.push(DriverEvent::Fix(fix))
    }

    /// Total events dropped because the buffer was full
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer end of the feed
#[derive(Debug)]
pub struct EventFeed {
    rx: Receiver<DriverEvent>,
    dropped: Arc<AtomicUsize>,
    reported_drops: usize,
}

impl EventFeed {
    /// Next pending event, if any
    pub fn try_next(&mut self) -> Option<DriverEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Discard everything pending; returns how many events were discarded
    pub fn clear(&mut self) -> usize {
        let mut discarded = 0;
        while self.try_next().is_some() {
            discarded += 1;
        }
        discarded
    }

    /// Drops that happened since the last call
    pub fn take_new_drops(&mut self) -> usize {
        let total = self.dropped.load(Ordering::Relaxed);
        let new_drops = total.saturating_sub(self.reported_drops);
        self.reported_drops = total;
        new_drops
    }
}
