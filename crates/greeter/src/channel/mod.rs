//! Bounded, closable, multi-producer multi-consumer FIFO channel.
//!
//! This module provides the queue primitive the dispatcher is built on. Both
//! the job queue and the result collector are instances of [`channel`].
//!
//! Unlike [`tokio::sync::mpsc`], receivers are cloneable and compete for items:
//! each item is delivered to exactly one receiver. Closing is an explicit,
//! one-time operation on a [`Sender`] and is observed by every receiver once
//! the buffer has been drained. Dropping handles never closes the channel.
//!
//! Misuse is treated as a programming error:
//! - [`Sender::send`] on a closed channel panics.
//! - A second [`Sender::close`] panics.
//!
//! [`Sender::try_send`] is the non-panicking escape hatch and reports a closed
//! channel as [`TrySendError::Closed`].

mod error;

pub use error::TrySendError;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

/// Creates a bounded channel holding at most `capacity` buffered items.
///
/// A `capacity` of zero is treated as one.
pub fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            buffer: VecDeque::with_capacity(capacity),
            closed: false,
        }),
        capacity,
        item_ready: Notify::new(),
        slot_ready: Notify::new(),
    });

    (
        Sender {
            shared: Arc::clone(&shared),
        },
        Receiver { shared },
    )
}

struct Shared<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    /// Signalled when an item is pushed, or broadcast on close.
    item_ready: Notify,
    /// Signalled when an item is popped, or broadcast on close.
    slot_ready: Notify,
}

struct State<T> {
    buffer: VecDeque<T>,
    closed: bool,
}

impl<T> Shared<T> {
    fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// The sending half of a [`channel`].
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Sender<T> {
    /// Pushes `item`, waiting while the buffer is full.
    ///
    /// # Panics
    ///
    /// Panics if the channel is closed, either before the call or while the
    /// call is waiting for a free slot.
    pub async fn send(&self, item: T) {
        let mut item = item;
        loop {
            let notified = self.shared.slot_ready.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a pop or close between the
            // check and the await is not missed.
            notified.as_mut().enable();

            match self.try_send(item) {
                Ok(()) => return,
                Err(TrySendError::Closed(_)) => panic!("send on closed channel"),
                Err(TrySendError::Full(rejected)) => item = rejected,
            }

            notified.await;
        }
    }

    /// Pushes `item` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`TrySendError::Closed`] if the channel has been closed, or
    /// [`TrySendError::Full`] if the buffer is at capacity.
    pub fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(TrySendError::Closed(item));
            }
            if state.buffer.len() >= self.shared.capacity {
                return Err(TrySendError::Full(item));
            }
            state.buffer.push_back(item);
        }
        self.shared.item_ready.notify_one();
        Ok(())
    }

    /// Closes the channel.
    ///
    /// Buffered items remain available; once they are drained every receiver
    /// observes end-of-stream.
    ///
    /// # Panics
    ///
    /// Panics if the channel was already closed.
    pub fn close(&self) {
        {
            let mut state = self.shared.state.lock();
            assert!(!state.closed, "close of closed channel");
            state.closed = true;
        }
        self.shared.item_ready.notify_waiters();
        self.shared.slot_ready.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

/// The receiving half of a [`channel`].
///
/// Clones compete for items; each item is handed to exactly one receiver.
pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Receiver<T> {
    /// Takes the next item, waiting while the channel is empty and open.
    ///
    /// Returns `None` once the channel is closed and drained.
    pub async fn recv(&self) -> Option<T> {
        loop {
            let notified = self.shared.item_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.shared.state.lock();
                if let Some(item) = state.buffer.pop_front() {
                    let more = !state.buffer.is_empty();
                    drop(state);

                    self.shared.slot_ready.notify_one();
                    // Pass the baton so a leftover item never sits behind a
                    // wakeup that was consumed by a receiver that lost the race.
                    if more {
                        self.shared.item_ready.notify_one();
                    }
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
