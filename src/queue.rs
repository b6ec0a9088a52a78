//! Bounded FIFO with timed push/pop and a one-way seal (`spec.md` §4.1).
//!
//! Built on [`crossbeam_channel`]'s bounded MPMC channel, which already
//! gives FIFO ordering across concurrent senders and `send_timeout` /
//! `recv_timeout`. What it doesn't give us is a *sealed-but-still-open*
//! state distinguishable from a fully disconnected channel while producer
//! threads may still hold live `Sender` clones — so sealing is tracked with
//! a separate flag rather than by dropping senders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};

/// Outcome of a [`BoundedQueue::push`] that didn't time out. A timeout is
/// represented as `Err(item)` on `push` itself, since the channel hands the
/// item back — see [`BoundedQueue::push`].
#[derive(Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// The queue was sealed; no further push will succeed.
    Closed,
}

impl PushOutcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, PushOutcome::Closed)
    }
}

/// Outcome of a [`BoundedQueue::pop`].
pub enum PopOutcome<T> {
    Delivered(T),
    TimedOut,
    /// The queue is sealed *and* currently empty.
    Closed,
}

impl<T> PopOutcome<T> {
    pub fn is_closed(&self) -> bool {
        matches!(self, PopOutcome::Closed)
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, PopOutcome::TimedOut)
    }
}

/// A bounded FIFO of element count `capacity`, shared by clone across
/// producer and consumer threads.
pub struct BoundedQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    sealed: Arc<AtomicBool>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        BoundedQueue {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            sealed: self.sealed.clone(),
        }
    }
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        BoundedQueue {
            sender,
            receiver,
            sealed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pushes `item`, waiting at most `timeout` for a free slot. On
    /// `TimedOut` the item is handed back so the caller can retry it.
    pub fn push(&self, item: T, timeout: Duration) -> Result<PushOutcome, T> {
        if self.sealed.load(Ordering::Acquire) {
            return Ok(PushOutcome::Closed);
        }
        match self.sender.send_timeout(item, timeout) {
            Ok(()) => Ok(PushOutcome::Delivered),
            Err(SendTimeoutError::Timeout(item)) => Err(item),
            Err(SendTimeoutError::Disconnected(_)) => Ok(PushOutcome::Closed),
        }
    }

    /// Retries `push` on `TimedOut`, sleeping `timeout` between attempts,
    /// until it is either delivered or the queue closes. This is the
    /// "indefinite retry" policy `spec.md` §4.2 specifies for `submit()`.
    pub fn push_retrying(&self, mut item: T, timeout: Duration) -> PushOutcome {
        loop {
            match self.push(item, timeout) {
                Ok(outcome) => return outcome,
                Err(returned) => {
                    item = returned;
                    std::thread::sleep(timeout);
                }
            }
        }
    }

    /// Pops the next item, waiting at most `timeout`. Returns `Closed` iff
    /// the queue is sealed *and* currently empty.
    pub fn pop(&self, timeout: Duration) -> PopOutcome<T> {
        match self.receiver.recv_timeout(timeout) {
            Ok(item) => PopOutcome::Delivered(item),
            Err(RecvTimeoutError::Timeout) => {
                if self.sealed.load(Ordering::Acquire) && self.receiver.is_empty() {
                    PopOutcome::Closed
                } else {
                    PopOutcome::TimedOut
                }
            }
            Err(RecvTimeoutError::Disconnected) => PopOutcome::Closed,
        }
    }

    /// Marks the queue sealed. Idempotent. Does not drop the underlying
    /// sender/receiver, since other clones may still be live.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Drains remaining items without blocking, used at teardown to
    /// release loaned buffers still sitting in a queue.
    pub fn drain(&self) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(item) = self.receiver.try_recv() {
            out.push(item);
        }
        out
    }
}
