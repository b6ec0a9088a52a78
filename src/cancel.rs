//! Process-wide cancellation flag (`spec.md` §5, §9).
//!
//! A single atomic counter, shared by clone, polled at the top of every
//! long-running loop (writer thread, copy-machine, concatenation threads).
//! There is no per-operation cancel token; setting the flag once cancels
//! everything that holds a clone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicU64>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicU64::new(0)))
    }

    /// Sets the flag. Idempotent; safe to call from any thread.
    pub fn cancel(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst) != 0
    }
}
