//! Shared byte-count progress counter (`spec.md` §4.5 step 1, §4.3).
//!
//! Progress-bar rendering itself is an external collaborator (`spec.md`
//! §1 Non-goals); what the copy machine and the registry's concatenation
//! threads own is the raw counter a driver's progress bar would poll.
//! Modeled the same way as [`crate::cancel::CancelToken`]: a clonable
//! handle around a single atomic, safe to share across the writer thread
//! and however many concatenation threads are running concurrently.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Progress(Arc<AtomicU64>);

impl Progress {
    pub fn new() -> Self {
        Progress(Arc::new(AtomicU64::new(0)))
    }

    /// Adds `n` bytes to the counter. Called by writer/concatenation
    /// threads as each chunk is successfully written.
    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    /// Total bytes accounted for so far.
    pub fn bytes_done(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_across_clones() {
        let p = Progress::new();
        let q = p.clone();
        p.add(10);
        q.add(5);
        assert_eq!(p.bytes_done(), 15);
    }
}
