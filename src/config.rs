//! Ambient configuration structs.
//!
//! The source tool hard-codes its tuning constants (`N_MULTI_WRITER_BLOCKS`,
//! `MULTI_WRITER_BLOCK_SIZE`, `MULTI_WRITER_WAIT`, ...) as C preprocessor
//! defines. Here they become plain `Default`-implementing structs so a
//! driver can load them from a config file without this crate depending on
//! one; `serde` is already part of the dependency stack (used elsewhere for
//! the variable-format descriptor table), so these simply derive it.

use serde::{Deserialize, Serialize};

/// Tuning knobs for [`crate::pool::MultiWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of pre-allocated blocks shared between empty-queue and work-queue.
    pub num_blocks: usize,
    /// Capacity, in bytes, of each block.
    pub block_size: usize,
    /// Milliseconds a push/pop waits before returning `TimedOut`.
    pub wait_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            num_blocks: 16,
            block_size: 4 * 1024 * 1024,
            wait_ms: 5,
        }
    }
}

/// Tuning knobs for [`crate::copy_machine::CopyMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    /// Ring size. Source tool uses 4 unconditionally (`spec.md` DESIGN NOTES (b)).
    pub num_blocks: usize,
    pub block_size: usize,
    pub wait_ms: u64,
}

impl Default for CopyConfig {
    fn default() -> Self {
        CopyConfig {
            num_blocks: 4,
            block_size: 1024 * 1024,
            wait_ms: 5,
        }
    }
}

/// Tuning knobs for [`crate::lookup::index::IndexWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// How many keys separate adjacent samples.
    pub frequency: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig { frequency: 100 }
    }
}
