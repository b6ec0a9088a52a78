//! Block pool and multi-writer thread (`spec.md` §4.2).
//!
//! Grounded directly on `tools/external/fasterq-dump/multi_writer.c`: two
//! bounded queues (`empty_q`, `write_q`) move `N` pre-allocated blocks
//! between producer threads and a single writer thread. The writer thread
//! is the sole caller of [`Sink::write_at`]; on a write failure it still
//! returns the block to the empty-queue, then seals it, poisoning every
//! producer's next `acquire()`.

use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use crate::block::Block;
use crate::cancel::CancelToken;
use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::queue::{BoundedQueue, PopOutcome};
use crate::sink::Sink;

/// Producer-facing handle to a [`MultiWriter`]'s block pool. Cheaply
/// cloned; every clone shares the same empty-queue/work-queue pair.
#[derive(Clone)]
pub struct BlockPool {
    empty_q: BoundedQueue<Block>,
    work_q: BoundedQueue<Block>,
    wait: Duration,
    cancel: CancelToken,
}

impl BlockPool {
    /// Blocks until a free block is available. Fails with
    /// `ErrorKind::PipelineClosed` once the writer has poisoned the pool
    /// (typically after a disk-full write failure), or `ErrorKind::Cancelled`
    /// once the process-wide quit flag is observed set (`spec.md` §5).
    pub fn acquire(&self) -> Result<Block> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::cancelled());
            }
            match self.empty_q.pop(self.wait) {
                PopOutcome::Delivered(block) => return Ok(block),
                PopOutcome::TimedOut => continue,
                PopOutcome::Closed => return Err(Error::pipeline_closed()),
            }
        }
    }

    /// Appends `data` to `block` if it fits (strict `<`, one byte of
    /// headroom kept; `spec.md` Open Question (a)).
    pub fn append(&self, block: &mut Block, data: &[u8]) -> bool {
        block.append(data)
    }

    /// Reallocates `block`'s buffer to `size` bytes, discarding its
    /// contents. Legal only on a freshly acquired block.
    pub fn expand(&self, block: &mut Block, size: usize) -> bool {
        block.expand(size)
    }

    /// Hands `block` to the writer, retrying indefinitely on `TimedOut`.
    pub fn submit(&self, block: Block) {
        self.work_q.push_retrying(block, self.wait);
    }
}

/// Owns the sink, the two bounded queues, and the single writer thread
/// draining `work_q` into the sink.
pub struct MultiWriter {
    pool: BlockPool,
    writer_thread: Option<JoinHandle<Result<()>>>,
}

impl MultiWriter {
    /// Opens `sink`, pre-fills the empty-queue with `config.num_blocks`
    /// zeroed blocks of `config.block_size` bytes, and starts the writer
    /// thread. Use [`MultiWriter::with_cancel`] to wire in a process-wide
    /// quit flag; a writer built with `new` never observes cancellation.
    pub fn new(sink: Box<dyn Sink>, config: PoolConfig) -> Self {
        Self::with_cancel(sink, config, CancelToken::new())
    }

    /// Like [`MultiWriter::new`], but the writer thread polls `cancel`
    /// once per loop iteration and exits with `ErrorKind::Cancelled` when
    /// it observes the flag set (`spec.md` §5, §9).
    pub fn with_cancel(sink: Box<dyn Sink>, config: PoolConfig, cancel: CancelToken) -> Self {
        let wait = Duration::from_millis(config.wait_ms.max(1));
        let empty_q = BoundedQueue::new(config.num_blocks);
        let work_q = BoundedQueue::new(config.num_blocks);

        for _ in 0..config.num_blocks {
            empty_q.push_retrying(Block::new(config.block_size), wait);
        }

        let pool = BlockPool {
            empty_q: empty_q.clone(),
            work_q: work_q.clone(),
            wait,
            cancel: cancel.clone(),
        };

        let writer_thread =
            std::thread::spawn(move || writer_loop(sink, work_q, empty_q, wait, cancel));

        MultiWriter {
            pool,
            writer_thread: Some(writer_thread),
        }
    }

    /// Returns a cloneable handle producers use to acquire/append/submit
    /// blocks.
    pub fn pool(&self) -> BlockPool {
        self.pool.clone()
    }

    /// Seals the work-queue, joins the writer thread, and drains both
    /// queues so no block buffer is leaked. Returns the writer's first
    /// error, if any.
    pub fn shutdown(mut self) -> Result<()> {
        self.pool.work_q.seal();
        let result = match self.writer_thread.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| Err(Error::fatal("writer thread panicked"))),
            None => Ok(()),
        };
        self.pool.empty_q.drain();
        self.pool.work_q.drain();
        result
    }
}

impl Drop for MultiWriter {
    fn drop(&mut self) {
        if let Some(handle) = self.writer_thread.take() {
            self.pool.work_q.seal();
            let _ = handle.join();
            self.pool.empty_q.drain();
            self.pool.work_q.drain();
        }
    }
}

fn writer_loop(
    mut sink: Box<dyn Sink>,
    work_q: BoundedQueue<Block>,
    empty_q: BoundedQueue<Block>,
    wait: Duration,
    cancel: CancelToken,
) -> Result<()> {
    let mut pos: u64 = 0;
    let result = loop {
        if cancel.is_cancelled() {
            break Err(Error::cancelled());
        }
        match work_q.pop(wait) {
            PopOutcome::Delivered(mut block) => {
                if !block.is_empty() {
                    match sink.write_at(pos, block.as_slice()) {
                        Ok(n) => pos += n as u64,
                        Err(e) => {
                            debug!(error = %e, "writer thread: sink write failed, poisoning pool");
                            block.clear();
                            empty_q.push_retrying(block, wait);
                            empty_q.seal();
                            break Err(Error::from(e));
                        }
                    }
                }
                block.clear();
                empty_q.push_retrying(block, wait);
            }
            PopOutcome::TimedOut => continue,
            PopOutcome::Closed => break Ok(()),
        }
    };
    if let Err(e) = sink.flush() {
        warn!(error = %e, "writer thread: flush failed at teardown");
        if result.is_ok() {
            return Err(Error::from(e));
        }
    }
    result
}
