//! N-files-to-one-sink pipelined copy (`spec.md` §4.3).
//!
//! Grounded on `copy_machine.c`'s `make_a_copy()`: the calling thread reads
//! each source file in turn straight into ring blocks and pushes them to a
//! writer thread; a source is deleted only once it has been fully read onto
//! the write queue. Ring size defaults to 4 (`spec.md` Open Question (b),
//! matching `N_COPY_MACHINE_BLOCKS`).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use crate::block::Block;
use crate::cancel::CancelToken;
use crate::config::CopyConfig;
use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::queue::{BoundedQueue, PopOutcome};
use crate::sink::Sink;

/// Copies `sources`, in order, into `sink`, deleting each source after it
/// has been fully queued for writing. Returns the first error encountered,
/// which may originate from either the reader side (this thread) or the
/// writer thread.
pub fn copy_files(sources: &[PathBuf], sink: Box<dyn Sink>, config: CopyConfig) -> Result<()> {
    copy_files_with(sources, sink, config, CancelToken::new(), Progress::new())
}

/// Like [`copy_files`], but polls `cancel` once per loop iteration
/// (`spec.md` §5, §9) and accumulates every byte written into `progress`
/// so a caller can report copy progress without this crate rendering one
/// itself (`spec.md` §1 Non-goals).
pub fn copy_files_with(
    sources: &[PathBuf],
    sink: Box<dyn Sink>,
    config: CopyConfig,
    cancel: CancelToken,
    progress: Progress,
) -> Result<()> {
    let wait = Duration::from_millis(config.wait_ms.max(1));
    let empty_q: BoundedQueue<Block> = BoundedQueue::new(config.num_blocks);
    let write_q: BoundedQueue<Block> = BoundedQueue::new(config.num_blocks);

    for _ in 0..config.num_blocks {
        empty_q.push_retrying(Block::new(config.block_size), wait);
    }

    let writer_empty_q = empty_q.clone();
    let writer_write_q = write_q.clone();
    let writer_cancel = cancel.clone();
    let writer_progress = progress.clone();
    let writer_thread: JoinHandle<Result<()>> = std::thread::spawn(move || {
        copy_writer_loop(sink, writer_write_q, writer_empty_q, wait, writer_cancel, writer_progress)
    });

    let read_result = read_sources(sources, &empty_q, &write_q, wait, config.block_size, &cancel);
    write_q.seal();

    let write_result = writer_thread
        .join()
        .unwrap_or_else(|_| Err(Error::fatal("copy writer thread panicked")));

    empty_q.drain();
    write_q.drain();

    read_result.and(write_result)
}

fn read_sources(
    sources: &[PathBuf],
    empty_q: &BoundedQueue<Block>,
    write_q: &BoundedQueue<Block>,
    wait: Duration,
    block_size: usize,
    cancel: &CancelToken,
) -> Result<()> {
    for path in sources {
        if cancel.is_cancelled() {
            return Err(Error::cancelled());
        }
        copy_one_file(path, empty_q, write_q, wait, block_size, cancel)?;
        std::fs::remove_file(path)?;
        debug!(path = %path.display(), "copy_machine: removed source after copy");
    }
    Ok(())
}

fn copy_one_file(
    path: &Path,
    empty_q: &BoundedQueue<Block>,
    write_q: &BoundedQueue<Block>,
    wait: Duration,
    block_size: usize,
    cancel: &CancelToken,
) -> Result<()> {
    let mut file = File::open(path)?;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::cancelled());
        }
        let mut block = match empty_q.pop(wait) {
            PopOutcome::Delivered(block) => block,
            PopOutcome::TimedOut => continue,
            PopOutcome::Closed => {
                warn!("copy_machine: empty queue sealed mid-copy, writer must have failed");
                return Err(Error::space_exhausted());
            }
        };

        let buf = block.as_mut_buf();
        let want = block_size.min(buf.len());
        let n = file.read(&mut buf[..want])?;
        if n == 0 {
            block.set_len(0);
            empty_q.push_retrying(block, wait);
            return Ok(());
        }
        block.set_len(n);
        write_q.push_retrying(block, wait);
    }
}

fn copy_writer_loop(
    mut sink: Box<dyn Sink>,
    write_q: BoundedQueue<Block>,
    empty_q: BoundedQueue<Block>,
    wait: Duration,
    cancel: CancelToken,
    progress: Progress,
) -> Result<()> {
    let mut pos: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::cancelled());
        }
        match write_q.pop(wait) {
            PopOutcome::Delivered(mut block) => {
                let result = sink.write_at(pos, block.as_slice());
                block.clear();
                match result {
                    Ok(n) => {
                        pos += n as u64;
                        progress.add(n as u64);
                        empty_q.push_retrying(block, wait);
                    }
                    Err(e) => {
                        empty_q.push_retrying(block, wait);
                        empty_q.seal();
                        return Err(Error::from(e));
                    }
                }
            }
            PopOutcome::TimedOut => continue,
            PopOutcome::Closed => break,
        }
    }
    sink.flush().map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    struct VecSink(Arc<Mutex<Vec<u8>>>);

    impl Sink for VecSink {
        fn write_at(&mut self, _pos: u64, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Scenario 2 (`spec.md` §8): three source files concatenate in order
    /// and are removed after copy.
    #[test]
    fn concatenates_sources_in_order_and_deletes_them() {
        let dir = tempdir().unwrap();
        let mut paths = Vec::new();
        for (i, content) in [b"aaa".as_slice(), b"bb".as_slice(), b"c".as_slice()]
            .into_iter()
            .enumerate()
        {
            let path = dir.path().join(format!("part{i}"));
            std::fs::write(&path, content).unwrap();
            paths.push(path);
        }

        let buf = Arc::new(Mutex::new(Vec::new()));
        copy_files(
            &paths,
            Box::new(VecSink(buf.clone())),
            CopyConfig { num_blocks: 4, block_size: 16, wait_ms: 5 },
        )
        .unwrap();

        assert_eq!(&buf.lock().unwrap()[..], b"aaabbc");
        for path in &paths {
            assert!(!path.exists());
        }
    }

    #[test]
    fn empty_source_list_is_a_no_op() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        copy_files(
            &[],
            Box::new(VecSink(buf.clone())),
            CopyConfig::default(),
        )
        .unwrap();
        assert!(buf.lock().unwrap().is_empty());
    }
}
