//! End-to-end scenarios 1-3 from `spec.md` §8, exercised through the
//! public API against a real file sink rather than the in-process
//! `VecSink` the unit tests in `src/pool.rs` use.

use std::fs;

use fasterq_core::config::PoolConfig;
use fasterq_core::error::ErrorKind;
use fasterq_core::pool::MultiWriter;
use fasterq_core::sink::FileSink;

/// Scenario 1: one producer submits blocks of sizes [64, 0, 128]; the
/// empty block is a no-op and the sink ends up with exactly their sum.
#[test]
fn single_producer_single_writer_to_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bin");

    let sink = FileSink::create(&path, 4096).unwrap();
    let writer = MultiWriter::new(Box::new(sink), PoolConfig { num_blocks: 3, block_size: 256, wait_ms: 5 });
    let pool = writer.pool();

    for size in [64usize, 0, 128] {
        let mut block = pool.acquire().unwrap();
        if size > 0 {
            pool.append(&mut block, &vec![b'x'; size]);
        }
        pool.submit(block);
    }
    writer.shutdown().unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 192);
}

/// Scenario 2: two producers hammer a 2-block pool with 100 64-byte
/// blocks each; total sink length is exactly 12_800 and every push either
/// succeeds or is retried (no data silently dropped under backpressure).
/// Blocks are sized 65, one byte over the payload: `Block::append` keeps
/// a byte of headroom (strict `<`, Open Question (a)), so a
/// capacity-64 block could never actually hold a 64-byte payload.
#[test]
fn two_producers_backpressure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bin");

    let sink = FileSink::create(&path, 4096).unwrap();
    let writer = MultiWriter::new(Box::new(sink), PoolConfig { num_blocks: 2, block_size: 65, wait_ms: 5 });
    let pool = writer.pool();

    let producer = |pool: fasterq_core::pool::BlockPool| {
        for _ in 0..100 {
            let mut block = pool.acquire().unwrap();
            pool.append(&mut block, &[b'y'; 64]);
            pool.submit(block);
        }
    };

    let pool_a = pool.clone();
    let pool_b = pool.clone();
    let t1 = std::thread::spawn(move || producer(pool_a));
    let t2 = std::thread::spawn(move || producer(pool_b));
    t1.join().unwrap();
    t2.join().unwrap();

    writer.shutdown().unwrap();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 12_800);
}

/// Scenario 3: a sink with a fixed quota fails partway through; the next
/// `acquire()` observes `PipelineClosed` rather than silently succeeding.
#[test]
fn writer_failure_poisons_pool_end_to_end() {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct QuotaSink {
        written: Arc<AtomicUsize>,
        quota: usize,
    }

    impl fasterq_core::sink::Sink for QuotaSink {
        fn write_at(&mut self, _pos: u64, buf: &[u8]) -> io::Result<usize> {
            let already = self.written.load(Ordering::SeqCst);
            if already + buf.len() > self.quota {
                return Err(io::Error::new(io::ErrorKind::Other, "quota exceeded"));
            }
            self.written.fetch_add(buf.len(), Ordering::SeqCst);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let written = Arc::new(AtomicUsize::new(0));
    let writer = MultiWriter::new(
        Box::new(QuotaSink { written: written.clone(), quota: 80 }),
        PoolConfig { num_blocks: 2, block_size: 256, wait_ms: 5 },
    );
    let pool = writer.pool();

    let mut b1 = pool.acquire().unwrap();
    pool.append(&mut b1, &[b'x'; 64]);
    pool.submit(b1);

    let mut b2 = pool.acquire().unwrap();
    pool.append(&mut b2, &[b'y'; 64]);
    pool.submit(b2);

    std::thread::sleep(std::time::Duration::from_millis(50));

    match pool.acquire() {
        Err(e) => assert!(matches!(e.kind(), ErrorKind::PipelineClosed)),
        Ok(_) => panic!("expected the pool to be poisoned after a write failure"),
    }
    assert_eq!(written.load(Ordering::SeqCst), 64);
}
