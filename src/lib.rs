//! A parallel, backpressured extraction pipeline core: a bounded block
//! pool feeding a single writer, an N-files-to-one-file copy machine, a
//! variable-format defline printer, a temp-segment registry with a
//! parallel concatenator, and a packed 2-bit lookup store with a 2na
//! k-mer search compiler.
//!
//! This crate supplies the *core* primitives an extraction driver
//! composes; it does not itself know about any particular sequence
//! archive format, database, or CLI.
//!
//! # Module overview
//!
//! * [`queue`] — bounded MPMC queue with timed push/pop and one-way seal.
//! * [`block`] — fixed-capacity byte buffer loaned by a [`pool::BlockPool`].
//! * [`pool`] — N-block reservoir plus the single writer thread draining it.
//! * [`copy_machine`] — pipelined N-files-to-one-file concatenating copy.
//! * [`varfmt`] — compiled defline templates and their render sinks.
//! * [`registry`] — temp-segment bookkeeping and parallel flush-to-files.
//! * [`lookup`] — packed 2-bit sequence store, sparse index, reader/writer.
//! * [`search`] — 2na k-mer query grammar, automaton, and scan handle.
//! * [`cancel`] — the process-wide cooperative cancellation flag.
//! * [`progress`] — the shared byte-count progress counter.
//! * [`config`] — `serde`-backed tuning knobs for the above.
//! * [`error`] — the crate's flat error taxonomy.
//!
//! # Example: bounded block pool feeding a file sink
//!
//! ```no_run
//! use fasterq_core::config::PoolConfig;
//! use fasterq_core::pool::MultiWriter;
//! use fasterq_core::sink::FileSink;
//!
//! let sink = Box::new(FileSink::create("out.bin", 64 * 1024).unwrap());
//! let writer = MultiWriter::new(sink, PoolConfig::default());
//! let pool = writer.pool();
//!
//! let mut block = pool.acquire().unwrap();
//! pool.append(&mut block, b"hello");
//! pool.submit(block);
//!
//! writer.shutdown().unwrap();
//! ```

pub mod block;
pub mod cancel;
pub mod config;
pub mod copy_machine;
pub mod error;
pub mod lookup;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod registry;
pub mod search;
pub mod sink;
pub mod varfmt;

pub use error::{Error, ErrorKind, Result};
