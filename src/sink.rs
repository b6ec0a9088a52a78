//! Output sink abstraction for the writer thread (`spec.md` §4.2).
//!
//! The source tool branches on `NULL != self->f` to decide between writing
//! at a tracked file position and writing text to stdout. `Sink` turns that
//! branch into a trait so the writer loop itself stays sink-agnostic.

use std::fs::{File, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::Path;

use buffer_redux::BufWriter;

/// Where a [`crate::pool::MultiWriter`] or [`crate::copy_machine::CopyMachine`]
/// delivers drained blocks.
pub trait Sink: Send {
    /// Writes `buf` and returns the number of bytes written. For file sinks
    /// this is a positioned write at `pos`; for stdout `pos` is ignored.
    fn write_at(&mut self, pos: u64, buf: &[u8]) -> io::Result<usize>;

    /// Flushes any internal buffering. Called once at teardown.
    fn flush(&mut self) -> io::Result<()>;
}

/// A buffered file sink, truncating and creating with mode 0664 like the
/// source tool's `KDirectoryCreateFile(..., kcmInit, ...)`.
pub struct FileSink {
    inner: BufWriter<File>,
}

impl FileSink {
    pub fn create(path: impl AsRef<Path>, buf_size: usize) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o664))?;
        }
        Ok(FileSink {
            inner: BufWriter::with_capacity(buf_size.max(1), file),
        })
    }
}

impl Sink for FileSink {
    fn write_at(&mut self, _pos: u64, buf: &[u8]) -> io::Result<usize> {
        self.inner.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Writes rendered text verbatim to the process's standard output,
/// ignoring the tracked position (the source tool's `KOutMsg("%.*s", ...)`
/// branch).
pub struct StdoutSink {
    inner: Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        StdoutSink { inner: io::stdout() }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for StdoutSink {
    fn write_at(&mut self, _pos: u64, buf: &[u8]) -> io::Result<usize> {
        let mut handle = self.inner.lock();
        handle.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}
