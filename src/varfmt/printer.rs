//! Render sinks for compiled templates (`spec.md` §4.4 render contract).
//!
//! Two sinks mirror the source tool's two destinations: a lazily-created
//! file per stream id (`vfmt_print_to_file` plus the per-stream file
//! management sketched in `temp_registry.c`), and a shared multi-writer
//! pool where a full block is submitted and a fresh one acquired mid-
//! record if necessary.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use buffer_redux::BufWriter;

use crate::block::Block;
use crate::error::{Error, Result};
use crate::pool::BlockPool;
use crate::registry::TempRegistry;
use crate::varfmt::template::{Element, Template};

/// Arguments handed to [`render`] for one record. Indices match the
/// descriptor table (`spec.md` §4.4).
pub struct RenderArgs<'a> {
    pub strings: &'a [&'a [u8]],
    pub ints: &'a [u64],
}

/// Renders `template` against `args` into `buf`, growing `buf` first if
/// needed. `buf` is cleared and reused across calls by the caller.
pub fn render(template: &Template, args: &RenderArgs<'_>, buf: &mut Vec<u8>) {
    let needed = required_size(template, args);
    buf.clear();
    buf.reserve(needed);

    for element in &template.elements {
        match element {
            Element::Literal(s) => buf.extend_from_slice(s.as_bytes()),
            Element::Int { index } => {
                if let Some(v) = args.ints.get(*index as usize) {
                    write_int(buf, *v);
                }
            }
            Element::Str { index, fallback } => {
                let primary = args.strings.get(*index as usize).copied();
                match (primary, fallback) {
                    (Some(s), _) if !s.is_empty() => buf.extend_from_slice(s),
                    (Some(_), Some(fallback_idx)) | (None, Some(fallback_idx)) => {
                        if let Some(v) = args.ints.get(*fallback_idx as usize) {
                            write_int(buf, *v);
                        }
                    }
                    (Some(s), None) => buf.extend_from_slice(s),
                    (None, None) => {}
                }
            }
        }
    }
}

fn required_size(template: &Template, args: &RenderArgs<'_>) -> usize {
    let mut size = template.fixed_len;
    for element in &template.elements {
        if let Element::Str { index, .. } = element {
            if let Some(s) = args.strings.get(*index as usize) {
                size += s.len();
            }
        }
    }
    size
}

fn write_int(buf: &mut Vec<u8>, value: u64) {
    let mut tmp = [0u8; 20];
    let mut i = tmp.len();
    if value == 0 {
        buf.push(b'0');
        return;
    }
    let mut v = value;
    while v > 0 {
        i -= 1;
        tmp[i] = b'0' + (v % 10) as u8;
        v /= 10;
    }
    buf.extend_from_slice(&tmp[i..]);
}

/// One file per stream id, created on first use and registered with a
/// [`TempRegistry`] (`spec.md` §4.4 "File-per-stream").
pub struct FilePrinter {
    base_path: PathBuf,
    registry: TempRegistry,
    files: HashMap<u64, (BufWriter<std::fs::File>, u64)>,
    scratch: Vec<u8>,
}

impl FilePrinter {
    pub fn new(base_path: impl Into<PathBuf>, registry: TempRegistry) -> Self {
        FilePrinter {
            base_path: base_path.into(),
            registry,
            files: HashMap::new(),
            scratch: Vec::with_capacity(4096),
        }
    }

    /// Renders `template(args)` and appends it to the stream-id file,
    /// creating and registering the file on first use.
    pub fn print(&mut self, stream_id: u64, template: &Template, args: &RenderArgs<'_>) -> Result<()> {
        render(template, args, &mut self.scratch);
        let bytes = std::mem::take(&mut self.scratch);
        let result = self.write_bytes(stream_id, &bytes);
        self.scratch = bytes;
        self.scratch.clear();
        result
    }

    fn write_bytes(&mut self, stream_id: u64, bytes: &[u8]) -> Result<()> {
        if !self.files.contains_key(&stream_id) {
            let path = stream_path(&self.base_path, stream_id);
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path)?;
            self.registry.register(stream_id, path);
            self.files.insert(stream_id, (BufWriter::new(file), 0));
        }
        let (writer, _pos) = self.files.get_mut(&stream_id).expect("just inserted");
        writer.write_all(bytes)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        for (writer, _) in self.files.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

fn stream_path(base: &Path, stream_id: u64) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(format!(".{stream_id}"));
    PathBuf::from(s)
}

/// Renders into whatever block the shared [`BlockPool`] currently has
/// held, submitting and re-acquiring on overflow (`spec.md` §4.4 "Shared
/// multi-writer").
pub struct SharedPrinter {
    pool: BlockPool,
    current: Option<Block>,
    scratch: Vec<u8>,
}

impl SharedPrinter {
    pub fn new(pool: BlockPool) -> Self {
        SharedPrinter { pool, current: None, scratch: Vec::with_capacity(4096) }
    }

    /// Renders `template(args)` and appends the bytes to the currently
    /// held block, rotating blocks as needed. Expands a freshly acquired
    /// block to fit an oversized record, retrying exactly once.
    pub fn print(&mut self, template: &Template, args: &RenderArgs<'_>) -> Result<()> {
        render(template, args, &mut self.scratch);
        let record_len = self.scratch.len();

        if self.current.is_none() {
            self.current = Some(self.pool.acquire()?);
        }

        if !self.append_current(record_len)? {
            let block = self.current.take().expect("checked above");
            self.pool.submit(block);
            let mut fresh = self.pool.acquire()?;
            if !self.pool.append(&mut fresh, &self.scratch) {
                if !fresh.expand(record_len + 1) {
                    return Err(Error::fatal("record exceeds maximum block size"));
                }
                if !self.pool.append(&mut fresh, &self.scratch) {
                    return Err(Error::fatal("record still does not fit after expand"));
                }
            }
            self.current = Some(fresh);
        }
        Ok(())
    }

    fn append_current(&mut self, _record_len: usize) -> Result<bool> {
        let block = self.current.as_mut().expect("acquired above");
        Ok(self.pool.append(block, &self.scratch))
    }

    /// Submits whatever block is currently held, even if only partially
    /// filled. Call once at stream end.
    pub fn finish(mut self) {
        if let Some(block) = self.current.take() {
            if !block.is_empty() {
                self.pool.submit(block);
            }
        }
    }
}
