//! Temporary-segment registry and concatenator (`spec.md` §4.5).
//!
//! Grounded on `temp_registry.c`: a mutex-guarded `stream_id -> paths`
//! map. Flushing spawns one thread per non-empty group to concatenate its
//! files (after a deterministic reorder) into the group's destination,
//! mirroring `temp_registry_merge`'s `on_merge`/`merge_thread_func`.
//! Thread spawning uses `crossbeam_utils::thread::scope`, the same
//! mechanism the teacher's own `parallel.rs` uses for worker threads.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use buffer_redux::{BufReader, BufWriter};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::progress::Progress;

/// Receives every path registered with a [`TempRegistry`], independent of
/// stream-id grouping, so a driver can wire cleanup-on-signal bookkeeping
/// without this crate depending on that mechanism.
pub trait CleanupSink: Send + Sync {
    fn track(&self, path: &Path);
}

/// A [`CleanupSink`] that does nothing, used when no external cleanup
/// bookkeeping is wired up.
pub struct NoopCleanup;

impl CleanupSink for NoopCleanup {
    fn track(&self, _path: &Path) {}
}

struct Inner {
    lists: BTreeMap<u64, Vec<PathBuf>>,
}

/// Groups temp-file paths by stream id and concatenates each group at
/// flush time. Cheap to clone; state lives behind an `Arc`-free `Mutex`
/// since the registry itself is always owned by a single driver.
pub struct TempRegistry {
    inner: Mutex<Inner>,
    cleanup: Box<dyn CleanupSink>,
}

impl TempRegistry {
    pub fn new(cleanup: Box<dyn CleanupSink>) -> Self {
        TempRegistry {
            inner: Mutex::new(Inner { lists: BTreeMap::new() }),
            cleanup,
        }
    }

    pub fn with_noop_cleanup() -> Self {
        Self::new(Box::new(NoopCleanup))
    }

    /// Registers `path` under `stream_id` and announces it to the
    /// cleanup collaborator.
    pub fn register(&self, stream_id: u64, path: impl Into<PathBuf>) {
        let path = path.into();
        self.cleanup.track(&path);
        let mut inner = self.inner.lock().expect("registry mutex poisoned");
        inner.lists.entry(stream_id).or_default().push(path);
    }

    /// Concatenates each non-empty stream-id group into its own
    /// destination file, one thread per group, joining all of them
    /// before returning. `spec.md` §4.5 flush-to-files protocol.
    pub fn flush_to_files(&self, output_base: &Path, force: bool, append: bool) -> Result<()> {
        self.flush_to_files_with(output_base, force, append, CancelToken::new(), Progress::new())
    }

    /// Like [`TempRegistry::flush_to_files`], but each concatenation
    /// thread polls `cancel` between sources (`spec.md` §5, §9) and adds
    /// every byte it copies to `progress`, so a caller can size a
    /// progress bar against [`TempRegistry::total_bytes`] without this
    /// crate rendering one itself (`spec.md` §1 Non-goals).
    pub fn flush_to_files_with(
        &self,
        output_base: &Path,
        force: bool,
        append: bool,
        cancel: CancelToken,
        progress: Progress,
    ) -> Result<()> {
        let groups = self.snapshot_sorted_groups();

        let result: Result<()> = crossbeam_utils::thread::scope(|scope| {
            let handles: Vec<_> = groups
                .into_iter()
                .map(|(stream_id, mut paths)| {
                    paths.sort();
                    let dest = group_destination(output_base, stream_id);
                    let cancel = cancel.clone();
                    let progress = progress.clone();
                    scope.spawn(move |_| concat_group(&dest, &paths, force, append, &cancel, &progress))
                })
                .collect();

            let mut first_err = None;
            for handle in handles {
                let outcome = handle.join().unwrap_or_else(|_| Err(Error::fatal("concat thread panicked")));
                if let Err(e) = outcome {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
            match first_err {
                Some(e) => Err(e),
                None => Ok(()),
            }
        })
        .unwrap_or_else(|_| Err(Error::fatal("concat scope panicked")));

        result
    }

    /// Streams every group's bytes to standard output, removing each
    /// source after it has been written. `spec.md` §4.5 flush-to-stdout
    /// protocol.
    pub fn flush_to_stdout(&self) -> Result<()> {
        self.flush_to_stdout_with(CancelToken::new(), Progress::new())
    }

    /// Like [`TempRegistry::flush_to_stdout`], polling `cancel` between
    /// sources and accumulating bytes written into `progress`.
    pub fn flush_to_stdout_with(&self, cancel: CancelToken, progress: Progress) -> Result<()> {
        let groups = self.snapshot_sorted_groups();
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for (_stream_id, mut paths) in groups {
            paths.sort();
            for path in paths {
                if cancel.is_cancelled() {
                    return Err(Error::cancelled());
                }
                let file = File::open(&path)?;
                let mut reader = BufReader::new(file);
                let n = io::copy(&mut reader, &mut handle)?;
                progress.add(n);
                std::fs::remove_file(&path)?;
            }
        }
        handle.flush()?;
        Ok(())
    }

    /// Sums the on-disk size of every registered path across all groups,
    /// the "compute total bytes across all groups (for progress)" step of
    /// `spec.md` §4.5's flush-to-files protocol. A driver calls this to
    /// size a progress bar before `flush_to_files_with` starts copying.
    pub fn total_bytes(&self) -> Result<u64> {
        let inner = self.inner.lock().expect("registry mutex poisoned");
        let mut total = 0u64;
        for paths in inner.lists.values() {
            for path in paths {
                total += path.metadata()?.len();
            }
        }
        Ok(total)
    }

    fn snapshot_sorted_groups(&self) -> Vec<(u64, Vec<PathBuf>)> {
        let inner = self.inner.lock().expect("registry mutex poisoned");
        inner
            .lists
            .iter()
            .filter(|(_, paths)| !paths.is_empty())
            .map(|(id, paths)| (*id, paths.clone()))
            .collect()
    }
}

/// Per-group destination name: `g == 0` uses the base name verbatim;
/// otherwise `_<g>` is inserted before the extension (defaulting to
/// `.fastq` when the base name has none), per `spec.md` §4.5 step 2.b.
fn group_destination(base: &Path, group: u64) -> PathBuf {
    if group == 0 {
        return base.to_path_buf();
    }
    let base_str = base.to_string_lossy();
    match base_str.rfind('.') {
        Some(dot) if base_str[dot..].len() > 1 && !base_str[..dot].ends_with('/') => {
            let (stem, ext) = base_str.split_at(dot);
            PathBuf::from(format!("{stem}_{group}{ext}"))
        }
        _ => PathBuf::from(format!("{base_str}_{group}.fastq")),
    }
}

fn concat_group(
    dest: &Path,
    sources: &[PathBuf],
    force: bool,
    append: bool,
    cancel: &CancelToken,
    progress: &Progress,
) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if append {
        options.append(true);
    } else {
        options.create(true).truncate(true);
    }
    if force {
        options.create(true);
    }
    let dst_file = options.create(true).open(dest)?;
    let mut writer = BufWriter::new(dst_file);

    for src_path in sources {
        if cancel.is_cancelled() {
            return Err(Error::cancelled());
        }
        let src = File::open(src_path)?;
        let mut reader = BufReader::new(src);
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n])?;
            progress.add(n as u64);
        }
        debug!(path = %src_path.display(), dest = %dest.display(), "registry: concatenated source into destination");
    }
    writer.flush()?;
    Ok(())
}
