//! Sparse index writer/reader (`spec.md` §3, §4.6).
//!
//! Grounded on `index.c`: an 8-byte frequency header, then `(key, offset)`
//! pairs. The writer always emits `(1, 0)` first (`make_index_writer_obj`'s
//! unconditional `write_key_and_offset(w, 1, 0)`), then samples a new pair
//! only when the current key exceeds the last sampled key by strictly
//! more than the frequency. The reader pre-computes the maximum key by
//! reading the file's tail, exactly as `get_max_key` does.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use buffer_redux::BufWriter;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

const ENTRY_SIZE: u64 = 16;

/// Appends `(key, offset)` samples to a sparse index file.
pub struct IndexWriter {
    file: BufWriter<File>,
    pos: u64,
    frequency: u64,
    last_key: u64,
}

impl IndexWriter {
    pub fn create(path: impl AsRef<Path>, buf_size: usize, frequency: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        let mut writer = IndexWriter {
            file: BufWriter::with_capacity(buf_size.max(1), file),
            pos: 0,
            frequency,
            last_key: 0,
        };
        writer.write_value(frequency)?;
        writer.write_pair(1, 0)?;
        writer.last_key = 1;
        Ok(writer)
    }

    fn write_value(&mut self, value: u64) -> Result<()> {
        self.file.write_u64::<BigEndian>(value)?;
        self.pos += 8;
        Ok(())
    }

    fn write_pair(&mut self, key: u64, offset: u64) -> Result<()> {
        self.write_value(key)?;
        self.write_value(offset)?;
        Ok(())
    }

    /// Records `(key, offset)` only if `key > last_sampled_key +
    /// frequency` (strict, matching `write_key`'s `last_plus_freq` check).
    pub fn write_key(&mut self, key: u64, offset: u64) -> Result<()> {
        if key > self.last_key + self.frequency {
            self.write_pair(key, offset)?;
            self.last_key = key;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

/// Looks up the offset of the record at or before a key, either by
/// linear scan (small indexes) or binary search over on-disk entries.
pub struct IndexReader {
    file: File,
    frequency: u64,
    file_size: u64,
    max_key: u64,
}

impl IndexReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path.as_ref())?;
        let file_size = file.metadata()?.len();
        let frequency = read_u64_at(&mut file, 0)?;
        let max_key = compute_max_key(&mut file, file_size)?;
        Ok(IndexReader { file, frequency, file_size, max_key })
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn max_key(&self) -> u64 {
        self.max_key
    }

    fn entry_count(&self) -> u64 {
        (self.file_size - 8) / ENTRY_SIZE
    }

    fn read_entry(&mut self, idx: u64) -> Result<(u64, u64)> {
        let pos = 8 + idx * ENTRY_SIZE;
        let key = read_u64_at(&mut self.file, pos)?;
        let offset = read_u64_at(&mut self.file, pos + 8)?;
        Ok((key, offset))
    }

    /// Returns `(key_found, offset)` with `key_found <= key_to_find`,
    /// positioned at a sampled record. `no-such-key` if `key_to_find >
    /// max_key`. Linear scan for `<= 20` entries, binary search otherwise
    /// (`spec.md` §4.6).
    pub fn nearest_offset(&mut self, key_to_find: u64) -> Result<(u64, u64)> {
        let count = self.entry_count();
        if count == 0 {
            return Err(Error::no_such_key());
        }
        if key_to_find > self.max_key {
            return Err(Error::no_such_key());
        }
        if count <= 20 {
            self.nearest_offset_linear(key_to_find, count)
        } else {
            self.nearest_offset_binary(key_to_find, count)
        }
    }

    fn nearest_offset_linear(&mut self, key_to_find: u64, count: u64) -> Result<(u64, u64)> {
        let mut best: Option<(u64, u64)> = None;
        for idx in 0..count {
            let (key, offset) = self.read_entry(idx)?;
            if key <= key_to_find {
                best = Some((key, offset));
            } else {
                break;
            }
        }
        best.ok_or_else(Error::no_such_key)
    }

    fn nearest_offset_binary(&mut self, key_to_find: u64, count: u64) -> Result<(u64, u64)> {
        let mut lower = 0u64;
        let mut upper = count - 1;
        loop {
            let mid = lower + (upper - lower) / 2;
            let lo_entry = self.read_entry(mid)?;
            let hi_entry = self.read_entry((mid + 1).min(count - 1))?;
            let is_lower = key_to_find < lo_entry.0;
            let is_higher = key_to_find > hi_entry.0;
            if !is_lower && !is_higher {
                return if key_to_find == hi_entry.0 { Ok(hi_entry) } else { Ok(lo_entry) };
            }
            if is_lower {
                if mid == 0 {
                    return Err(Error::no_such_key());
                }
                upper = mid - 1;
            } else {
                lower = mid + 1;
            }
            if lower > upper {
                return Err(Error::no_such_key());
            }
        }
    }
}

fn read_u64_at(file: &mut File, pos: u64) -> Result<u64> {
    file.seek(SeekFrom::Start(pos))?;
    Ok(file.read_u64::<BigEndian>()?)
}

/// Reads the key half of the index's last `(key, offset)` pair, mirroring
/// `get_max_key`'s tail-read. The last pair always starts `ENTRY_SIZE`
/// bytes before EOF, regardless of how many pairs the file holds.
fn compute_max_key(file: &mut File, file_size: u64) -> Result<u64> {
    if file_size < 8 + ENTRY_SIZE {
        return Err(Error::fatal("index file has invalid size"));
    }
    read_u64_at(file, file_size - ENTRY_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_sample_is_always_one_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("idx");
        let mut writer = IndexWriter::create(&path, 0, 100).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let mut reader = IndexReader::open(&path).unwrap();
        assert_eq!(reader.max_key(), 1);
        assert_eq!(reader.nearest_offset(1).unwrap(), (1, 0));
    }

    #[test]
    fn samples_only_when_strictly_beyond_frequency() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("idx");
        let mut writer = IndexWriter::create(&path, 0, 10).unwrap();
        writer.write_key(5, 100).unwrap(); // 5 <= 1+10, skipped
        writer.write_key(12, 200).unwrap(); // 12 > 1+10, sampled
        writer.write_key(15, 300).unwrap(); // 15 <= 12+10, skipped
        writer.write_key(30, 400).unwrap(); // 30 > 12+10, sampled
        writer.flush().unwrap();
        drop(writer);

        let mut reader = IndexReader::open(&path).unwrap();
        assert_eq!(reader.max_key(), 30);
        assert_eq!(reader.nearest_offset(20).unwrap(), (12, 200));
        assert_eq!(reader.nearest_offset(30).unwrap(), (30, 400));
    }

    #[test]
    fn key_beyond_max_is_no_such_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("idx");
        let mut writer = IndexWriter::create(&path, 0, 10).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let mut reader = IndexReader::open(&path).unwrap();
        assert!(reader.nearest_offset(1000).is_err());
    }
}
