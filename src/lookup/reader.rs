//! Packed lookup-store reader (`spec.md` §4.6).
//!
//! The companion to [`crate::lookup::writer::LookupWriter`]: seeks to the
//! sparse index's nearest sampled offset, then scans forward record by
//! record — mirroring the comment in `index.c` that the caller in
//! `lookup_reader.c`'s `indexed_seek()` "only searches forward from the
//! key_found/offset position".

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::lookup::index::IndexReader;

/// One decoded record: its key and packed payload (length-prefixed,
/// still 2-bit packed — callers unpack with
/// [`crate::lookup::pack::unpack_bases`] as needed).
pub struct Record {
    pub key: u64,
    pub payload: Vec<u8>,
}

/// Sequential reader over a packed lookup store, optionally accelerated
/// by a companion [`IndexReader`] for seeking near a target key.
pub struct LookupReader {
    file: File,
    index: Option<IndexReader>,
}

impl LookupReader {
    pub fn open(path: impl AsRef<Path>, index: Option<IndexReader>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(LookupReader { file, index })
    }

    /// Reads the next record at the file's current position, or `None`
    /// at end of file.
    pub fn read_next(&mut self) -> Result<Option<Record>> {
        let mut key_buf = [0u8; 8];
        match self.file.read_exact(&mut key_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(Error::from(e)),
        }
        let key = u64::from_be_bytes(key_buf);
        let count = self.file.read_u16::<BigEndian>()?;
        let packed_len = ((count as usize) + 3) / 4;
        let mut payload = vec![0u8; 2 + packed_len];
        payload[0..2].copy_from_slice(&count.to_be_bytes());
        self.file.read_exact(&mut payload[2..])?;
        Ok(Some(Record { key, payload }))
    }

    /// Seeks to the byte offset of the record closest to, but not past,
    /// `key`, using the companion index, then scans forward to find the
    /// exact key. Fails with `no-such-key` if no index is attached or the
    /// key exceeds the store's maximum.
    pub fn seek_to_key(&mut self, key: u64) -> Result<Record> {
        let index = self.index.as_mut().ok_or_else(Error::no_such_key)?;
        let (_found_key, offset) = index.nearest_offset(key)?;
        self.file.seek(SeekFrom::Start(offset))?;

        loop {
            match self.read_next()? {
                Some(record) if record.key == key => return Ok(record),
                Some(record) if record.key > key => return Err(Error::no_such_key()),
                Some(_) => continue,
                None => return Err(Error::no_such_key()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::writer::LookupWriter;
    use tempfile::tempdir;

    #[test]
    fn reads_records_sequentially() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store");
        let mut writer = LookupWriter::create(&path, 0, None).unwrap();
        writer.write_unpacked(1, 1, b"ACGT").unwrap();
        writer.write_unpacked(2, 1, b"TTTT").unwrap();
        writer.flush().unwrap();
        drop(writer);

        let mut reader = LookupReader::open(&path, None).unwrap();
        let first = reader.read_next().unwrap().unwrap();
        assert_eq!(first.key, crate::lookup::pack::make_key(1, 1));
        let second = reader.read_next().unwrap().unwrap();
        assert_eq!(second.key, crate::lookup::pack::make_key(2, 1));
        assert!(reader.read_next().unwrap().is_none());
    }

    /// Scenario 5 (`spec.md` §8): indexed lookup finds an exact key via
    /// the sparse index's nearest sample.
    #[test]
    fn seek_to_key_uses_index_and_scans_forward() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("store");
        let idx_path = dir.path().join("idx");

        let index_writer = crate::lookup::index::IndexWriter::create(&idx_path, 0, 1).unwrap();
        let mut writer = LookupWriter::create(&store_path, 0, Some(index_writer)).unwrap();
        for spot_id in 1..=10u64 {
            writer.write_unpacked(spot_id, 1, b"ACGT").unwrap();
        }
        writer.flush().unwrap();
        drop(writer);

        let index_reader = IndexReader::open(&idx_path).unwrap();
        let mut reader = LookupReader::open(&store_path, Some(index_reader)).unwrap();

        let target_key = crate::lookup::pack::make_key(7, 1);
        let record = reader.seek_to_key(target_key).unwrap();
        assert_eq!(record.key, target_key);
    }
}
