//! Packed lookup-store writer (`spec.md` §4.6).
//!
//! Grounded on `lookup_writer.c`'s `write_packed_to_lookup_writer` /
//! `write_unpacked_to_lookup_writer`: an 8-byte key is written, the record
//! start position is captured before the key is written (so it points at
//! the whole record, key included), then the payload follows; an attached
//! index writer is fed `(key, record_start)` after the write succeeds.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use buffer_redux::BufWriter;
use byteorder::{BigEndian, WriteBytesExt};

use crate::error::Result;
use crate::lookup::index::IndexWriter;
use crate::lookup::pack::{make_key, pack_bases};

/// Appends `(key, payload)` records to a packed lookup store, optionally
/// sampling a companion sparse index as it goes.
pub struct LookupWriter {
    file: BufWriter<File>,
    index: Option<IndexWriter>,
    pos: u64,
}

impl LookupWriter {
    pub fn create(path: impl AsRef<Path>, buf_size: usize, index: Option<IndexWriter>) -> Result<Self> {
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
        Ok(LookupWriter {
            file: BufWriter::with_capacity(buf_size.max(1), file),
            index,
            pos: 0,
        })
    }

    /// Writes a record whose payload has already been packed by the
    /// caller (e.g. via [`crate::lookup::pack::pack_bases`]).
    pub fn write(&mut self, key: u64, payload: &[u8]) -> Result<()> {
        let record_start = self.pos;
        self.file.write_u64::<BigEndian>(key)?;
        self.pos += 8;
        self.file.write_all(payload)?;
        self.pos += payload.len() as u64;

        if let Some(index) = &mut self.index {
            index.write_key(key, record_start)?;
        }
        Ok(())
    }

    /// Composes the key from `(spot_id, read_ordinal)`, packs `bases`,
    /// and writes the record.
    pub fn write_unpacked(&mut self, spot_id: u64, read_ordinal: u32, bases: &[u8]) -> Result<()> {
        let key = make_key(spot_id, read_ordinal);
        let packed = pack_bases(bases)?;
        self.write(key, &packed)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        if let Some(index) = &mut self.index {
            index.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_record_and_samples_index() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("store");
        let index = IndexWriter::create(dir.path().join("idx"), 0, 1).unwrap();

        let mut writer = LookupWriter::create(&store_path, 0, Some(index)).unwrap();
        writer.write_unpacked(1, 1, b"ACGT").unwrap();
        writer.write_unpacked(2, 1, b"TTTT").unwrap();
        writer.flush().unwrap();
        drop(writer);

        let bytes = std::fs::read(&store_path).unwrap();
        // key(8) + len-prefix(2) + packed(1) per record = 11 bytes each.
        assert_eq!(bytes.len(), 22);
        let key0 = u64::from_be_bytes(bytes[0..8].try_into().unwrap());
        assert_eq!(key0, make_key(1, 1));
    }
}
