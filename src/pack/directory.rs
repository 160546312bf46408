// Item directory.
//
// One 17-byte record per item, immediately followed by the item's path and
// then its payload:
//
//   compressed_size u32   0 = stored raw
//   raw_size        u32   always > 0
//   file_offset     u64   absolute offset of this record
//   path_size       u8    1..=255
//
// Records are kept sorted by (path length, path bytes). Binary search relies
// on that order and the builder produces it.

use std::cmp::Ordering;

use super::cursor::{self, ByteCursor, Endian};
use super::error::PackError;

/// Encoded size of the fixed part of a record.
pub const RECORD_SIZE: usize = 17;

/// Longest storable item path in bytes.
pub const MAX_PATH_LEN: usize = u8::MAX as usize;

/// Directory order: shorter paths first, then bytewise.
#[inline]
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Check that `path` can be stored as an item name.
pub fn validate_path(path: &str) -> Result<(), PackError> {
    let reason = if path.is_empty() {
        "path is empty"
    } else if path.len() > MAX_PATH_LEN {
        "path is longer than 255 bytes"
    } else {
        return Ok(());
    };
    Err(PackError::InvalidPath {
        path: path.to_owned(),
        reason,
    })
}

/// Fixed part of a record as it appears on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFields {
    pub compressed_size: u32,
    pub raw_size: u32,
    pub file_offset: u64,
    pub path_size: u8,
}

impl RecordFields {
    pub fn decode(bytes: &[u8; RECORD_SIZE], endian: Endian) -> Self {
        let mut c = ByteCursor::new(bytes, endian);
        // The slice is exactly RECORD_SIZE bytes, so the reads cannot fail.
        let compressed_size = c.read_u32().unwrap_or_default();
        let raw_size = c.read_u32().unwrap_or_default();
        let file_offset = c.read_u64().unwrap_or_default();
        let path_size = c.read_u8().unwrap_or_default();
        Self {
            compressed_size,
            raw_size,
            file_offset,
            path_size,
        }
    }

    /// Bytes of payload following the path.
    pub fn stored_size(&self) -> u64 {
        if self.compressed_size != 0 {
            u64::from(self.compressed_size)
        } else {
            u64::from(self.raw_size)
        }
    }
}

/// One directory entry with its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    /// Size of the compressed payload, or 0 when stored raw.
    pub compressed_size: u32,
    /// Size of the item's bytes.
    pub raw_size: u32,
    /// Absolute offset of this record in the archive.
    pub file_offset: u64,
    pub path: String,
}

impl ItemRecord {
    pub fn is_compressed(&self) -> bool {
        self.compressed_size != 0
    }

    /// Bytes of payload following the path.
    pub fn stored_size(&self) -> u64 {
        self.fields().stored_size()
    }

    /// Absolute offset of the payload.
    pub fn payload_offset(&self) -> u64 {
        self.file_offset + (RECORD_SIZE + self.path.len()) as u64
    }

    fn fields(&self) -> RecordFields {
        RecordFields {
            compressed_size: self.compressed_size,
            raw_size: self.raw_size,
            file_offset: self.file_offset,
            path_size: self.path.len() as u8,
        }
    }

    /// Append the record and its path to `out`.
    pub fn encode(&self, endian: Endian, out: &mut Vec<u8>) {
        debug_assert!(!self.path.is_empty() && self.path.len() <= MAX_PATH_LEN);
        let f = self.fields();
        cursor::put_u32(out, f.compressed_size, endian);
        cursor::put_u32(out, f.raw_size, endian);
        cursor::put_u64(out, f.file_offset, endian);
        out.push(f.path_size);
        out.extend_from_slice(self.path.as_bytes());
    }
}

/// Sorted records of an open archive.
#[derive(Debug, Default)]
pub struct Directory {
    records: Vec<ItemRecord>,
}

impl Directory {
    /// Wrap records that must already be in directory order.
    ///
    /// Out-of-order or duplicate paths are a format error.
    pub fn from_sorted(records: Vec<ItemRecord>) -> Result<Self, PackError> {
        if let Some(pair) = records
            .windows(2)
            .find(|w| compare_paths(&w[0].path, &w[1].path) != Ordering::Less)
        {
            return Err(PackError::bad_format(format!(
                "directory not sorted at {:?} / {:?}",
                pair[0].path, pair[1].path
            )));
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ItemRecord> {
        self.records.get(index)
    }

    /// Index of the record named `path`.
    pub fn find(&self, path: &str) -> Option<usize> {
        self.records
            .binary_search_by(|r| compare_paths(&r.path, path))
            .ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemRecord> {
        self.records.iter()
    }
}
