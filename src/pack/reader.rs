// Archive reader.
//
// `Pack::open` validates the header and walks every record + path in file
// order, skipping payloads, to build the in-memory directory. Nothing is
// decompressed until an item is requested.
//
// Every field read from the file is treated as untrusted: offsets, sizes,
// paths, and ordering are all checked before the directory is accepted.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Deref;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::directory::{Directory, ItemRecord, RECORD_SIZE, RecordFields};
use super::error::PackError;
use super::header::{COUNT_SIZE, DIRECTORY_OFFSET, HEADER_SIZE, Header};
use super::scratch::ScratchBuffer;
use crate::block;

/// Smallest on-disk footprint of one item: record, 1-byte path, 1-byte payload.
const MIN_ITEM_SIZE: u64 = RECORD_SIZE as u64 + 2;

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// Owned copy of one item's bytes.
///
/// The buffer carries one extra NUL byte after the data for callers that
/// want a C-style terminated view. Hand it back with [`Pack::release`] so the
/// handle's reference count stays balanced.
#[derive(Debug, PartialEq, Eq)]
pub struct Item {
    /// Item bytes followed by a NUL.
    data: Vec<u8>,
}

impl Item {
    fn from_slice(bytes: &[u8]) -> Result<Self, PackError> {
        let mut data = Vec::new();
        data.try_reserve_exact(bytes.len() + 1)
            .map_err(PackError::alloc(bytes.len() + 1))?;
        data.extend_from_slice(bytes);
        data.push(0);
        Ok(Self { data })
    }

    /// Item size in bytes (excluding the NUL).
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// Item bytes including the trailing NUL.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data
    }
}

impl Deref for Item {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Item {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

// ---------------------------------------------------------------------------
// Info
// ---------------------------------------------------------------------------

/// Header-only summary of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackInfo {
    pub build_number: u32,
    pub item_count: u64,
}

/// Read the header of the archive at `path` without loading its directory.
pub fn info(path: impl AsRef<Path>) -> Result<PackInfo, PackError> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(PackError::io("open", path))?;
    let header = read_header(&mut file, path)?;
    Ok(PackInfo {
        build_number: header.build_number,
        item_count: header.item_count,
    })
}

fn read_header<R: Read>(reader: &mut R, path: &Path) -> Result<Header, PackError> {
    let mut bytes = [0u8; HEADER_SIZE + COUNT_SIZE];
    read_exact_or_format(reader, &mut bytes, path, "archive header")?;
    Header::decode(&bytes)
}

/// `read_exact` that reports a short file as a format error.
fn read_exact_or_format<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    path: &Path,
    what: &str,
) -> Result<(), PackError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            PackError::bad_format(format!("file ends inside {what}"))
        } else {
            PackError::io("read", path)(e)
        }
    })
}

// ---------------------------------------------------------------------------
// Pack
// ---------------------------------------------------------------------------

/// An open archive.
///
/// Not thread-safe: retrievals share the handle's scratch buffers, so use one
/// handle per thread or serialize access.
pub struct Pack {
    file: File,
    path: PathBuf,
    header: Header,
    directory: Directory,
    raw_buffer: ScratchBuffer,
    compressed_buffer: ScratchBuffer,
    outstanding: usize,
    closed: bool,
}

impl Pack {
    /// Open and index the archive at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PackError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(PackError::io("open", path))?;
        let file_len = file
            .metadata()
            .map_err(PackError::io("stat", path))?
            .len();

        let mut reader = BufReader::new(file);
        let header = read_header(&mut reader, path)?;

        let max_items = file_len.saturating_sub(DIRECTORY_OFFSET) / MIN_ITEM_SIZE;
        if header.item_count > max_items {
            return Err(PackError::bad_format(format!(
                "item count {} does not fit in {file_len} bytes",
                header.item_count
            )));
        }
        let count = header.item_count as usize;

        let mut records = Vec::new();
        records
            .try_reserve_exact(count)
            .map_err(PackError::alloc(
                count.saturating_mul(std::mem::size_of::<ItemRecord>()),
            ))?;

        let mut pos = DIRECTORY_OFFSET;
        for index in 0..count {
            let record = read_record(&mut reader, path, header, pos, file_len, index)?;
            let skip = record.stored_size();
            pos = record.payload_offset() + skip;
            reader
                .seek_relative(skip as i64)
                .map_err(PackError::io("seek", path))?;
            records.push(record);
        }

        if pos != file_len {
            return Err(PackError::bad_format(format!(
                "{} trailing bytes after the last item",
                file_len - pos
            )));
        }

        let directory = Directory::from_sorted(records)?;
        info!(
            "opened {} ({} items, build {})",
            path.display(),
            directory.len(),
            header.build_number
        );

        Ok(Self {
            file: reader.into_inner(),
            path: path.to_path_buf(),
            header,
            directory,
            raw_buffer: ScratchBuffer::new(),
            compressed_buffer: ScratchBuffer::new(),
            outstanding: 0,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn build_number(&self) -> u32 {
        self.header.build_number
    }

    pub fn item_count(&self) -> u64 {
        self.directory.len() as u64
    }

    /// Number of items, as an index bound.
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    /// Path of the item at `index`.
    pub fn item_path(&self, index: usize) -> Option<&str> {
        self.directory.get(index).map(|r| r.path.as_str())
    }

    pub fn record(&self, index: usize) -> Option<&ItemRecord> {
        self.directory.get(index)
    }

    /// All records in directory order.
    pub fn records(&self) -> impl Iterator<Item = &ItemRecord> {
        self.directory.iter()
    }

    /// Directory index of `path`.
    pub fn find(&self, path: &str) -> Option<usize> {
        self.directory.find(path)
    }

    /// Retrieve the item named `path`.
    pub fn get(&mut self, path: &str) -> Result<Item, PackError> {
        let index = self
            .find(path)
            .ok_or_else(|| PackError::NotFound(path.to_owned()))?;
        self.get_index(index)
    }

    /// Retrieve the item at directory `index`.
    ///
    /// On failure the handle stays usable and the reference count is
    /// unchanged.
    pub fn get_index(&mut self, index: usize) -> Result<Item, PackError> {
        let record = self
            .directory
            .get(index)
            .ok_or(PackError::IndexOutOfRange {
                index,
                count: self.directory.len(),
            })?;

        let raw_size = record.raw_size as usize;
        self.file
            .seek(SeekFrom::Start(record.payload_offset()))
            .map_err(PackError::io("seek", &self.path))?;
        let raw = self.raw_buffer.ensure_capacity(raw_size)?;

        if record.is_compressed() {
            let packed = self
                .compressed_buffer
                .ensure_capacity(record.compressed_size as usize)?;
            read_exact_or_format(&mut self.file, packed, &self.path, "item payload")?;
            block::decompress_into(packed, raw).map_err(|source| PackError::CorruptStream {
                path: record.path.clone(),
                source,
            })?;
        } else {
            read_exact_or_format(&mut self.file, raw, &self.path, "item payload")?;
        }

        let item = Item::from_slice(raw)?;
        self.outstanding += 1;
        debug!(
            "get {:?}: {} bytes (outstanding {})",
            record.path, raw_size, self.outstanding
        );
        Ok(item)
    }

    /// Give back an item obtained from this handle.
    pub fn release(&mut self, item: Item) {
        drop(item);
        match self.outstanding.checked_sub(1) {
            Some(n) => self.outstanding = n,
            None => warn!(
                "{}: release without a matching retrieval",
                self.path.display()
            ),
        }
    }

    /// Items retrieved and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Current sizes of the raw and compressed scratch buffers.
    pub fn scratch_capacity(&self) -> (usize, usize) {
        (self.raw_buffer.capacity(), self.compressed_buffer.capacity())
    }

    /// Close the handle. Returns the number of items never released, which
    /// is also logged as a warning when nonzero.
    pub fn close(mut self) -> usize {
        self.shutdown()
    }

    fn shutdown(&mut self) -> usize {
        if self.closed {
            return 0;
        }
        self.closed = true;
        self.raw_buffer.release();
        self.compressed_buffer.release();
        let leaked = self.outstanding;
        if leaked > 0 {
            warn!(
                "{}: {}",
                self.path.display(),
                PackError::LeakedReferences { count: leaked }
            );
        }
        leaked
    }
}

impl Drop for Pack {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Pack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pack")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("items", &self.directory.len())
            .field("outstanding", &self.outstanding)
            .finish()
    }
}

/// Read and validate the record at `pos` plus its path.
fn read_record<R: Read>(
    reader: &mut R,
    path: &Path,
    header: Header,
    pos: u64,
    file_len: u64,
    index: usize,
) -> Result<ItemRecord, PackError> {
    let mut fixed = [0u8; RECORD_SIZE];
    read_exact_or_format(reader, &mut fixed, path, "an item record")?;
    let f = RecordFields::decode(&fixed, header.endian());

    let bad = |what: String| PackError::bad_format(format!("item {index} at offset {pos}: {what}"));

    if f.file_offset != pos {
        return Err(bad(format!("record claims offset {}", f.file_offset)));
    }
    if f.path_size == 0 {
        return Err(bad("empty path".into()));
    }
    if f.raw_size == 0 {
        return Err(bad("zero-sized item".into()));
    }
    if f.compressed_size != 0 && f.compressed_size >= f.raw_size {
        return Err(bad(format!(
            "compressed size {} not below raw size {}",
            f.compressed_size, f.raw_size
        )));
    }
    let end = pos + RECORD_SIZE as u64 + u64::from(f.path_size) + f.stored_size();
    if end > file_len {
        return Err(bad(format!("payload ends at {end}, past end of file")));
    }

    let mut name = vec![0u8; f.path_size as usize];
    read_exact_or_format(reader, &mut name, path, "an item path")?;
    let name = String::from_utf8(name).map_err(|_| bad("path is not valid UTF-8".into()))?;

    Ok(ItemRecord {
        compressed_size: f.compressed_size,
        raw_size: f.raw_size,
        file_offset: f.file_offset,
        path: name,
    })
}
