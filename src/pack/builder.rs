// Archive builder.
//
// Collects named items, sorts them into directory order, compresses each one
// independently and writes header, then record + path + payload per item.
// Bytes go to a temporary file next to the output, renamed over it only once
// everything is flushed. A failed build leaves an existing output untouched.

use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::directory::{self, ItemRecord, RECORD_SIZE};
use super::error::PackError;
use super::header::Header;
use crate::block::{BlockEncoder, Compression};
use crate::io::TrackingWriter;

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Options and stats
// ---------------------------------------------------------------------------

/// Configuration for building an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Compression strategy. Defaults to the highest level, since archives
    /// are built once and read many times.
    pub compression: Compression,
    /// Engine build number recorded in the header.
    pub build_number: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            build_number: 0,
        }
    }
}

/// Statistics returned by a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStats {
    /// Items written.
    pub items: u64,
    /// Sum of item sizes.
    pub raw_bytes: u64,
    /// Sum of payload sizes as stored.
    pub stored_bytes: u64,
    /// Items stored in compressed form.
    pub compressed_items: u64,
    /// Size of the archive file.
    pub archive_size: u64,
    /// SHA-256 of the archive (if `file-io` feature is enabled).
    pub archive_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

enum Source {
    Disk(PathBuf),
    Memory(Vec<u8>),
}

struct Entry {
    name: String,
    source: Source,
}

impl Entry {
    fn load(self) -> Result<(String, Vec<u8>), PackError> {
        let data = match self.source {
            Source::Memory(data) => data,
            Source::Disk(path) => {
                let meta = fs::metadata(&path).map_err(PackError::io("stat", &path))?;
                if meta.len() > u64::from(u32::MAX) {
                    return Err(PackError::ItemTooLarge {
                        path: self.name,
                        size: meta.len(),
                    });
                }
                fs::read(&path).map_err(PackError::io("read", &path))?
            }
        };
        if data.is_empty() {
            return Err(PackError::EmptyItem(self.name));
        }
        if data.len() as u64 > u64::from(u32::MAX) {
            return Err(PackError::ItemTooLarge {
                size: data.len() as u64,
                path: self.name,
            });
        }
        Ok((self.name, data))
    }
}

/// An item ready to be written.
struct Staged {
    name: String,
    raw_size: u32,
    /// 0 when `payload` is the raw data.
    compressed_size: u32,
    payload: Vec<u8>,
}

fn stage(entry: Entry, encoder: &mut Option<BlockEncoder>) -> Result<Staged, PackError> {
    let (name, data) = entry.load()?;
    let raw_size = data.len() as u32;

    let compressed = match encoder {
        Some(enc) if data.len() > 1 => match enc.compress(&data) {
            Ok(packed) if packed.len() < data.len() => Some(packed),
            Ok(packed) => {
                debug!(
                    "{name}: compressed {} >= raw {}, storing raw",
                    packed.len(),
                    data.len()
                );
                None
            }
            Err(e) => {
                debug!("{name}: {e}, storing raw");
                None
            }
        },
        _ => None,
    };

    Ok(match compressed {
        Some(payload) => Staged {
            name,
            raw_size,
            compressed_size: payload.len() as u32,
            payload,
        },
        None => Staged {
            name,
            raw_size,
            compressed_size: 0,
            payload: data,
        },
    })
}

// ---------------------------------------------------------------------------
// PackBuilder
// ---------------------------------------------------------------------------

/// Collects items and writes them as one archive.
///
/// # Example
/// ```no_run
/// use assetpack::pack::{BuildOptions, PackBuilder};
/// let mut builder = PackBuilder::new(BuildOptions::default());
/// builder.add_bytes("greeting.txt", b"hello world".to_vec()).unwrap();
/// builder.add_path("textures/stone.png").unwrap();
/// builder.write("assets.pak").unwrap();
/// ```
pub struct PackBuilder {
    opts: BuildOptions,
    entries: Vec<Entry>,
    seen: HashSet<String>,
}

impl PackBuilder {
    pub fn new(opts: BuildOptions) -> Self {
        Self {
            opts,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Add a file stored under its own path string.
    ///
    /// A path already added is skipped; the first occurrence wins.
    pub fn add_path(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, PackError> {
        let path = path.as_ref();
        let name = path.to_str().ok_or_else(|| PackError::InvalidPath {
            path: path.to_string_lossy().into_owned(),
            reason: "path is not valid UTF-8",
        })?;
        let name = name.to_owned();
        self.push(name, Source::Disk(path.to_path_buf()))
    }

    /// Add the file at `disk_path` under the archive name `name`.
    pub fn add_named(
        &mut self,
        name: impl Into<String>,
        disk_path: impl AsRef<Path>,
    ) -> Result<&mut Self, PackError> {
        self.push(name.into(), Source::Disk(disk_path.as_ref().to_path_buf()))
    }

    /// Add in-memory bytes under `name`.
    pub fn add_bytes(
        &mut self,
        name: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<&mut Self, PackError> {
        self.push(name.into(), Source::Memory(data))
    }

    fn push(&mut self, name: String, source: Source) -> Result<&mut Self, PackError> {
        directory::validate_path(&name)?;
        if self.seen.contains(&name) {
            debug!("skipping duplicate item {name:?}");
            return Ok(self);
        }
        self.seen.insert(name.clone());
        self.entries.push(Entry { name, source });
        Ok(self)
    }

    /// Number of distinct items added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the archive to `output`, replacing an existing regular file.
    pub fn write(self, output: impl AsRef<Path>) -> Result<BuildStats, PackError> {
        let output = output.as_ref();
        let PackBuilder {
            opts, mut entries, ..
        } = self;

        if entries.is_empty() {
            return Err(PackError::bad_format("archive holds no items"));
        }
        entries.sort_by(|a, b| directory::compare_paths(&a.name, &b.name));

        if let Ok(meta) = fs::metadata(output)
            && !meta.is_file()
        {
            return Err(PackError::OutputNotRegular(output.to_path_buf()));
        }

        reject_source_as_output(&entries, output)?;

        let parent = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(parent).map_err(PackError::io("create", parent))?;
        let mut writer = TrackingWriter::new(BufWriter::with_capacity(BUF_SIZE, temp));
        let header = Header::new(opts.build_number, entries.len() as u64);
        writer
            .write_all(&header.encode())
            .map_err(PackError::io("write", output))?;

        let mut stats = BuildStats {
            items: 0,
            raw_bytes: 0,
            stored_bytes: 0,
            compressed_items: 0,
            archive_size: 0,
            archive_sha256: None,
        };

        #[cfg(feature = "parallel")]
        {
            let staged: Vec<Staged> = entries
                .into_par_iter()
                .map_init(
                    || opts.compression.matcher().map(BlockEncoder::new),
                    |enc, entry| stage(entry, enc),
                )
                .collect::<Result<_, _>>()?;
            for item in staged {
                write_item(&mut writer, item, header, output, &mut stats)?;
            }
        }

        #[cfg(not(feature = "parallel"))]
        {
            let mut encoder = opts.compression.matcher().map(BlockEncoder::new);
            for entry in entries {
                let item = stage(entry, &mut encoder)?;
                write_item(&mut writer, item, header, output, &mut stats)?;
            }
        }

        let (buffered, archive_size, digest) = writer.finish();
        let temp = buffered
            .into_inner()
            .map_err(|e| PackError::io("flush", output)(e.into_error()))?;
        temp.as_file()
            .sync_all()
            .map_err(PackError::io("sync", output))?;
        temp.persist(output)
            .map_err(|e| PackError::io("rename", output)(e.error))?;

        stats.archive_size = archive_size;
        stats.archive_sha256 = digest;
        info!(
            "built {} ({} items, {} -> {} bytes, {} compressed)",
            output.display(),
            stats.items,
            stats.raw_bytes,
            stats.archive_size,
            stats.compressed_items
        );
        Ok(stats)
    }
}

/// Fail if a disk source is the file about to be replaced.
fn reject_source_as_output(entries: &[Entry], output: &Path) -> Result<(), PackError> {
    let Ok(target) = fs::canonicalize(output) else {
        return Ok(());
    };
    for entry in entries {
        if let Source::Disk(path) = &entry.source
            && fs::canonicalize(path).is_ok_and(|p| p == target)
        {
            return Err(PackError::InvalidPath {
                path: entry.name.clone(),
                reason: "source is the output archive",
            });
        }
    }
    Ok(())
}

fn write_item<W: Write>(
    writer: &mut TrackingWriter<W>,
    item: Staged,
    header: Header,
    output: &Path,
    stats: &mut BuildStats,
) -> Result<(), PackError> {
    let record = ItemRecord {
        compressed_size: item.compressed_size,
        raw_size: item.raw_size,
        file_offset: writer.position(),
        path: item.name,
    };
    let mut head = Vec::with_capacity(RECORD_SIZE + record.path.len());
    record.encode(header.endian(), &mut head);

    if record.is_compressed() {
        debug!(
            "{} @ {}: {} -> {} bytes",
            record.path, record.file_offset, record.raw_size, record.compressed_size
        );
    } else {
        debug!(
            "{} @ {}: {} bytes (raw)",
            record.path, record.file_offset, record.raw_size
        );
    }

    writer
        .write_all(&head)
        .and_then(|()| writer.write_all(&item.payload))
        .map_err(PackError::io("write", output))?;

    stats.items += 1;
    stats.raw_bytes += u64::from(record.raw_size);
    stats.stored_bytes += item.payload.len() as u64;
    if record.is_compressed() {
        stats.compressed_items += 1;
    }
    Ok(())
}

/// Build an archive from files, each stored under its path as given.
pub fn build<P: AsRef<Path>>(
    output: impl AsRef<Path>,
    sources: &[P],
    opts: BuildOptions,
) -> Result<BuildStats, PackError> {
    let mut builder = PackBuilder::new(opts);
    for source in sources {
        builder.add_path(source)?;
    }
    builder.write(output)
}
