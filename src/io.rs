// File-level helpers.
//
// Provides `extract_all()` for unpacking a whole archive into a directory,
// and the position-tracking writer the builder streams through. When the
// `file-io` feature is enabled the writer also computes a SHA-256 of every
// byte written.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "file-io")]
use sha2::Digest;

use log::info;

use crate::pack::{Pack, PackError};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `extract_all()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractStats {
    /// Items written.
    pub items: u64,
    /// Total bytes written.
    pub bytes: u64,
    /// Files created, in directory order.
    pub files: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// extract_all
// ---------------------------------------------------------------------------

/// File name an item is extracted to: path separators become `-`.
///
/// Names that would still refer to the directory itself or its parent are
/// rejected.
pub fn flatten_item_path(path: &str) -> Result<String, PackError> {
    let flat: String = path
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    if flat == "." || flat == ".." || flat.contains('\0') {
        return Err(PackError::InvalidPath {
            path: path.to_owned(),
            reason: "cannot be used as a file name",
        });
    }
    Ok(flat)
}

/// Write every item of the archive at `archive` into `destination`.
///
/// The destination directory is created if missing. Existing files with the
/// same flattened names are overwritten.
pub fn extract_all(
    archive: impl AsRef<Path>,
    destination: impl AsRef<Path>,
) -> Result<ExtractStats, PackError> {
    let archive = archive.as_ref();
    let destination = destination.as_ref();
    fs::create_dir_all(destination).map_err(PackError::io("create directory", destination))?;

    let mut pack = Pack::open(archive)?;
    let mut stats = ExtractStats {
        items: 0,
        bytes: 0,
        files: Vec::with_capacity(pack.item_count() as usize),
    };

    for index in 0..pack.len() {
        let target = match pack.item_path(index) {
            Some(path) => destination.join(flatten_item_path(path)?),
            None => break,
        };
        let item = pack.get_index(index)?;
        let written = fs::write(&target, item.as_bytes());
        stats.bytes += item.len() as u64;
        pack.release(item);
        written.map_err(PackError::io("write", &target))?;
        stats.items += 1;
        stats.files.push(target);
    }

    pack.close();
    info!(
        "extracted {} items ({} bytes) from {} into {}",
        stats.items,
        stats.bytes,
        archive.display(),
        destination.display()
    );
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tracking writer
// ---------------------------------------------------------------------------

/// Counts (and optionally hashes) everything written through it.
pub(crate) struct TrackingWriter<W: Write> {
    inner: W,
    position: u64,
    #[cfg(feature = "file-io")]
    hasher: sha2::Sha256,
}

impl<W: Write> TrackingWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            inner,
            position: 0,
            #[cfg(feature = "file-io")]
            hasher: sha2::Sha256::new(),
        }
    }

    /// Bytes written so far.
    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    /// Unwrap into the inner writer, total size, and digest.
    pub(crate) fn finish(self) -> (W, u64, Option<[u8; 32]>) {
        #[cfg(feature = "file-io")]
        let digest = Some(self.hasher.finalize().into());
        #[cfg(not(feature = "file-io"))]
        let digest: Option<[u8; 32]> = None;
        (self.inner, self.position, digest)
    }
}

impl<W: Write> Write for TrackingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        #[cfg(feature = "file-io")]
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{BuildOptions, PackBuilder};

    #[test]
    fn flattening() {
        assert_eq!(flatten_item_path("a/b/c.txt").unwrap(), "a-b-c.txt");
        assert_eq!(flatten_item_path("win\\path").unwrap(), "win-path");
        assert_eq!(flatten_item_path("../up").unwrap(), "..-up");
        assert!(flatten_item_path("..").is_err());
        assert!(flatten_item_path(".").is_err());
    }

    #[test]
    fn tracking_writer_counts() {
        let mut w = TrackingWriter::new(Vec::new());
        w.write_all(b"hello").unwrap();
        w.write_all(b" world").unwrap();
        assert_eq!(w.position(), 11);
        let (inner, size, _digest) = w.finish();
        assert_eq!(inner, b"hello world");
        assert_eq!(size, 11);
    }

    #[cfg(feature = "file-io")]
    #[test]
    fn tracking_writer_hashes() {
        let mut w = TrackingWriter::new(Vec::new());
        w.write_all(b"abc").unwrap();
        let (_, _, digest) = w.finish();
        let expected: [u8; 32] = sha2::Sha256::digest(b"abc").into();
        assert_eq!(digest, Some(expected));
    }

    #[test]
    fn extract_writes_flattened_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("x.pak");
        let mut b = PackBuilder::new(BuildOptions::default());
        b.add_bytes("dir/one.txt", b"first".to_vec()).unwrap();
        b.add_bytes("two", vec![7u8; 1000]).unwrap();
        b.write(&archive).unwrap();

        let out = dir.path().join("out");
        let stats = extract_all(&archive, &out).unwrap();
        assert_eq!(stats.items, 2);
        assert_eq!(stats.bytes, 1005);
        assert_eq!(fs::read(out.join("dir-one.txt")).unwrap(), b"first");
        assert_eq!(fs::read(out.join("two")).unwrap(), vec![7u8; 1000]);
    }
}
