// Error type for archive building and reading.

use std::collections::TryReserveError;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::block::DecodeError;

/// Every failure the pack layer reports.
///
/// Variants carry enough context (operation, path, item) for a caller to log
/// a useful message without further lookups.
#[derive(Debug, Error)]
pub enum PackError {
    /// An OS-level open/read/write/seek failed.
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A buffer could not be grown.
    #[error("out of memory reserving {requested} bytes")]
    Allocation {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    /// An item's compressed payload failed to decode.
    #[error("corrupt stream in item {path:?}: {source}")]
    CorruptStream {
        path: String,
        #[source]
        source: DecodeError,
    },

    /// The file is not a well-formed archive for this host.
    #[error("bad archive format: {0}")]
    BadFormat(String),

    /// No item with this path.
    #[error("item not found: {0:?}")]
    NotFound(String),

    /// Index past the end of the directory.
    #[error("item index {index} out of range (archive holds {count} items)")]
    IndexOutOfRange { index: usize, count: usize },

    /// An item name the format cannot store.
    #[error("invalid item path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// Item larger than the 32-bit size field.
    #[error("item {path:?} is {size} bytes, above the 4 GiB item limit")]
    ItemTooLarge { path: String, size: u64 },

    /// Zero-byte items cannot be stored.
    #[error("item {0:?} is empty")]
    EmptyItem(String),

    /// The build target exists and is a directory, device, or similar.
    #[error("output {} exists and is not a regular file", .0.display())]
    OutputNotRegular(PathBuf),

    /// Retrieved items were still outstanding when the handle closed.
    #[error("{count} retrieved item(s) were never released")]
    LeakedReferences { count: usize },
}

impl PackError {
    /// Adapter for `map_err` on I/O results.
    pub(crate) fn io<'a>(
        op: &'static str,
        path: &'a Path,
    ) -> impl FnOnce(io::Error) -> PackError + 'a {
        move |source| PackError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Adapter for `map_err` on fallible reservations.
    pub(crate) fn alloc(requested: usize) -> impl FnOnce(TryReserveError) -> PackError {
        move |source| PackError::Allocation { requested, source }
    }

    pub(crate) fn bad_format(msg: impl Into<String>) -> Self {
        PackError::BadFormat(msg.into())
    }
}
