// Archive container.
//
// - `header`:    magic, format flags, build number, item count
// - `directory`: per-item records and the (length, bytes) path order
// - `builder`:   sorts, compresses, and writes items
// - `reader`:    validates the directory and serves items on demand
// - `cursor`:    fixed-width integer reads in a declared byte order
// - `scratch`:   growth-only buffers shared by retrievals
// - `error`:     `PackError`

pub mod builder;
pub mod cursor;
pub mod directory;
pub mod error;
pub mod header;
pub mod reader;
pub mod scratch;

pub use builder::{BuildOptions, BuildStats, PackBuilder, build};
pub use directory::{ItemRecord, compare_paths};
pub use error::PackError;
pub use header::Header;
pub use reader::{Item, Pack, PackInfo, info};
