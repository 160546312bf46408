//! Assetpack: read-only game asset archives with LZ77 block compression.
//!
//! The crate provides:
//! - A byte-oriented LZ77 block codec (`block`) and its match finder (`hash`)
//! - The archive container: builder, reader, and on-disk layout (`pack`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use assetpack::pack::{BuildOptions, Pack, PackBuilder};
//!
//! let mut builder = PackBuilder::new(BuildOptions::default());
//! builder.add_bytes("a.txt", b"hello world".to_vec()).unwrap();
//! builder.add_bytes("b.bin", vec![0u8; 4096]).unwrap();
//! builder.write("assets.pak").unwrap();
//!
//! let mut pack = Pack::open("assets.pak").unwrap();
//! let item = pack.get("a.txt").unwrap();
//! assert_eq!(item.as_bytes(), b"hello world");
//! pack.release(item);
//! pack.close();
//! ```

pub mod block;
pub mod hash;
pub mod io;
pub mod pack;

#[cfg(feature = "cli")]
pub mod cli;

pub use io::extract_all;
pub use pack::{BuildOptions, Item, Pack, PackBuilder, PackError, build, info};
