// LZ77 block codec.
//
// - `varint`:  little-endian base-128 integers for overflowing token fields
// - `token`:   header-byte layout and token emission
// - `encoder`: greedy/lazy parse over the hash-chained match finder
// - `decoder`: bounds-checked token interpreter

pub mod decoder;
pub mod encoder;
pub mod token;
pub mod varint;

pub use decoder::{DecodeError, decompress, decompress_into};
pub use encoder::{BlockEncoder, Compression, EncodeError, compress};
