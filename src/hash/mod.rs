// Match finding for the block compressor.
//
// This module provides:
// - Effort profiles (fast, levels 1-9)
// - A 4-byte-prefix hash table with a per-position backward chain
// - Longest-match search bounded by window and chain budget

pub mod config;
pub mod matching;
pub mod table;
