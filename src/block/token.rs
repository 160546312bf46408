// Token header layout.
//
//   bit 7..5  literal run length (7 = varint follows with run - 7)
//   bit 4     bit 16 of the match distance
//   bit 3..0  match length - 4 (15 = varint follows with length - 19)
//
// Stream order for one token:
//
//   header [run varint] literals [length varint] distance_lo16_le
//
// The match part is present only while the decoder still expects output
// after the literals.

use super::varint::{self, MAX_VARINT_VALUE};
use crate::hash::config::{MAX_DISTANCE, MIN_MATCH};

const RUN_SHIFT: u32 = 5;
/// Largest literal run stored directly in the header.
pub const RUN_INLINE_MAX: usize = 7;
/// Header bit carrying distance bit 16.
pub const DISTANCE_HIGH_BIT: u8 = 0x10;
const LENGTH_MASK: u8 = 0x0F;
/// Largest `length - MIN_MATCH` stored directly in the header.
pub const LENGTH_INLINE_MAX: usize = 15;

/// Longest literal run one token can carry.
pub const MAX_LITERAL_RUN: usize = RUN_INLINE_MAX + MAX_VARINT_VALUE as usize;

/// Longest match one token can carry.
pub const MAX_MATCH_LEN: usize = MIN_MATCH + LENGTH_INLINE_MAX + MAX_VARINT_VALUE as usize;

/// Decoded view of a header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenHeader(pub u8);

impl TokenHeader {
    /// Literal-run field (0..=7).
    #[inline(always)]
    pub fn run_field(self) -> usize {
        (self.0 >> RUN_SHIFT) as usize
    }

    /// Match-length field (0..=15), i.e. `length - MIN_MATCH` when inline.
    #[inline(always)]
    pub fn length_field(self) -> usize {
        (self.0 & LENGTH_MASK) as usize
    }

    /// Bit 16 of the match distance, already shifted into place.
    #[inline(always)]
    pub fn distance_high(self) -> usize {
        usize::from(self.0 & DISTANCE_HIGH_BIT != 0) << 16
    }
}

/// Append one token to `out`.
///
/// `literals` must not exceed `MAX_LITERAL_RUN`. A `(distance, length)`
/// match must satisfy `1 <= distance <= MAX_DISTANCE` and
/// `MIN_MATCH <= length <= MAX_MATCH_LEN`.
pub fn write_token(out: &mut Vec<u8>, literals: &[u8], matched: Option<(usize, usize)>) {
    debug_assert!(literals.len() <= MAX_LITERAL_RUN);
    let run = literals.len();
    let run_field = run.min(RUN_INLINE_MAX) as u8;

    let mut header = run_field << RUN_SHIFT;
    if let Some((distance, length)) = matched {
        debug_assert!((1..=MAX_DISTANCE).contains(&distance));
        debug_assert!((MIN_MATCH..=MAX_MATCH_LEN).contains(&length));
        header |= (length - MIN_MATCH).min(LENGTH_INLINE_MAX) as u8;
        if distance > 0xFFFF {
            header |= DISTANCE_HIGH_BIT;
        }
    }
    out.push(header);

    if run >= RUN_INLINE_MAX {
        varint::write_u32(out, (run - RUN_INLINE_MAX) as u32);
    }
    out.extend_from_slice(literals);

    if let Some((distance, length)) = matched {
        if length - MIN_MATCH >= LENGTH_INLINE_MAX {
            varint::write_u32(out, (length - MIN_MATCH - LENGTH_INLINE_MAX) as u32);
        }
        out.extend_from_slice(&(distance as u16).to_le_bytes());
    }
}
