// Variable-length integers for token overflow fields.
//
// Base-128, least-significant group first. Every byte but the last has
// bit 7 set. Decoding accepts at most four groups (28 bits); a fifth
// continuation byte means the stream is corrupt.

use thiserror::Error;

/// Maximum number of 7-bit groups accepted by the decoder.
pub const MAX_VARINT_LEN: usize = 4;

/// Largest value representable in `MAX_VARINT_LEN` groups.
pub const MAX_VARINT_VALUE: u32 = (1 << (7 * MAX_VARINT_LEN)) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarIntError {
    /// Input ended before the terminal byte.
    #[error("varint underflow (truncated input)")]
    Underflow,
    /// More than `MAX_VARINT_LEN` groups.
    #[error("varint overflow (more than 4 groups)")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Append `value` to `out`. Returns the number of bytes written.
///
/// Values above `MAX_VARINT_VALUE` encode to five bytes that the decoder
/// rejects; the block encoder never produces them.
#[inline]
pub fn write_u32(out: &mut Vec<u8>, mut value: u32) -> usize {
    debug_assert!(value <= MAX_VARINT_VALUE);
    let start = out.len();
    while value >= 0x80 {
        out.push(0x80 | (value & 0x7F) as u8);
        value >>= 7;
    }
    out.push(value as u8);
    out.len() - start
}

/// Encoded byte-length of `value`.
#[inline]
pub fn sizeof_u32(value: u32) -> usize {
    let bits = 32 - value.leading_zeros();
    bits.max(1).div_ceil(7) as usize
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a value from the front of `data`.
/// Returns `(value, bytes_consumed)`.
#[inline]
pub fn read_u32(data: &[u8]) -> Result<(u32, usize), VarIntError> {
    let mut value = 0u32;
    for i in 0..MAX_VARINT_LEN {
        let &byte = data.get(i).ok_or(VarIntError::Underflow)?;
        value |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(VarIntError::Overflow)
}
