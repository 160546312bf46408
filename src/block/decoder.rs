// Block decompressor.
//
// A straight token interpreter. Every read from the input and every write to
// the output is bounds-checked before it happens; a stream that would step
// outside either buffer is rejected with a `DecodeError`, never a panic.
//
// The stream carries no terminator. Decoding stops when exactly
// `output.len()` bytes have been produced.

use thiserror::Error;

use super::token::{LENGTH_INLINE_MAX, RUN_INLINE_MAX, TokenHeader};
use super::varint::{self, VarIntError};
use crate::hash::config::MIN_MATCH;

// ---------------------------------------------------------------------------
// Decoder error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("stream truncated at input offset {offset}")]
    Truncated { offset: usize },
    #[error("bad varint at input offset {offset}: {source}")]
    VarInt {
        offset: usize,
        #[source]
        source: VarIntError,
    },
    #[error("literal run of {run} bytes at output offset {offset} overruns the output")]
    LiteralOverrun { offset: usize, run: usize },
    #[error("match of {length} bytes at output offset {offset} overruns the output")]
    MatchOverrun { offset: usize, length: usize },
    #[error("match distance {distance} at output offset {offset} reaches before the output start")]
    BadDistance { offset: usize, distance: usize },
    #[error("{remaining} trailing bytes after the output was complete")]
    TrailingBytes { remaining: usize },
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode `input` into exactly `output.len()` bytes.
pub fn decompress_into(input: &[u8], output: &mut [u8]) -> Result<(), DecodeError> {
    let out_len = output.len();
    let mut ip = 0usize;
    let mut op = 0usize;

    while op < out_len {
        let &header = input.get(ip).ok_or(DecodeError::Truncated { offset: ip })?;
        let header = TokenHeader(header);
        ip += 1;

        // Literal run.
        let mut run = header.run_field();
        if run == RUN_INLINE_MAX {
            let (extra, used) = read_varint(input, ip)?;
            ip += used;
            run += extra as usize;
        }
        if run > out_len - op {
            return Err(DecodeError::LiteralOverrun { offset: op, run });
        }
        if run > input.len() - ip {
            return Err(DecodeError::Truncated { offset: input.len() });
        }
        output[op..op + run].copy_from_slice(&input[ip..ip + run]);
        ip += run;
        op += run;

        if op == out_len {
            break;
        }

        // Match.
        let mut length = header.length_field();
        if length == LENGTH_INLINE_MAX {
            let (extra, used) = read_varint(input, ip)?;
            ip += used;
            length += extra as usize;
        }
        length += MIN_MATCH;

        let lo = input
            .get(ip..ip + 2)
            .ok_or(DecodeError::Truncated { offset: ip })?;
        let distance = usize::from(u16::from_le_bytes([lo[0], lo[1]])) | header.distance_high();
        ip += 2;

        if distance == 0 || distance > op {
            return Err(DecodeError::BadDistance {
                offset: op,
                distance,
            });
        }
        if length > out_len - op {
            return Err(DecodeError::MatchOverrun { offset: op, length });
        }
        copy_match(output, op, distance, length);
        op += length;
    }

    if ip != input.len() {
        return Err(DecodeError::TrailingBytes {
            remaining: input.len() - ip,
        });
    }
    Ok(())
}

/// Decode `input` into a new buffer of `raw_size` bytes.
pub fn decompress(input: &[u8], raw_size: usize) -> Result<Vec<u8>, DecodeError> {
    let mut out = vec![0u8; raw_size];
    decompress_into(input, &mut out)?;
    Ok(out)
}

#[inline]
fn read_varint(input: &[u8], ip: usize) -> Result<(u32, usize), DecodeError> {
    varint::read_u32(&input[ip.min(input.len())..])
        .map_err(|source| DecodeError::VarInt { offset: ip, source })
}

/// Copy `length` bytes from `op - distance` to `op`.
///
/// When the ranges overlap (`distance < length`) the source is the output
/// being produced, so bytes are copied forward one at a time and each copy may
/// read a byte written earlier in the same match.
///
/// Callers guarantee `1 <= distance <= op` and `op + length <= output.len()`.
#[inline]
fn copy_match(output: &mut [u8], op: usize, distance: usize, length: usize) {
    let src = op - distance;
    if distance >= length {
        output.copy_within(src..src + length, op);
    } else if distance == 1 {
        let byte = output[src];
        output[op..op + length].fill(byte);
    } else {
        for i in 0..length {
            output[op + i] = output[src + i];
        }
    }
}
