// Bounds-checked typed access to archive bytes.
//
// Header and record fields are decoded field by field from byte slices; no
// struct is ever reinterpreted from raw memory.

use thiserror::Error;

/// Byte order of multi-byte header and record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order of the running process.
    pub const NATIVE: Endian = if cfg!(target_endian = "big") {
        Endian::Big
    } else {
        Endian::Little
    };

    pub fn name(self) -> &'static str {
        match self {
            Endian::Little => "little-endian",
            Endian::Big => "big-endian",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unexpected end of data: wanted {wanted} bytes at offset {offset}, {available} available")]
pub struct CursorError {
    pub offset: usize,
    pub wanted: usize,
    pub available: usize,
}

/// Forward-only reader over a byte slice.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            pos: 0,
            endian,
        }
    }

    /// Current offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Take the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        if n > self.remaining() {
            return Err(CursorError {
                offset: self.pos,
                wanted: n,
                available: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        let b = self.read_array::<4>()?;
        Ok(match self.endian {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
        })
    }

    pub fn read_u64(&mut self) -> Result<u64, CursorError> {
        let b = self.read_array::<8>()?;
        Ok(match self.endian {
            Endian::Little => u64::from_le_bytes(b),
            Endian::Big => u64::from_be_bytes(b),
        })
    }
}

/// Append a `u32` in `endian` order.
pub fn put_u32(out: &mut Vec<u8>, value: u32, endian: Endian) {
    match endian {
        Endian::Little => out.extend_from_slice(&value.to_le_bytes()),
        Endian::Big => out.extend_from_slice(&value.to_be_bytes()),
    }
}

/// Append a `u64` in `endian` order.
pub fn put_u64(out: &mut Vec<u8>, value: u64, endian: Endian) {
    match endian {
        Endian::Little => out.extend_from_slice(&value.to_le_bytes()),
        Endian::Big => out.extend_from_slice(&value.to_be_bytes()),
    }
}
