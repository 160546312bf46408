// Archive header.
//
//   offset 0  magic "APAK"
//   offset 4  format flags (bit 0: big-endian fields)
//   offset 5  reserved (3 bytes, written as zero, ignored on read)
//   offset 8  build number (u32)
//   offset 12 item count (u64)
//
// Multi-byte fields use the byte order declared by the flags, which is always
// the builder's native order. Readers refuse archives of the other order.

use bitflags::bitflags;

use super::cursor::{self, ByteCursor, Endian};
use super::error::PackError;

pub const MAGIC: [u8; 4] = *b"APAK";

/// Size of the fixed header, excluding the item count.
pub const HEADER_SIZE: usize = 12;

/// Size of the item count that follows the header.
pub const COUNT_SIZE: usize = 8;

/// Offset of the first item record.
pub const DIRECTORY_OFFSET: u64 = (HEADER_SIZE + COUNT_SIZE) as u64;

bitflags! {
    /// Header format byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FormatFlags: u8 {
        const BIG_ENDIAN = 0x01;
    }
}

impl FormatFlags {
    /// Flags describing archives written by this process.
    pub fn native() -> Self {
        match Endian::NATIVE {
            Endian::Big => FormatFlags::BIG_ENDIAN,
            Endian::Little => FormatFlags::empty(),
        }
    }

    pub fn endian(self) -> Endian {
        if self.contains(FormatFlags::BIG_ENDIAN) {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

/// Parsed archive header plus item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub flags: FormatFlags,
    /// Engine build that produced the archive. Informational only.
    pub build_number: u32,
    pub item_count: u64,
}

impl Header {
    /// Header for a new archive written by this process.
    pub fn new(build_number: u32, item_count: u64) -> Self {
        Self {
            flags: FormatFlags::native(),
            build_number,
            item_count,
        }
    }

    pub fn endian(&self) -> Endian {
        self.flags.endian()
    }

    /// Serialize header and item count.
    pub fn encode(&self) -> Vec<u8> {
        let endian = self.endian();
        let mut out = Vec::with_capacity(HEADER_SIZE + COUNT_SIZE);
        out.extend_from_slice(&MAGIC);
        out.push(self.flags.bits());
        out.extend_from_slice(&[0u8; 3]);
        cursor::put_u32(&mut out, self.build_number, endian);
        cursor::put_u64(&mut out, self.item_count, endian);
        out
    }

    /// Parse and validate header and item count.
    ///
    /// Fails on a wrong magic, unknown flag bits, a byte order other than the
    /// host's, or an item count of zero.
    pub fn decode(bytes: &[u8]) -> Result<Self, PackError> {
        let mut c = ByteCursor::new(bytes, Endian::NATIVE);
        let too_short = |_| PackError::bad_format("file too short for an archive header");

        let magic = c.read_bytes(MAGIC.len()).map_err(too_short)?;
        if magic != MAGIC {
            return Err(PackError::bad_format(format!(
                "invalid magic: expected {:02X?}, got {magic:02X?}",
                MAGIC
            )));
        }

        let raw_flags = c.read_u8().map_err(too_short)?;
        let flags = FormatFlags::from_bits(raw_flags).ok_or_else(|| {
            PackError::bad_format(format!("unknown format flags {raw_flags:#04X}"))
        })?;
        if flags.endian() != Endian::NATIVE {
            return Err(PackError::bad_format(format!(
                "archive is {}, host is {}",
                flags.endian().name(),
                Endian::NATIVE.name()
            )));
        }

        c.read_bytes(3).map_err(too_short)?;
        let build_number = c.read_u32().map_err(too_short)?;
        let item_count = c.read_u64().map_err(too_short)?;
        if item_count == 0 {
            return Err(PackError::bad_format("archive holds no items"));
        }

        Ok(Self {
            flags,
            build_number,
            item_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode() {
        let h = Header::new(4242, 3);
        let bytes = h.encode();
        assert_eq!(bytes.len(), HEADER_SIZE + COUNT_SIZE);
        assert_eq!(&bytes[..4], b"APAK");
        assert_eq!(Header::decode(&bytes).unwrap(), h);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = Header::new(1, 1).encode();
        bytes[0] = b'Z';
        assert!(matches!(Header::decode(&bytes), Err(PackError::BadFormat(_))));
    }

    #[test]
    fn rejects_foreign_byte_order() {
        let mut bytes = Header::new(1, 1).encode();
        bytes[4] ^= FormatFlags::BIG_ENDIAN.bits();
        let err = Header::decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("host is"), "{err}");
    }

    #[test]
    fn rejects_unknown_flags() {
        let mut bytes = Header::new(1, 1).encode();
        bytes[4] |= 0x80;
        assert!(matches!(Header::decode(&bytes), Err(PackError::BadFormat(_))));
    }

    #[test]
    fn rejects_zero_items() {
        let bytes = Header::new(1, 0).encode();
        assert!(matches!(Header::decode(&bytes), Err(PackError::BadFormat(_))));
    }

    #[test]
    fn rejects_truncated() {
        let bytes = Header::new(1, 1).encode();
        assert!(matches!(Header::decode(&bytes[..15]), Err(PackError::BadFormat(_))));
        assert!(matches!(Header::decode(&[]), Err(PackError::BadFormat(_))));
    }

    #[test]
    fn reserved_bytes_are_ignored() {
        let mut bytes = Header::new(9, 2).encode();
        bytes[5..8].copy_from_slice(&[1, 2, 3]);
        assert_eq!(Header::decode(&bytes).unwrap().build_number, 9);
    }
}
