// Growth-only scratch buffer.
//
// Sized to the largest request seen so far and never shrunk while the owning
// handle is open, so repeated retrievals stop allocating once the biggest
// item has been read.

use super::error::PackError;

#[derive(Debug, Default)]
pub struct ScratchBuffer {
    buf: Vec<u8>,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow to at least `needed` bytes and return the first `needed` bytes.
    ///
    /// Contents are unspecified; callers overwrite what they use.
    pub fn ensure_capacity(&mut self, needed: usize) -> Result<&mut [u8], PackError> {
        if needed > self.buf.len() {
            let extra = needed - self.buf.len();
            self.buf
                .try_reserve_exact(extra)
                .map_err(PackError::alloc(needed))?;
            self.buf.resize(needed, 0);
        }
        Ok(&mut self.buf[..needed])
    }

    /// High-water mark in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Free the buffer.
    pub fn release(&mut self) {
        self.buf = Vec::new();
    }
}
