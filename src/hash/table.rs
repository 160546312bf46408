// Hash-chained position index.
//
// `head[bucket]` holds the most recent position whose 4-byte prefix hashes to
// `bucket`. `prev[pos & WINDOW_MASK]` holds the position that was the head
// before `pos` was inserted, so a search can walk backwards through every
// earlier occurrence still inside the window.
//
// Stored values carry a +1 offset so that 0 means "empty".

use super::config::{HASH_BITS, HASH_MULTIPLIER, MAX_DISTANCE, MIN_MATCH, WINDOW_SIZE};

const SLOT_OFFSET: u32 = 1;
const WINDOW_MASK: usize = WINDOW_SIZE - 1;

/// Hash of the 4 bytes at the start of `window`, read as little-endian.
///
/// `window` must hold at least `MIN_MATCH` bytes.
#[inline(always)]
pub fn hash4(window: &[u8]) -> usize {
    let v = u32::from_le_bytes([window[0], window[1], window[2], window[3]]);
    (v.wrapping_mul(HASH_MULTIPLIER) >> (32 - HASH_BITS)) as usize
}

/// Head table plus optional per-position chain.
pub struct HashChain {
    head: Vec<u32>,
    /// Only allocated for chained profiles.
    prev: Option<Vec<u32>>,
}

impl HashChain {
    /// Create an empty index. `chained` allocates the backward chain.
    pub fn new(chained: bool) -> Self {
        Self {
            head: vec![0u32; 1 << HASH_BITS],
            prev: chained.then(|| vec![0u32; WINDOW_SIZE]),
        }
    }

    /// Forget every indexed position.
    pub fn reset(&mut self) {
        self.head.fill(0);
        if let Some(ref mut prev) = self.prev {
            prev.fill(0);
        }
    }

    /// Most recent position stored under `bucket`.
    #[inline(always)]
    pub fn lookup(&self, bucket: usize) -> Option<usize> {
        match self.head[bucket] {
            0 => None,
            v => Some((v - SLOT_OFFSET) as usize),
        }
    }

    /// Record `pos` as the newest position for `bucket`.
    ///
    /// Positions that do not fit the 32-bit slot are silently not indexed.
    #[inline(always)]
    pub fn insert(&mut self, bucket: usize, pos: usize) {
        let Some(stored) = u32::try_from(pos)
            .ok()
            .and_then(|p| p.checked_add(SLOT_OFFSET))
        else {
            return;
        };
        if let Some(ref mut prev) = self.prev {
            prev[pos & WINDOW_MASK] = self.head[bucket];
        }
        self.head[bucket] = stored;
    }

    /// The occurrence inserted before `pos` in the same bucket.
    ///
    /// Returns `None` when the chain ends, when the slot was recycled by a
    /// newer position, or when the entry is out of reach of `current`.
    #[inline]
    pub fn chain_prev(&self, pos: usize, current: usize) -> Option<usize> {
        let prev = self.prev.as_ref()?;
        let val = prev[pos & WINDOW_MASK];
        if val == 0 {
            return None;
        }
        let prev_pos = (val - SLOT_OFFSET) as usize;
        if prev_pos >= pos {
            return None;
        }
        if current - prev_pos > MAX_DISTANCE {
            return None;
        }
        Some(prev_pos)
    }

    /// Whether the backward chain is maintained.
    pub fn is_chained(&self) -> bool {
        self.prev.is_some()
    }
}

/// Number of leading bytes `a` and `b` share, up to `limit`.
#[inline]
pub fn common_prefix(a: &[u8], b: &[u8], limit: usize) -> usize {
    let limit = limit.min(a.len()).min(b.len());
    let mut n = 0;
    // Eight bytes at a time, then the tail.
    while n + 8 <= limit {
        let x = u64::from_le_bytes(a[n..n + 8].try_into().unwrap_or([0; 8]));
        let y = u64::from_le_bytes(b[n..n + 8].try_into().unwrap_or([0; 8]));
        let diff = x ^ y;
        if diff != 0 {
            return n + (diff.trailing_zeros() / 8) as usize;
        }
        n += 8;
    }
    while n < limit && a[n] == b[n] {
        n += 1;
    }
    n
}

/// Whether `data[pos..]` holds enough bytes to be hashed.
#[inline(always)]
pub fn hashable(data: &[u8], pos: usize) -> bool {
    pos + MIN_MATCH <= data.len()
}
