// Block compressor.
//
// Greedy parse over a `MatchFinder` with an optional one-position lazy
// check: before committing a match at `pos`, look at `pos + 1` and defer by one
// literal when that yields a strictly longer match.

use log::trace;
use thiserror::Error;

use super::token::{self, MAX_LITERAL_RUN, MAX_MATCH_LEN};
use crate::hash::config::{self, FAST, MIN_MATCH, MatcherConfig};
use crate::hash::matching::MatchFinder;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Compression strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Never compress; every item is stored raw.
    Store,
    /// Single-pass: bucket head only, one-step lazy check.
    Fast,
    /// Chain walk of `2^level` entries (1..=9, clamped).
    Level(u32),
}

impl Default for Compression {
    fn default() -> Self {
        Self::Level(config::MAX_LEVEL)
    }
}

impl Compression {
    /// Matcher profile, or `None` for `Store`.
    pub fn matcher(self) -> Option<MatcherConfig> {
        match self {
            Self::Store => None,
            Self::Fast => Some(FAST),
            Self::Level(level) => Some(config::config_for_level(level)),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// An incompressible stretch too long for one token's run field.
    #[error("literal run of {run} bytes at offset {offset} exceeds the token limit")]
    LiteralRunTooLong { offset: usize, run: usize },
}

// ---------------------------------------------------------------------------
// BlockEncoder
// ---------------------------------------------------------------------------

/// Reusable block compressor.
///
/// The hash index is allocated once and reset between inputs.
pub struct BlockEncoder {
    finder: MatchFinder,
}

impl BlockEncoder {
    /// Create an encoder for the given profile.
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            finder: MatchFinder::new(config, MAX_MATCH_LEN),
        }
    }

    /// Compress `input` into a fresh token stream.
    pub fn compress(&mut self, input: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(input.len() / 2 + 16);
        self.compress_into(input, &mut out)?;
        Ok(out)
    }

    /// Compress `input`, appending the token stream to `out`.
    pub fn compress_into(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.finder.reset();
        let lazy = self.finder.config().lazy;
        let n = input.len();

        let mut pos = 0usize;
        let mut anchor = 0usize;
        let mut tokens = 0usize;

        while pos + MIN_MATCH <= n {
            self.finder.advance_to(input, pos);
            let Some(mut best) = self.finder.find(input, pos) else {
                pos += 1;
                continue;
            };

            if lazy && pos + 1 + MIN_MATCH <= n {
                self.finder.advance_to(input, pos + 1);
                if let Some(next) = self.finder.find(input, pos + 1)
                    && next.length > best.length
                {
                    pos += 1;
                    best = next;
                }
            }

            let run = pos - anchor;
            if run > MAX_LITERAL_RUN {
                return Err(EncodeError::LiteralRunTooLong {
                    offset: anchor,
                    run,
                });
            }
            token::write_token(out, &input[anchor..pos], Some((best.distance, best.length)));
            tokens += 1;

            pos += best.length;
            anchor = pos;
        }

        if anchor < n {
            let run = n - anchor;
            if run > MAX_LITERAL_RUN {
                return Err(EncodeError::LiteralRunTooLong {
                    offset: anchor,
                    run,
                });
            }
            token::write_token(out, &input[anchor..], None);
            tokens += 1;
        }

        trace!(
            "compressed {} -> {} bytes in {tokens} tokens ({})",
            n,
            out.len(),
            self.finder.config().name
        );
        Ok(())
    }
}

/// Compress `input` with a one-shot encoder.
///
/// `Compression::Store` yields a single literal-only token stream.
pub fn compress(input: &[u8], compression: Compression) -> Result<Vec<u8>, EncodeError> {
    match compression.matcher() {
        Some(config) => BlockEncoder::new(config).compress(input),
        None => {
            let mut out = Vec::with_capacity(input.len() + 8);
            if input.len() > MAX_LITERAL_RUN {
                return Err(EncodeError::LiteralRunTooLong {
                    offset: 0,
                    run: input.len(),
                });
            }
            if !input.is_empty() {
                token::write_token(&mut out, input, None);
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::decoder::decompress;

    fn roundtrip(data: &[u8], compression: Compression) -> Vec<u8> {
        let packed = compress(data, compression).unwrap();
        let restored = decompress(&packed, data.len()).unwrap();
        assert_eq!(restored, data, "{compression:?}");
        packed
    }

    fn all_strategies() -> Vec<Compression> {
        let mut v = vec![Compression::Store, Compression::Fast];
        v.extend((1..=9).map(Compression::Level));
        v
    }

    #[test]
    fn empty_input() {
        for c in all_strategies() {
            assert!(roundtrip(b"", c).is_empty());
        }
    }

    #[test]
    fn single_byte() {
        for c in all_strategies() {
            assert_eq!(roundtrip(b"Q", c), [0b001_0_0000, b'Q']);
        }
    }

    #[test]
    fn zeros_compress_well() {
        let data = vec![0u8; 4096];
        for c in all_strategies().into_iter().skip(1) {
            let packed = roundtrip(&data, c);
            assert!(packed.len() < 16, "{c:?}: {} bytes", packed.len());
        }
    }

    #[test]
    fn text_repeats() {
        let data = b"the quick brown fox jumps over the lazy dog; the quick brown fox naps".repeat(20);
        for c in all_strategies() {
            roundtrip(&data, c);
        }
        let packed = compress(&data, Compression::default()).unwrap();
        assert!(packed.len() < data.len() / 4);
    }

    #[test]
    fn pseudo_random_roundtrip() {
        let mut s = 0x1234_5678_u64;
        let data: Vec<u8> = (0..20_000)
            .map(|_| {
                s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (s >> 56) as u8
            })
            .collect();
        for c in all_strategies() {
            roundtrip(&data, c);
        }
    }

    #[test]
    fn distances_beyond_sixteen_bits() {
        // A 2 KiB block repeated after 100 KiB of noise forces 17-bit distances.
        let mut s = 99u64;
        let mut noise = || {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
            (s >> 33) as u8
        };
        let block: Vec<u8> = (0..2048).map(|_| noise()).collect();
        let mut data = block.clone();
        data.extend((0..100_000).map(|_| noise()));
        data.extend_from_slice(&block);
        let packed = roundtrip(&data, Compression::Level(9));
        assert!(packed.len() < data.len());
    }

    #[test]
    fn encoder_is_deterministic_and_reusable() {
        let data = b"deterministic deterministic deterministic output".repeat(8);
        let mut enc = BlockEncoder::new(config::config_for_level(7));
        let a = enc.compress(&data).unwrap();
        let b = enc.compress(&data).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, compress(&data, Compression::Level(7)).unwrap());
    }

    /// Walk a well-formed token stream and collect `(distance, length)` of
    /// every match in order.
    fn matches_in(stream: &[u8], raw_len: usize) -> Vec<(usize, usize)> {
        use crate::block::token::{LENGTH_INLINE_MAX, RUN_INLINE_MAX, TokenHeader};
        use crate::block::varint;

        let mut found = Vec::new();
        let (mut ip, mut op) = (0usize, 0usize);
        while op < raw_len {
            let header = TokenHeader(stream[ip]);
            ip += 1;
            let mut run = header.run_field();
            if run == RUN_INLINE_MAX {
                let (extra, used) = varint::read_u32(&stream[ip..]).unwrap();
                ip += used;
                run += extra as usize;
            }
            ip += run;
            op += run;
            if op == raw_len {
                break;
            }
            let mut length = header.length_field();
            if length == LENGTH_INLINE_MAX {
                let (extra, used) = varint::read_u32(&stream[ip..]).unwrap();
                ip += used;
                length += extra as usize;
            }
            length += MIN_MATCH;
            let distance =
                usize::from(u16::from_le_bytes([stream[ip], stream[ip + 1]])) | header.distance_high();
            ip += 2;
            found.push((distance, length));
            op += length;
        }
        assert_eq!(ip, stream.len());
        found
    }

    #[test]
    fn lazy_levels_defer_for_a_longer_match() {
        // At offset 30 "abcd" repeats 10 back, but offset 31 starts a
        // 10-byte repeat of the opening "bcdefghijk".
        let data = b"bcdefghijk__________abcdZZZZZZabcdefghijk";

        let greedy = roundtrip(data, Compression::Level(4));
        let greedy_matches = matches_in(&greedy, data.len());
        assert!(greedy_matches.contains(&(10, 4)), "{greedy_matches:?}");
        assert!(greedy_matches.contains(&(31, 7)), "{greedy_matches:?}");
        assert!(greedy.ends_with(&[0x03, 0x1f, 0x00]));

        let lazy = roundtrip(data, Compression::Level(5));
        let lazy_matches = matches_in(&lazy, data.len());
        assert!(!lazy_matches.contains(&(10, 4)), "{lazy_matches:?}");
        assert_eq!(lazy_matches.last(), Some(&(31, 10)));
        // One literal 'a', then the 10-byte match 31 back.
        assert!(lazy.ends_with(&[0x26, b'a', 0x1f, 0x00]));
        assert!(lazy.len() < greedy.len());
    }

    #[test]
    fn fast_checks_only_the_bucket_head() {
        // "abcd" at 8 is the most recent candidate for offset 18, while the
        // full 8-byte repeat sits at 0. "bcde" at 13 keeps the lazy step
        // from finding anything longer either.
        let data = b"abcdefghabcdXbcdeYabcdefgh";

        let fast = roundtrip(data, Compression::Fast);
        let fast_matches = matches_in(&fast, data.len());
        assert!(fast_matches.contains(&(10, 4)), "{fast_matches:?}");
        assert!(fast_matches.iter().all(|&(_, len)| len < 8), "{fast_matches:?}");

        let chained = roundtrip(data, Compression::Level(9));
        let chained_matches = matches_in(&chained, data.len());
        assert_eq!(chained_matches.last(), Some(&(18, 8)));
        assert!(chained.len() < fast.len());
    }
}
