// Longest-match search over a single input buffer.
//
// The finder indexes positions lazily: `advance_to(data, pos)` inserts every
// position before `pos` that has not been indexed yet, so callers may skip
// over matched spans and still have them available as future references.

use super::config::{MAX_DISTANCE, MIN_MATCH, MatcherConfig};
use super::table::{self, HashChain};

/// A back-reference candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Bytes back from the current position. Always in `1..=MAX_DISTANCE`.
    pub distance: usize,
    /// Number of bytes matched. Always `>= MIN_MATCH`.
    pub length: usize,
}

/// Hash-chained longest-match finder.
pub struct MatchFinder {
    config: MatcherConfig,
    chain: HashChain,
    /// First position not yet inserted into the index.
    next_insert: usize,
    /// Upper bound on returned match lengths.
    max_length: usize,
}

impl MatchFinder {
    /// Create a finder for the given profile.
    ///
    /// `max_length` caps reported lengths (the token format's longest match).
    pub fn new(config: MatcherConfig, max_length: usize) -> Self {
        Self {
            config,
            chain: HashChain::new(config.chained),
            next_insert: 0,
            max_length: max_length.max(MIN_MATCH),
        }
    }

    /// The active profile.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Prepare for a new buffer.
    pub fn reset(&mut self) {
        self.chain.reset();
        self.next_insert = 0;
    }

    /// Index every hashable position in `next_insert..pos`.
    #[inline]
    pub fn advance_to(&mut self, data: &[u8], pos: usize) {
        while self.next_insert < pos {
            let p = self.next_insert;
            if !table::hashable(data, p) {
                // Nothing further can be hashed either.
                self.next_insert = pos;
                break;
            }
            self.chain.insert(table::hash4(&data[p..]), p);
            self.next_insert += 1;
        }
    }

    /// Best match for `data[pos..]` among indexed earlier positions.
    ///
    /// Walks at most `max_chain` candidates. Candidates further back than
    /// `MAX_DISTANCE` end the walk. Returns `None` if nothing of at least
    /// `MIN_MATCH` bytes was found.
    pub fn find(&self, data: &[u8], pos: usize) -> Option<Match> {
        if !table::hashable(data, pos) {
            return None;
        }
        let limit = (data.len() - pos).min(self.max_length);
        let target = &data[pos..];
        let mut budget = self.config.max_chain;
        let mut best: Option<Match> = None;
        let mut candidate = self.chain.lookup(table::hash4(target));

        while let Some(cand) = candidate {
            if cand >= pos || pos - cand > MAX_DISTANCE || budget == 0 {
                break;
            }
            budget -= 1;

            let best_len = best.map_or(MIN_MATCH - 1, |m| m.length);
            // Cheap reject: the byte that would extend the current best must match.
            if data[cand + best_len.min(limit - 1)] == target[best_len.min(limit - 1)] {
                let len = table::common_prefix(&data[cand..], target, limit);
                if len > best_len {
                    best = Some(Match {
                        distance: pos - cand,
                        length: len,
                    });
                    if len >= limit {
                        break;
                    }
                }
            }

            if !self.config.chained {
                break;
            }
            candidate = self.chain.chain_prev(cand, pos);
        }

        best
    }
}
