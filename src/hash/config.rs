// Match-finder profiles.
//
// Each profile bounds how hard the finder searches at one position and
// whether the encoder checks the following position before committing.

/// Minimum match length. Shorter candidates are never emitted.
pub const MIN_MATCH: usize = 4;

/// Bits of the 4-byte prefix hash. The head table holds `1 << HASH_BITS` buckets.
pub const HASH_BITS: u32 = 16;

/// Multiplicative hash constant (odd, golden-ratio derived).
pub const HASH_MULTIPLIER: u32 = 0x9E37_79B1;

/// Back-reference window. Distances are 17-bit, so the farthest reachable
/// position is `WINDOW_SIZE - 1` bytes behind the cursor.
pub const WINDOW_SIZE: usize = 1 << 17;

/// Largest encodable match distance.
pub const MAX_DISTANCE: usize = WINDOW_SIZE - 1;

/// Highest effort level.
pub const MAX_LEVEL: u32 = 9;

/// Matcher profile configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Name for display purposes.
    pub name: &'static str,
    /// Maximum number of chain entries inspected per search.
    pub max_chain: usize,
    /// Whether to walk the per-position chain at all. When false only the
    /// bucket head is inspected.
    pub chained: bool,
    /// Probe `pos + 1` before committing a match at `pos`.
    pub lazy: bool,
}

/// Single-pass profile: bucket head only, one-step lazy check.
pub const FAST: MatcherConfig = MatcherConfig {
    name: "fast",
    max_chain: 1,
    chained: false,
    lazy: true,
};

/// Profile for an effort level.
///
/// Levels 1-9 walk up to `2^level` chain entries; levels 5 and above add the
/// one-position lazy check. Out-of-range levels are clamped into 1..=9.
pub fn config_for_level(level: u32) -> MatcherConfig {
    let level = level.clamp(1, MAX_LEVEL);
    MatcherConfig {
        name: LEVEL_NAMES[level as usize - 1],
        max_chain: 1 << level,
        chained: true,
        lazy: level >= 5,
    }
}

const LEVEL_NAMES: [&str; MAX_LEVEL as usize] = [
    "level-1", "level-2", "level-3", "level-4", "level-5", "level-6", "level-7", "level-8",
    "level-9",
];
