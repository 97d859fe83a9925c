//! Fuzzy Matcher
//!
//! Token-order-insensitive similarity between a normalized facility name and
//! announcement filename stems.
//!
//! **Scoring (token sort ratio):**
//! 1. Pre-process both strings: drop non-ASCII characters, lowercase, turn
//!    every non-alphanumeric character into a space
//! 2. Split on whitespace, sort the tokens, rejoin with single spaces
//! 3. Indel ratio of the two keys: `2 * LCS / (len_a + len_b)`, scaled to
//!    0-100 and rounded half-to-even
//!
//! The LCS is computed bit-parallel over 64-bit blocks, with the query's
//! character masks built once per lookup.

use std::borrow::Cow;

/// Minimum score accepted for an automatic link
pub const DEFAULT_MIN_SCORE: u8 = 91;

/// Best candidate for a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Candidate text exactly as supplied
    pub candidate: String,
    /// Similarity score (0-100)
    pub score: u8,
}

/// Anything that can be scored against a query
///
/// Implementors holding a precomputed sort key override [`Candidate::sort_key`]
/// to skip re-processing the text on every lookup.
pub trait Candidate {
    /// Text returned in the match result
    fn text(&self) -> &str;

    /// Token-sorted comparison key of [`Candidate::text`]
    fn sort_key(&self) -> Cow<'_, str> {
        Cow::Owned(token_sort_key(self.text()))
    }
}

impl Candidate for str {
    fn text(&self) -> &str {
        self
    }
}

impl Candidate for String {
    fn text(&self) -> &str {
        self
    }
}

impl<T: Candidate + ?Sized> Candidate for &T {
    fn text(&self) -> &str {
        (**self).text()
    }

    fn sort_key(&self) -> Cow<'_, str> {
        (**self).sort_key()
    }
}

/// Fuzzy matcher with a fixed acceptance threshold
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    min_score: u8,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SCORE)
    }
}

impl FuzzyMatcher {
    /// Create matcher accepting scores of at least `min_score`
    pub fn new(min_score: u8) -> Self {
        Self {
            min_score: min_score.min(100),
        }
    }

    pub fn min_score(&self) -> u8 {
        self.min_score
    }

    /// Find the best candidate for `query`
    ///
    /// **Algorithm:**
    /// 1. Build the query key and its bit masks once
    /// 2. Score every candidate, skipping those whose length bound cannot
    ///    beat the current best or reach the threshold
    /// 3. Keep the strictly highest score (first occurrence wins ties)
    ///
    /// Returns `None` for an empty candidate list, or when the best score is
    /// below the threshold.
    pub fn best_match<C: Candidate>(&self, query: &str, candidates: &[C]) -> Option<MatchResult> {
        let query_key = token_sort_key(query);
        if query_key.is_empty() {
            return None;
        }
        let pattern = BitPattern::new(query_key.as_bytes());

        let mut best: Option<(usize, u8)> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let key = candidate.sort_key();
            if key.is_empty() {
                continue;
            }

            let total = query_key.len() + key.len();
            let upper_bound = ratio_score(query_key.len().min(key.len()), total);
            let needed = match best {
                Some((_, score)) => score.saturating_add(1).max(self.min_score),
                None => self.min_score,
            };
            if upper_bound < needed {
                continue;
            }

            let score = ratio_score(pattern.lcs(key.as_bytes()), total);
            if score >= needed && best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((index, score));
                if score == 100 {
                    break;
                }
            }
        }

        best.map(|(index, score)| MatchResult {
            candidate: candidates[index].text().to_string(),
            score,
        })
    }
}

/// Convenience wrapper around [`FuzzyMatcher::best_match`]
pub fn best_match<C: Candidate>(query: &str, candidates: &[C], min_score: u8) -> Option<MatchResult> {
    FuzzyMatcher::new(min_score).best_match(query, candidates)
}

/// Token sort ratio of two raw strings (0-100)
///
/// Either string empty after pre-processing scores 0.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    let key_a = token_sort_key(a);
    let key_b = token_sort_key(b);
    if key_a.is_empty() || key_b.is_empty() {
        return 0;
    }
    let lcs = BitPattern::new(key_a.as_bytes()).lcs(key_b.as_bytes());
    ratio_score(lcs, key_a.len() + key_b.len())
}

/// Pre-processed, token-sorted comparison key
pub fn token_sort_key(text: &str) -> String {
    let processed: String = text
        .chars()
        .filter(char::is_ascii)
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();

    let mut tokens: Vec<&str> = processed.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// `200 * lcs / total` rounded half-to-even
fn ratio_score(lcs: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let numerator = 200 * lcs;
    let quotient = numerator / total;
    let twice_remainder = 2 * (numerator % total);

    let rounded = if twice_remainder > total || (twice_remainder == total && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };

    rounded.min(100) as u8
}

/// Per-character bit masks of an ASCII pattern, in 64-bit blocks
struct BitPattern {
    len: usize,
    blocks: usize,
    masks: Vec<u64>,
}

impl BitPattern {
    fn new(pattern: &[u8]) -> Self {
        let blocks = pattern.len().div_ceil(64).max(1);
        let mut masks = vec![0u64; 128 * blocks];
        for (position, &byte) in pattern.iter().enumerate() {
            let slot = usize::from(byte & 0x7f) * blocks + position / 64;
            masks[slot] |= 1u64 << (position % 64);
        }
        Self {
            len: pattern.len(),
            blocks,
            masks,
        }
    }

    /// Length of the longest common subsequence with `text`
    fn lcs(&self, text: &[u8]) -> usize {
        let mut state = vec![u64::MAX; self.blocks];

        for &byte in text {
            let start = usize::from(byte & 0x7f) * self.blocks;
            let mask = &self.masks[start..start + self.blocks];

            let mut carry = false;
            for (word, &m) in state.iter_mut().zip(mask) {
                let matched = *word & m;
                let (sum, overflow_a) = word.overflowing_add(matched);
                let (sum, overflow_b) = sum.overflowing_add(u64::from(carry));
                carry = overflow_a || overflow_b;
                *word = sum | (*word & !m);
            }
        }

        state
            .iter()
            .enumerate()
            .map(|(block, word)| {
                let bits = (self.len - block * 64).min(64);
                let valid = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
                (!word & valid).count_ones() as usize
            })
            .sum()
    }
}
