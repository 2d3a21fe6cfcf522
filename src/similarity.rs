//! Multi-metric similarity scoring over normalized keys.
//!
//! Each metric is vulnerable to a different naming variation (token
//! reordering, duplicated words, truncation, embedded extra words), so the
//! combined score takes the maximum across all of them.

use std::collections::BTreeSet;

/// Minimum combined score for a file candidate to count as a confirmed match.
pub const ACCEPT_THRESHOLD: f64 = 0.90;

/// Combined similarity between two normalized keys, in [0, 1].
///
/// Maximum of the token-set, token-sort, partial and sequence ratios plus a
/// normalized Levenshtein signal. Guaranteed to return 1.0 when both keys
/// are equal and non-empty.
pub fn similarity(a: &str, b: &str) -> f64 {
    let scores = [
        token_set_ratio(a, b),
        token_sort_ratio(a, b),
        partial_ratio(a, b),
        seq_ratio(a, b),
        strsim::normalized_levenshtein(a, b),
    ];
    scores.into_iter().fold(0.0, f64::max).min(1.0)
}

/// Sequence ratio in the style of difflib: `2 * M / T` where `M` is the
/// total length of the recursively longest matching blocks and `T` the
/// combined length of both inputs.
pub fn seq_ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Similarity with both token sequences sorted first, defeating reordering.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    seq_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Order- and duplicate-insensitive token overlap, following the
/// intersection/remainder construction of the classic fuzzy matchers.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return if tokens_a == tokens_b { 1.0 } else { 0.0 };
    }

    let common: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    let base = common.join(" ");
    let combined_a = join_parts(&base, &only_a);
    let combined_b = join_parts(&base, &only_b);

    seq_ratio(&base, &combined_a)
        .max(seq_ratio(&base, &combined_b))
        .max(seq_ratio(&combined_a, &combined_b))
}

/// Best-aligned substring similarity: slides the shorter key across the
/// longer one and keeps the best window ratio.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut best = 0.0_f64;
    for window in longer.windows(shorter.len()) {
        let score = ratio_chars(shorter, window);
        if score > best {
            best = score;
        }
        if best >= 1.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join_parts(base: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        rest.join(" ")
    } else {
        format!("{} {}", base, rest.join(" "))
    }
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_len(a, b) as f64 / total as f64
}

/// Total length of matching blocks: take the longest common block, then
/// recurse into the unmatched regions on either side of it.
fn matching_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (ai, bi, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_len(&a[..ai], &b[..bi]) + matching_len(&a[ai + len..], &b[bi + len..])
}

/// Longest common contiguous block between `a` and `b`, earliest on ties.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                let run = prev[j] + 1;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
                run
            } else {
                0
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflexivity() {
        for k in ["a", "artist song title", "x y z 123"] {
            assert_eq!(similarity(k, k), 1.0, "similarity({k:?}, {k:?})");
            assert_eq!(seq_ratio(k, k), 1.0);
            assert_eq!(token_sort_ratio(k, k), 1.0);
            assert_eq!(token_set_ratio(k, k), 1.0);
            assert_eq!(partial_ratio(k, k), 1.0);
        }
    }

    #[test]
    fn test_empty_keys_score_zero() {
        assert_eq!(seq_ratio("", "abc"), 0.0);
        assert_eq!(partial_ratio("abc", ""), 0.0);
        assert_eq!(token_set_ratio("", "abc"), 0.0);
        assert_eq!(token_sort_ratio("abc", ""), 0.0);
        assert_eq!(similarity("", "song title"), 0.0);
    }

    #[test]
    fn test_token_sort_defeats_reordering() {
        assert_eq!(token_sort_ratio("artist song title", "song title artist"), 1.0);
        assert_eq!(similarity("artist song title", "title song artist"), 1.0);
    }

    #[test]
    fn test_token_set_ignores_duplicates() {
        assert_eq!(token_set_ratio("song song title", "title song"), 1.0);
    }

    #[test]
    fn test_seq_ratio_known_value() {
        // blocks: "bcd" -> 2 * 3 / 8
        assert!((seq_ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_partial_finds_embedded_title() {
        // best window "songtitler": blocks "song" + "title" -> 2 * 9 / 20
        let score = partial_ratio("song title", "artistsongtitleremastered");
        assert!((score - 0.90).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_unrelated_keys_stay_low() {
        assert!(similarity("alpha band midnight", "completely other words") < 0.5);
    }
}
