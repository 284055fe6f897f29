//! Approximate string metrics over normalized titles.
//!
//! Every function here takes already-normalized input and returns a value in
//! `[0, 1]`. Empty-input conventions are fixed explicitly rather than left to
//! the underlying `rapidfuzz` implementation: distance-based metrics treat two
//! empty strings as identical (1.0), token-based metrics treat a side without
//! tokens as carrying no signal (0.0).

use rapidfuzz::distance::{indel, jaro_winkler as jw, levenshtein};
use std::collections::BTreeSet;

/// Normalized Levenshtein similarity: `1 - distance / max(len)`.
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        _ => levenshtein::normalized_similarity(a.chars(), b.chars()),
    }
}

/// Jaro-Winkler similarity (prefix weight 0.1).
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        _ => jw::similarity(a.chars(), b.chars()),
    }
}

/// Indel ratio of the whitespace tokens after sorting, so word order is
/// ignored.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sorted_a = sorted_tokens(a);
    let sorted_b = sorted_tokens(b);
    if sorted_a.is_empty() || sorted_b.is_empty() {
        return 0.0;
    }
    rapidfuzz::fuzz::ratio(sorted_a.join(" ").chars(), sorted_b.join(" ").chars())
}

/// Token-set ratio: compares the shared token set against each side's
/// remainder, so duplicated or extra words cost little.
///
/// When one token set contains the other (and they share at least one token)
/// the ratio is 1.0.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 1.0;
    }

    let diff_ab_joined = diff_ab.join(" ");
    let diff_ba_joined = diff_ba.join(" ");
    let ab_len = diff_ab_joined.chars().count();
    let ba_len = diff_ba_joined.chars().count();
    let sect_len = intersection.join(" ").chars().count();

    // Length of "<intersection> <diff>" including the joining space
    let separator = usize::from(sect_len != 0);
    let sect_ab_len = sect_len + separator + ab_len;
    let sect_ba_len = sect_len + separator + ba_len;

    let total = sect_ab_len + sect_ba_len;
    let dist = indel::distance(diff_ab_joined.chars(), diff_ba_joined.chars());
    let result = if total > 0 {
        1.0 - dist as f64 / total as f64
    } else {
        0.0
    };

    if sect_len == 0 {
        return result;
    }

    // The intersection against "<intersection> <diff>" only differs by the
    // diff itself, so the indel distance is just its length.
    let sect_ab_ratio = 1.0 - (separator + ab_len) as f64 / (sect_len + sect_ab_len) as f64;
    let sect_ba_ratio = 1.0 - (separator + ba_len) as f64 / (sect_len + sect_ba_len) as f64;

    result.max(sect_ab_ratio).max(sect_ba_ratio)
}

/// Set Jaccard index; 0.0 when either side is empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    // =========================================================================
    // Empty-input conventions
    // =========================================================================

    #[test]
    fn test_empty_vs_empty() {
        assert_eq!(levenshtein_ratio("", ""), 1.0);
        assert_eq!(jaro_winkler("", ""), 1.0);
        assert_eq!(token_sort_ratio("", ""), 0.0);
        assert_eq!(token_set_ratio("", ""), 0.0);
    }

    #[test]
    fn test_empty_vs_nonempty() {
        assert_eq!(levenshtein_ratio("", "clean code"), 0.0);
        assert_eq!(jaro_winkler("clean code", ""), 0.0);
        assert_eq!(token_sort_ratio("", "clean code"), 0.0);
        assert_eq!(token_set_ratio("clean code", ""), 0.0);
    }

    // =========================================================================
    // Individual metrics
    // =========================================================================

    #[test]
    fn test_levenshtein_ratio() {
        assert_eq!(levenshtein_ratio("clean code", "clean code"), 1.0);
        // 12 insertions against a 22-char string
        let r = levenshtein_ratio("clean code", "clean code 2nd edition");
        assert!((r - (1.0 - 12.0 / 22.0)).abs() < EPS);
    }

    #[test]
    fn test_token_sort_ignores_order() {
        assert_eq!(token_sort_ratio("fast and slow", "slow and fast"), 1.0);
        assert!(token_sort_ratio("fast and slow", "slow and steady") < 1.0);
    }

    #[test]
    fn test_token_sort_ratio_value() {
        // "clean code" vs "2nd clean code edition": indel distance 12 over 32 chars
        let r = token_sort_ratio("clean code", "clean code 2nd edition");
        assert!((r - (1.0 - 12.0 / 32.0)).abs() < EPS);
    }

    #[test]
    fn test_token_set_subset_is_perfect() {
        assert_eq!(token_set_ratio("clean code", "clean code 2nd edition"), 1.0);
        assert_eq!(token_set_ratio("code code clean", "clean code"), 1.0);
    }

    #[test]
    fn test_token_set_disjoint() {
        // "ab" vs "cd": no shared characters, indel distance 4 over 4
        assert_eq!(token_set_ratio("ab", "cd"), 0.0);
    }

    #[test]
    fn test_token_set_partial_overlap() {
        let r = token_set_ratio("harry potter stone", "harry potter rock");
        assert!(r > 0.7 && r < 1.0, "got {r}");
    }

    #[test]
    fn test_jaro_winkler_bounds() {
        assert_eq!(jaro_winkler("martha", "martha"), 1.0);
        let r = jaro_winkler("martha", "marhta");
        assert!(r > 0.9 && r < 1.0, "got {r}");
    }

    #[test]
    fn test_metrics_symmetric() {
        let pairs = [
            ("harry potter and the philosopher s stone", "harry potter and the sorcerer s stone"),
            ("clean code", "the clean coder"),
            ("a", "b c d"),
        ];
        for (a, b) in pairs {
            assert!((levenshtein_ratio(a, b) - levenshtein_ratio(b, a)).abs() < EPS);
            assert!((jaro_winkler(a, b) - jaro_winkler(b, a)).abs() < EPS);
            assert!((token_sort_ratio(a, b) - token_sort_ratio(b, a)).abs() < EPS);
            assert!((token_set_ratio(a, b) - token_set_ratio(b, a)).abs() < EPS);
        }
    }

    #[test]
    fn test_jaccard() {
        let a: BTreeSet<char> = "abc".chars().collect();
        let b: BTreeSet<char> = "bcd".chars().collect();
        assert!((jaccard(&a, &b) - 0.5).abs() < EPS);
        assert_eq!(jaccard(&a, &BTreeSet::new()), 0.0);
    }
}
