//! Fuzzy string scoring on a 0..=100 scale.
//!
//! `ratio` is the normalized Indel similarity (insertions/deletions only,
//! computed from the longest common subsequence). `token_set_ratio` compares
//! the sorted token intersection and differences so word order and repeated
//! words do not matter.

use std::collections::BTreeSet;

/// Normalized Indel similarity in 0..=100. Two empty strings score 100.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let lcs = lcs_len(&a, &b);
    let distance = total - 2 * lcs;
    100.0 * (1.0 - distance as f64 / total as f64)
}

/// Longest common subsequence length, two-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Token-set similarity in 0..=100.
///
/// Returns 100 when one token set is a subset of the other (and they share at
/// least one token); 0 when either side has no tokens.
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
        return 100.0;
    }

    let sect = intersection.join(" ");
    let ab = diff_ab.join(" ");
    let ba = diff_ba.join(" ");

    if sect.is_empty() {
        return ratio(&ab, &ba);
    }

    let sect_ab = format!("{} {}", sect, ab);
    let sect_ba = format!("{} {}", sect, ba);
    ratio(&sect_ab, &sect_ba)
        .max(ratio(&sect, &sect_ab))
        .max(ratio(&sect, &sect_ba))
}

/// Best-scoring choice: `(index, score)`. Ties keep the earliest choice.
pub fn best_match<'a, I>(query: &str, choices: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, f64)> = None;
    for (idx, choice) in choices.into_iter().enumerate() {
        let score = token_set_ratio(query, choice);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((idx, score));
            if score >= 100.0 {
                break;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_basics() {
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("abc", "abc"), 100.0);
        assert_eq!(ratio("abc", ""), 0.0);
        // lcs("kitten", "sitting") = 4, distance = 13 - 8 = 5
        let r = ratio("kitten", "sitting");
        assert!((r - 100.0 * (1.0 - 5.0 / 13.0)).abs() < 1e-9);
    }

    #[test]
    fn test_token_set_subset_scores_full() {
        assert_eq!(token_set_ratio("what are your opening hours", "opening hours"), 100.0);
        assert_eq!(token_set_ratio("hours opening", "opening hours"), 100.0);
    }

    #[test]
    fn test_token_set_empty_is_zero() {
        assert_eq!(token_set_ratio("", "hello"), 0.0);
        assert_eq!(token_set_ratio("   ", "hello"), 0.0);
    }

    #[test]
    fn test_token_set_typo_scores_high() {
        let score = token_set_ratio("helo there", "hello there");
        assert!(score > 70.0, "score was {}", score);
        let score = token_set_ratio("quantum physics", "order pizza");
        assert!(score < 50.0, "score was {}", score);
    }

    #[test]
    fn test_best_match_prefers_first_on_tie() {
        let choices = ["good morning", "good morning", "bye"];
        let (idx, score) = best_match("good morning", choices.iter().copied()).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(score, 100.0);
        assert!(best_match("x", std::iter::empty()).is_none());
    }
}
