//! Keyword relevance: how much of the reference vocabulary the answer covers.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("valid word pattern"));

/// Fraction of the reference's distinct `\w+` tokens that also occur in the
/// candidate. Duplicates are ignored on both sides; `0.0` when the reference
/// has no tokens.
pub fn keyword_relevance(candidate: &str, reference: &str) -> f64 {
    let reference_words = word_set(reference);
    if reference_words.is_empty() {
        return 0.0;
    }
    let candidate_words = word_set(candidate);
    let common = reference_words
        .iter()
        .filter(|w| candidate_words.contains(*w))
        .count();
    common as f64 / reference_words.len() as f64
}

fn word_set(text: &str) -> HashSet<&str> {
    WORD_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_coverage() {
        assert_eq!(keyword_relevance("the cat sat", "the cat sat"), 1.0);
    }

    #[test]
    fn test_duplicates_ignored() {
        // Reference set {the, cat}; candidate covers "the" only.
        assert_eq!(keyword_relevance("the the the", "the cat the"), 0.5);
    }

    #[test]
    fn test_no_reference_tokens() {
        assert_eq!(keyword_relevance("anything", "!!! ..."), 0.0);
    }

    #[test]
    fn test_unicode_words() {
        assert_eq!(keyword_relevance("日本語 です", "日本語"), 1.0);
    }
}
