//! Sentence-level BLEU and its lexical-F1 fallback.

use crate::tokenize::TextTokenizer;
use std::collections::{BTreeMap, BTreeSet};

/// Highest n-gram order (uniform 0.25 weights for 1..=4).
pub const MAX_ORDER: usize = 4;

/// How the `bleu` metric is computed, chosen once per calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleuStrategy {
    /// 4-gram sentence BLEU over tokenizer output.
    Sentence,
    /// Token-set F1 over whitespace-split words.
    LexicalF1,
}

impl BleuStrategy {
    /// Probe the tokenizer; fall back to lexical F1 if it cannot tokenize.
    pub fn select(tokenizer: &dyn TextTokenizer) -> Self {
        if tokenizer.is_available() {
            BleuStrategy::Sentence
        } else {
            tracing::warn!(
                tokenizer = tokenizer.name(),
                "Text tokenizer unavailable; using lexical F1 in place of BLEU"
            );
            BleuStrategy::LexicalF1
        }
    }

    /// Score lower-cased `candidate` against lower-cased `reference`.
    pub fn score(self, tokenizer: &dyn TextTokenizer, candidate: &str, reference: &str) -> f64 {
        match self {
            BleuStrategy::Sentence => {
                match (tokenizer.tokenize(candidate), tokenizer.tokenize(reference)) {
                    (Ok(cand), Ok(refs)) => sentence_bleu(&refs, &cand),
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::debug!(error = %e, "BLEU tokenization failed; using lexical F1");
                        whitespace_f1(candidate, reference)
                    }
                }
            }
            BleuStrategy::LexicalF1 => whitespace_f1(candidate, reference),
        }
    }
}

fn whitespace_f1(candidate: &str, reference: &str) -> f64 {
    let cand: Vec<&str> = candidate.split_whitespace().collect();
    let refs: Vec<&str> = reference.split_whitespace().collect();
    lexical_f1(&refs, &cand)
}

/// Sentence BLEU of `candidate` against a single `reference`.
///
/// BLEU = BP · exp(Σ wₙ ln pₙ) with clipped n-gram precisions pₙ. Candidates
/// shorter than four tokens are scored over the orders they can form, with the
/// weights re-normalized (`1/len` each). Any zero precision yields `0.0`.
pub fn sentence_bleu<T: AsRef<str> + Ord>(reference: &[T], candidate: &[T]) -> f64 {
    if candidate.is_empty() {
        return 0.0;
    }

    let orders = MAX_ORDER.min(candidate.len());
    let weight = 1.0 / orders as f64;
    let mut log_sum = 0.0;

    for n in 1..=orders {
        let (matches, total) = modified_precision(reference, candidate, n);
        if matches == 0 {
            return 0.0;
        }
        log_sum += weight * (matches as f64 / total as f64).ln();
    }

    (brevity_penalty(reference.len(), candidate.len()) * log_sum.exp()).clamp(0.0, 1.0)
}

/// Clipped n-gram matches and total candidate n-grams.
fn modified_precision<T: AsRef<str> + Ord>(
    reference: &[T],
    candidate: &[T],
    n: usize,
) -> (usize, usize) {
    let ref_counts = ngram_counts(reference, n);
    let cand_counts = ngram_counts(candidate, n);

    let matches = cand_counts
        .iter()
        .map(|(ngram, count)| (*count).min(ref_counts.get(ngram).copied().unwrap_or(0)))
        .sum();
    let total = candidate.len().saturating_sub(n - 1);
    (matches, total)
}

fn ngram_counts<T: Ord>(tokens: &[T], n: usize) -> BTreeMap<&[T], usize> {
    let mut counts = BTreeMap::new();
    if tokens.len() >= n {
        for window in tokens.windows(n) {
            *counts.entry(window).or_insert(0) += 1;
        }
    }
    counts
}

/// BP = 1 when the candidate is longer than the reference, exp(1 − r/c) otherwise.
fn brevity_penalty(ref_len: usize, cand_len: usize) -> f64 {
    if cand_len > ref_len {
        1.0
    } else if cand_len == 0 {
        0.0
    } else {
        (1.0 - ref_len as f64 / cand_len as f64).exp()
    }
}

/// Harmonic mean of token-set precision and recall.
pub fn lexical_f1<T: AsRef<str>>(reference: &[T], candidate: &[T]) -> f64 {
    let refs: BTreeSet<&str> = reference.iter().map(AsRef::as_ref).collect();
    let cand: BTreeSet<&str> = candidate.iter().map(AsRef::as_ref).collect();
    if refs.is_empty() || cand.is_empty() {
        return 0.0;
    }

    let common = cand.intersection(&refs).count() as f64;
    let precision = common / cand.len() as f64;
    let recall = common / refs.len() as f64;
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoringError;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_identical_sentence_scores_one() {
        let t = toks("the quick brown fox jumps over the lazy dog");
        assert_eq!(sentence_bleu(&t, &t), 1.0);
    }

    #[test]
    fn test_short_identical_sentence_reweighs() {
        let t = toks("the cat sat");
        assert_eq!(sentence_bleu(&t, &t), 1.0);
    }

    #[test]
    fn test_disjoint_is_zero() {
        assert_eq!(sentence_bleu(&toks("abc def"), &toks("xyz qrs")), 0.0);
    }

    #[test]
    fn test_missing_higher_order_match_is_zero() {
        // Unigrams overlap, bigrams do not.
        assert_eq!(sentence_bleu(&toks("a b c d"), &toks("d c b a")), 0.0);
    }

    #[test]
    fn test_brevity_penalty_applied() {
        let reference = toks("the cat sat on the mat today");
        let candidate = toks("the cat sat on the");
        let score = sentence_bleu(&reference, &candidate);
        let expected = (1.0_f64 - 7.0 / 5.0).exp();
        assert!((score - expected).abs() < 1e-12, "score = {score}");
    }

    #[test]
    fn test_clipped_counts() {
        // "the" appears twice in the candidate but once in the reference.
        let (matches, total) = modified_precision(&toks("the cat"), &toks("the the"), 1);
        assert_eq!((matches, total), (1, 2));
    }

    #[test]
    fn test_empty_candidate() {
        assert_eq!(sentence_bleu(&toks("a b"), &[] as &[String]), 0.0);
    }

    #[test]
    fn test_lexical_f1() {
        // P = 1/2, R = 1/3 -> F1 = 0.4
        let f1 = lexical_f1(&toks("a b c"), &toks("a z"));
        assert!((f1 - 0.4).abs() < 1e-12);
        assert_eq!(lexical_f1(&toks(""), &toks("a")), 0.0);
        assert_eq!(lexical_f1(&toks("a"), &toks("b")), 0.0);
    }

    struct BrokenTokenizer;

    impl TextTokenizer for BrokenTokenizer {
        fn tokenize(&self, _text: &str) -> Result<Vec<String>, ScoringError> {
            Err(ScoringError::Tokenizer {
                tokenizer: "broken".into(),
                message: "no model data".into(),
            })
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_probe_selects_fallback() {
        assert_eq!(
            BleuStrategy::select(&BrokenTokenizer),
            BleuStrategy::LexicalF1
        );
        assert_eq!(
            BleuStrategy::select(&crate::tokenize::TreebankTokenizer),
            BleuStrategy::Sentence
        );
    }

    #[test]
    fn test_sentence_strategy_degrades_on_tokenizer_error() {
        let score = BleuStrategy::Sentence.score(&BrokenTokenizer, "a b", "a b");
        assert_eq!(score, 1.0);
    }
}
