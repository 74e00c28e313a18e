//! TF-IDF cosine similarity over a two-document corpus.
//!
//! Vectorization follows the common TF-IDF defaults: tokens are runs of two or
//! more word characters, term frequency is the raw count, idf is smoothed
//! (`ln((1 + n) / (1 + df)) + 1`) and every row is L2-normalized.

use crate::error::ScoringError;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"));

/// Cosine similarity between the TF-IDF vectors of `a` and `b`, fitted on
/// exactly `{a, b}`.
///
/// Returns [`ScoringError::Vectorization`] when neither document has a token
/// (empty vocabulary).
pub fn tfidf_cosine(a: &str, b: &str) -> Result<f64, ScoringError> {
    let docs = [term_counts(a), term_counts(b)];

    // Ordered vocabulary keeps float summation order stable across runs.
    let vocabulary: BTreeMap<&str, usize> = docs
        .iter()
        .flat_map(|d| d.keys().copied())
        .map(|term| {
            let df = docs.iter().filter(|d| d.contains_key(term)).count();
            (term, df)
        })
        .collect();

    if vocabulary.is_empty() {
        return Err(ScoringError::Vectorization {
            message: "empty vocabulary; documents contain no tokens".into(),
        });
    }

    let n_docs = docs.len() as f64;
    let vectors: Vec<Vec<f64>> = docs
        .iter()
        .map(|doc| {
            let weights: Vec<f64> = vocabulary
                .iter()
                .map(|(term, &df)| {
                    let tf = doc.get(term).copied().unwrap_or(0) as f64;
                    let idf = ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0;
                    tf * idf
                })
                .collect();
            l2_normalize(weights)
        })
        .collect();

    let dot: f64 = vectors[0]
        .iter()
        .zip(vectors[1].iter())
        .map(|(x, y)| x * y)
        .sum();

    if !dot.is_finite() {
        return Err(ScoringError::NonFinite {
            metric: "similarity",
        });
    }
    Ok(dot.clamp(0.0, 1.0))
}

fn term_counts(text: &str) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for m in TOKEN_PATTERN.find_iter(text) {
        *counts.entry(m.as_str()).or_insert(0) += 1;
    }
    counts
}

fn l2_normalize(mut v: Vec<f64>) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}
