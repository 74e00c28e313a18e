//! Answer scoring: BLEU, TF-IDF similarity, keyword relevance and word count.
//!
//! [`ScoreCalculator`] is the only entry point. It never fails: every metric is
//! computed in isolation, and a metric that errors is logged and reported as
//! `0.0` without affecting the others.

pub mod bleu;
pub mod relevance;
pub mod similarity;

pub use bleu::BleuStrategy;

use crate::config::{ScoringConfig, TokenizerKind};
use crate::error::{LexiconError, ScoringError};
use crate::tokenize::{
    IpadicTokenizer, Lexicon, SegmentingTokenizer, TextTokenizer, TreebankTokenizer,
    WhitespaceTokenizer, WordTokenizer,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The four metrics for one answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub bleu: f64,
    pub similarity: f64,
    pub word_count: u64,
    pub relevance: f64,
}

/// Metrics in persisted form: score fields are `None` when there was no
/// reference answer to score against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub bleu: Option<f64>,
    pub similarity: Option<f64>,
    pub word_count: u64,
    pub relevance: Option<f64>,
}

/// Deterministic scorer for (candidate, reference) pairs.
///
/// Tokenizers are injected so hosts can share one instance of an expensive
/// analyzer, and tests can substitute stubs. The BLEU strategy is fixed at
/// construction by probing the text tokenizer.
#[derive(Clone)]
pub struct ScoreCalculator {
    word_tokenizer: Arc<dyn WordTokenizer>,
    text_tokenizer: Arc<dyn TextTokenizer>,
    bleu_strategy: BleuStrategy,
}

/// Offline calculator on the built-in segmenter. [`ScoreCalculator::from_config`]
/// selects the IPADIC analyzer by default.
impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new(
            Arc::new(SegmentingTokenizer::default()),
            Arc::new(TreebankTokenizer),
        )
    }
}

impl std::fmt::Debug for ScoreCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreCalculator")
            .field("word_tokenizer", &self.word_tokenizer.name())
            .field("text_tokenizer", &self.text_tokenizer.name())
            .field("bleu_strategy", &self.bleu_strategy)
            .finish()
    }
}

impl ScoreCalculator {
    pub fn new(
        word_tokenizer: Arc<dyn WordTokenizer>,
        text_tokenizer: Arc<dyn TextTokenizer>,
    ) -> Self {
        let bleu_strategy = BleuStrategy::select(text_tokenizer.as_ref());
        tracing::debug!(
            word_tokenizer = word_tokenizer.name(),
            text_tokenizer = text_tokenizer.name(),
            ?bleu_strategy,
            "Score calculator ready"
        );
        Self {
            word_tokenizer,
            text_tokenizer,
            bleu_strategy,
        }
    }

    /// Build a calculator with the word tokenizer named in `config`.
    pub fn from_config(config: &ScoringConfig) -> Result<Self, LexiconError> {
        let word_tokenizer: Arc<dyn WordTokenizer> = match config.tokenizer {
            TokenizerKind::Ipadic => Arc::new(IpadicTokenizer::new()?),
            TokenizerKind::Builtin => {
                let mut lexicon = Lexicon::builtin();
                if let Some(path) = &config.lexicon_path {
                    lexicon.extend_from_file(path)?;
                }
                Arc::new(SegmentingTokenizer::new(lexicon))
            }
            TokenizerKind::Whitespace => Arc::new(WhitespaceTokenizer),
        };
        Ok(Self::new(word_tokenizer, Arc::new(TreebankTokenizer)))
    }

    pub fn bleu_strategy(&self) -> BleuStrategy {
        self.bleu_strategy
    }

    /// Score `candidate` against `reference`.
    ///
    /// An empty candidate scores zero everywhere. A missing or empty reference
    /// zeroes the three reference-based metrics but still counts words.
    pub fn compute_metrics(&self, candidate: &str, reference: Option<&str>) -> Metrics {
        if candidate.is_empty() {
            return Metrics::default();
        }

        let word_count = self.word_count(candidate);
        let Some(reference) = reference.filter(|r| !r.is_empty()) else {
            return Metrics {
                word_count,
                ..Metrics::default()
            };
        };

        let candidate = candidate.to_lowercase();
        let reference = reference.to_lowercase();

        let bleu = isolate(
            "bleu",
            Ok(self
                .bleu_strategy
                .score(self.text_tokenizer.as_ref(), &candidate, &reference)),
        );

        let similarity = if candidate.trim().is_empty() || reference.trim().is_empty() {
            0.0
        } else {
            isolate(
                "similarity",
                similarity::tfidf_cosine(&candidate, &reference),
            )
        };

        let relevance = isolate(
            "relevance",
            Ok(relevance::keyword_relevance(&candidate, &reference)),
        );

        Metrics {
            bleu,
            similarity,
            word_count,
            relevance,
        }
    }

    /// Score for persistence: reference-based fields stay `None` when there is
    /// no reference, so "not computed" is never confused with a computed zero.
    pub fn score(&self, candidate: &str, reference: Option<&str>) -> Scores {
        let metrics = self.compute_metrics(candidate, reference);
        let has_reference = reference.is_some_and(|r| !r.is_empty());
        let scored = |v: f64| has_reference.then_some(v);
        Scores {
            bleu: scored(metrics.bleu),
            similarity: scored(metrics.similarity),
            word_count: metrics.word_count,
            relevance: scored(metrics.relevance),
        }
    }

    fn word_count(&self, candidate: &str) -> u64 {
        match self.word_tokenizer.tokenize(candidate) {
            Ok(tokens) => tokens.len() as u64,
            Err(e) => {
                tracing::warn!(
                    tokenizer = self.word_tokenizer.name(),
                    error = %e,
                    "Word tokenizer failed; counting whitespace-separated words"
                );
                candidate.split_whitespace().count() as u64
            }
        }
    }
}

/// Collapse a metric result into a score in `[0, 1]`, logging failures.
fn isolate(metric: &'static str, result: Result<f64, ScoringError>) -> f64 {
    let checked = result.and_then(|v| {
        if v.is_finite() {
            Ok(v.clamp(0.0, 1.0))
        } else {
            Err(ScoringError::NonFinite { metric })
        }
    });
    match checked {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(metric, error = %e, "Metric computation failed; scoring 0.0");
            0.0
        }
    }
}
