//! # evalog-core: answer-quality metrics for chatbot evaluation logs
//!
//! This crate holds everything that does not touch storage or the terminal:
//!
//! - [`scoring`] turns a model answer and a human reference answer into BLEU,
//!   TF-IDF cosine similarity, keyword relevance and a word count.
//! - [`aggregate`] summarizes historical [`EvaluationRecord`]s (distribution
//!   counts, descriptive statistics, per-accuracy means, efficiency ranking).
//! - [`tokenize`] provides the morphological word tokenizer used for word counts
//!   and the Treebank-style tokenizer used for BLEU.
//! - [`generation`] is the OpenAI-compatible text-generation client.
//!
//! The scoring and aggregation layers are pure: no I/O, no shared mutable state,
//! and identical inputs always produce bit-identical outputs.

pub mod aggregate;
pub mod config;
pub mod descriptions;
pub mod error;
pub mod generation;
pub mod record;
pub mod scoring;
pub mod tokenize;

pub use aggregate::{
    AccuracyDistribution, ColumnSummary, EfficiencyEntry, GroupMeans, ResponseTimePoint,
};
pub use config::{EvalogConfig, load_config};
pub use error::{ConfigError, GenerationError, LexiconError, ScoringError};
pub use generation::{Generation, OpenAiCompatibleGenerator, TextGenerator};
pub use record::{Accuracy, EvaluationRecord, MetricColumn, NewRecord};
pub use scoring::{BleuStrategy, Metrics, ScoreCalculator, Scores};
pub use tokenize::{
    IpadicTokenizer, Lexicon, SegmentingTokenizer, TextTokenizer, TreebankTokenizer,
    WhitespaceTokenizer, WordTokenizer,
};
