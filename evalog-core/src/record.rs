//! The evaluation record schema shared by the scorer, the store and the aggregator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp format used for persisted records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Human-assigned accuracy of an answer.
///
/// Stored as a REAL column but only ever one of `1.0`, `0.5` or `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Accurate,
    Partial,
    Inaccurate,
}

impl Accuracy {
    pub const ALL: [Accuracy; 3] = [Accuracy::Accurate, Accuracy::Partial, Accuracy::Inaccurate];

    /// Numeric score persisted in the `is_correct` column.
    pub fn score(self) -> f64 {
        match self {
            Accuracy::Accurate => 1.0,
            Accuracy::Partial => 0.5,
            Accuracy::Inaccurate => 0.0,
        }
    }

    /// Label used in distributions and group-by output.
    pub fn label(self) -> &'static str {
        match self {
            Accuracy::Accurate => "accurate",
            Accuracy::Partial => "partial",
            Accuracy::Inaccurate => "inaccurate",
        }
    }

    /// Option text shown to the person giving feedback.
    pub fn feedback_option(self) -> &'static str {
        match self {
            Accuracy::Accurate => "correct",
            Accuracy::Partial => "partial correct",
            Accuracy::Inaccurate => "incorrect",
        }
    }

    /// Map a stored score back to its category. Anything outside the
    /// ternary scale is not evaluable.
    pub fn from_score(score: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.score() == score)
    }

    pub fn from_feedback_option(option: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.feedback_option().eq_ignore_ascii_case(option.trim()))
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Build the stored feedback text: the option label, optionally followed by
/// `": <comment>"`.
pub fn combine_feedback(accuracy: Accuracy, comment: Option<&str>) -> String {
    match comment.map(str::trim).filter(|c| !c.is_empty()) {
        Some(comment) => format!("{}: {}", accuracy.feedback_option(), comment),
        None => accuracy.feedback_option().to_string(),
    }
}

/// One scored chat exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub question: String,
    pub answer: String,
    pub feedback: String,
    pub correct_answer: Option<String>,
    pub is_correct: Option<Accuracy>,
    pub response_time: Option<f64>,
    /// `None` only when no reference answer was available.
    pub bleu_score: Option<f64>,
    pub similarity_score: Option<f64>,
    pub relevance_score: Option<f64>,
    pub word_count: u64,
}

impl EvaluationRecord {
    /// A record is evaluable once a human has assigned an accuracy.
    pub fn is_evaluable(&self) -> bool {
        self.is_correct.is_some()
    }
}

/// Insert payload; the store assigns id, timestamp and scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub question: String,
    pub answer: String,
    pub feedback: String,
    pub correct_answer: Option<String>,
    pub is_correct: Option<Accuracy>,
    pub response_time: Option<f64>,
}

/// Numeric columns the aggregator can summarize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricColumn {
    ResponseTime,
    BleuScore,
    SimilarityScore,
    WordCount,
    RelevanceScore,
}

impl MetricColumn {
    /// Columns in the order statistics are reported.
    pub const ALL: [MetricColumn; 5] = [
        MetricColumn::ResponseTime,
        MetricColumn::BleuScore,
        MetricColumn::SimilarityScore,
        MetricColumn::WordCount,
        MetricColumn::RelevanceScore,
    ];

    /// Columns that can be plotted against response time.
    pub const SCORES: [MetricColumn; 4] = [
        MetricColumn::BleuScore,
        MetricColumn::SimilarityScore,
        MetricColumn::RelevanceScore,
        MetricColumn::WordCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricColumn::ResponseTime => "response_time",
            MetricColumn::BleuScore => "bleu_score",
            MetricColumn::SimilarityScore => "similarity_score",
            MetricColumn::WordCount => "word_count",
            MetricColumn::RelevanceScore => "relevance_score",
        }
    }

    pub fn value(self, record: &EvaluationRecord) -> Option<f64> {
        match self {
            MetricColumn::ResponseTime => record.response_time,
            MetricColumn::BleuScore => record.bleu_score,
            MetricColumn::SimilarityScore => record.similarity_score,
            MetricColumn::WordCount => Some(record.word_count as f64),
            MetricColumn::RelevanceScore => record.relevance_score,
        }
        .filter(|v| !v.is_nan())
    }
}

impl fmt::Display for MetricColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s.trim())
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|c| c.name()).collect();
                format!("unknown metric '{s}', expected one of: {}", names.join(", "))
            })
    }
}
