//! Human-readable explanations of the recorded metrics.

use crate::record::MetricColumn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDescription {
    /// Display name.
    pub title: &'static str,
    /// Column or derived-value key.
    pub key: &'static str,
    pub description: &'static str,
}

pub const METRIC_DESCRIPTIONS: &[MetricDescription] = &[
    MetricDescription {
        title: "Accuracy Score",
        key: "is_correct",
        description: "Human judgement of the answer on a 3-point scale: 1.0 (accurate), \
                      0.5 (partially accurate), 0.0 (inaccurate).",
    },
    MetricDescription {
        title: "Response Time",
        key: "response_time",
        description: "Seconds from asking the question to receiving the answer. \
                      Represents model efficiency.",
    },
    MetricDescription {
        title: "BLEU Score",
        key: "bleu_score",
        description: "N-gram overlap between the reference answer and the response, \
                      between 0 and 1 (higher is better).",
    },
    MetricDescription {
        title: "Similarity Score",
        key: "similarity_score",
        description: "Cosine similarity of the TF-IDF vectors of the reference answer \
                      and the response, between 0 and 1.",
    },
    MetricDescription {
        title: "Word Count",
        key: "word_count",
        description: "Number of words in the response. Indicates the amount of \
                      information or detail.",
    },
    MetricDescription {
        title: "Relevance Score",
        key: "relevance_score",
        description: "Share of the reference answer's distinct words that also appear \
                      in the response. Represents topic relevance (between 0 and 1).",
    },
    MetricDescription {
        title: "Efficiency Score",
        key: "efficiency_score",
        description: "Accuracy divided by response time plus 0.1 seconds. Higher scores \
                      mean faster and more accurate responses.",
    },
];

/// Description for a stored metric column.
pub fn for_column(column: MetricColumn) -> Option<&'static MetricDescription> {
    METRIC_DESCRIPTIONS.iter().find(|d| d.key == column.name())
}
