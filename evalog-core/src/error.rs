//! Error types for the evalog core library.
//!
//! Scoring errors never leave the [`ScoreCalculator`](crate::scoring::ScoreCalculator):
//! each metric degrades to `0.0` and the error is only logged. Generation errors are
//! likewise folded into sentinel text at the [`TextGenerator`](crate::generation::TextGenerator)
//! boundary. Configuration and lexicon errors are returned to the caller.

use std::path::PathBuf;

/// Failure inside a single metric computation.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("Tokenizer '{tokenizer}' failed: {message}")]
    Tokenizer { tokenizer: String, message: String },

    #[error("Vectorization failed: {message}")]
    Vectorization { message: String },

    #[error("Metric '{metric}' produced a non-finite value")]
    NonFinite { metric: &'static str },
}

/// Errors from the text-generation client.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid scoring configuration: {0}")]
    Scoring(#[from] LexiconError),
}

/// Errors from loading a segmentation lexicon.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("Failed to read lexicon {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load the {dictionary} dictionary: {message}")]
    Dictionary {
        dictionary: &'static str,
        message: String,
    },
}
