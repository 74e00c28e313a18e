//! # evalog-store: SQLite persistence for scored chat exchanges
//!
//! [`EvalStore`] owns one `chat_history` table. Scores are computed with an
//! injected [`ScoreCalculator`](evalog_core::ScoreCalculator) at insert time, so
//! every stored row already carries its metrics.

pub mod error;
pub mod schema;
pub mod seed;
pub mod store;

pub use error::StoreError;
pub use seed::{SAMPLE_EVALUATIONS, SampleEvaluation, create_sample_data, ensure_initial_data};
pub use store::EvalStore;
