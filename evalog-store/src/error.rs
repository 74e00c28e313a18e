use std::path::PathBuf;

/// Errors from the evaluation store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Row {id} has an invalid timestamp '{value}'")]
    InvalidTimestamp { id: i64, value: String },

    #[error("Failed to prepare database location {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
