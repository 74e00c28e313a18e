//! The `chat_history` table and its operations.

use crate::error::{Result, StoreError};
use crate::schema;
use chrono::{Local, NaiveDateTime, Timelike};
use evalog_core::record::{Accuracy, EvaluationRecord, NewRecord, TIMESTAMP_FORMAT};
use evalog_core::ScoreCalculator;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// SQLite-backed evaluation history.
///
/// Clearing is two-step: the first [`clear_all`](Self::clear_all) only arms the
/// store, the second one deletes.
pub struct EvalStore {
    conn: Connection,
    path: Option<PathBuf>,
    clear_armed: bool,
}

impl EvalStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        let store = Self::init(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "Evaluation store opened");
        Ok(store)
    }

    /// A private database that lives as long as the store.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(schema::DDL)?;
        Ok(Self {
            conn,
            path,
            clear_armed: false,
        })
    }

    /// Database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Score and store one exchange, stamped with the current local time.
    pub fn insert(&self, record: &NewRecord, calc: &ScoreCalculator) -> Result<EvaluationRecord> {
        let now = Local::now().naive_local();
        self.insert_at(record, calc, now.with_nanosecond(0).unwrap_or(now))
    }

    /// Score and store one exchange with an explicit timestamp.
    pub fn insert_at(
        &self,
        record: &NewRecord,
        calc: &ScoreCalculator,
        timestamp: NaiveDateTime,
    ) -> Result<EvaluationRecord> {
        let scores = calc.score(&record.answer, record.correct_answer.as_deref());

        self.conn.execute(
            schema::INSERT,
            params![
                timestamp.format(TIMESTAMP_FORMAT).to_string(),
                record.question,
                record.answer,
                record.feedback,
                record.correct_answer,
                record.is_correct.map(Accuracy::score),
                record.response_time,
                scores.bleu,
                scores.similarity,
                scores.word_count as i64,
                scores.relevance,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, word_count = scores.word_count, "Stored evaluation");

        Ok(EvaluationRecord {
            id,
            timestamp,
            question: record.question.clone(),
            answer: record.answer.clone(),
            feedback: record.feedback.clone(),
            correct_answer: record.correct_answer.clone(),
            is_correct: record.is_correct,
            response_time: record.response_time,
            bleu_score: scores.bleu,
            similarity_score: scores.similarity,
            relevance_score: scores.relevance,
            word_count: scores.word_count,
        })
    }

    /// Insert several exchanges in one transaction. Either all are stored or none.
    pub fn insert_many(
        &self,
        records: &[NewRecord],
        calc: &ScoreCalculator,
    ) -> Result<Vec<EvaluationRecord>> {
        let tx = self.conn.unchecked_transaction()?;
        let stored = records
            .iter()
            .map(|r| self.insert(r, calc))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(stored)
    }

    /// Every stored record, newest first.
    pub fn select_all(&self) -> Result<Vec<EvaluationRecord>> {
        let mut stmt = self.conn.prepare(schema::SELECT_ALL)?;
        let rows = stmt
            .query_map([], RawRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(RawRow::into_record).collect()
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", schema::TABLE_NAME),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Two-step delete of every record.
    ///
    /// The first call arms the store and returns `Ok(false)` without touching
    /// data. The next call deletes everything and returns `Ok(true)`. The store
    /// is disarmed afterwards, including when the delete fails.
    pub fn clear_all(&mut self) -> Result<bool> {
        if !self.clear_armed {
            self.clear_armed = true;
            info!("Clear requested; call again to confirm");
            return Ok(false);
        }
        self.clear_armed = false;
        let deleted = self
            .conn
            .execute(&format!("DELETE FROM {}", schema::TABLE_NAME), [])?;
        info!(deleted, "Evaluation store cleared");
        Ok(true)
    }

    pub fn is_clear_armed(&self) -> bool {
        self.clear_armed
    }

    pub fn cancel_clear(&mut self) {
        if self.clear_armed {
            debug!("Clear cancelled");
        }
        self.clear_armed = false;
    }
}

/// A row as SQLite returned it, before domain validation.
struct RawRow {
    id: i64,
    timestamp: Option<String>,
    question: Option<String>,
    answer: Option<String>,
    feedback: Option<String>,
    correct_answer: Option<String>,
    is_correct: Option<f64>,
    response_time: Option<f64>,
    bleu_score: Option<f64>,
    similarity_score: Option<f64>,
    word_count: Option<f64>,
    relevance_score: Option<f64>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: text(row, 1)?,
            question: text(row, 2)?,
            answer: text(row, 3)?,
            feedback: text(row, 4)?,
            correct_answer: text(row, 5)?,
            is_correct: real(row, 6)?,
            response_time: real(row, 7)?,
            bleu_score: real(row, 8)?,
            similarity_score: real(row, 9)?,
            word_count: real(row, 10)?,
            relevance_score: real(row, 11)?,
        })
    }

    fn into_record(self) -> Result<EvaluationRecord> {
        let id = self.id;
        let raw_timestamp = self.timestamp.unwrap_or_default();
        let timestamp = NaiveDateTime::parse_from_str(&raw_timestamp, TIMESTAMP_FORMAT).map_err(
            |_| StoreError::InvalidTimestamp {
                id,
                value: raw_timestamp.clone(),
            },
        )?;

        let is_correct = self.is_correct.and_then(|value| {
            let accuracy = Accuracy::from_score(value);
            if accuracy.is_none() {
                warn!(id, value, "Ignoring non-ternary accuracy value");
            }
            accuracy
        });

        Ok(EvaluationRecord {
            id,
            timestamp,
            question: self.question.unwrap_or_default(),
            answer: self.answer.unwrap_or_default(),
            feedback: self.feedback.unwrap_or_default(),
            correct_answer: self.correct_answer,
            is_correct,
            response_time: self.response_time,
            bleu_score: self.bleu_score,
            similarity_score: self.similarity_score,
            relevance_score: self.relevance_score,
            word_count: stored_word_count(id, self.word_count),
        })
    }
}

/// Word counts from rows written elsewhere may be NULL or out of range.
fn stored_word_count(id: i64, value: Option<f64>) -> u64 {
    match value {
        Some(n) if n.is_finite() && n >= 0.0 => n as u64,
        Some(n) => {
            warn!(id, value = n, "Invalid word count; reading as 0");
            0
        }
        None => {
            warn!(id, "Missing word count; reading as 0");
            0
        }
    }
}

fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}

/// Numeric column value, tolerating integers and numeric text.
fn real(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Real(f) => Some(f),
        ValueRef::Integer(n) => Some(n as f64),
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse().ok()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}
