pub const TABLE_NAME: &str = "chat_history";

pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS chat_history (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  timestamp TEXT,
  question TEXT,
  answer TEXT,
  feedback TEXT,
  correct_answer TEXT,
  is_correct REAL,
  response_time REAL,
  bleu_score REAL,
  similarity_score REAL,
  word_count INTEGER,
  relevance_score REAL
);
"#;

pub(crate) const INSERT: &str = r#"
INSERT INTO chat_history (
  timestamp, question, answer, feedback, correct_answer, is_correct,
  response_time, bleu_score, similarity_score, word_count, relevance_score
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
"#;

pub(crate) const SELECT_ALL: &str = r#"
SELECT id, timestamp, question, answer, feedback, correct_answer, is_correct,
       response_time, bleu_score, similarity_score, word_count, relevance_score
FROM chat_history
ORDER BY timestamp DESC, id DESC
"#;
