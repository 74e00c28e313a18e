//! State of one ask → answer → judge exchange.

use evalog_core::Generation;
use evalog_core::record::{Accuracy, NewRecord, combine_feedback};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    AwaitingResponse {
        question: String,
    },
    AwaitingFeedback {
        question: String,
        generation: Generation,
    },
    Done {
        record_id: Option<i64>,
    },
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingResponse { .. } => "awaiting response",
            SessionState::AwaitingFeedback { .. } => "awaiting feedback",
            SessionState::Done { .. } => "done",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("Question is empty")]
    EmptyQuestion,
}

/// The human judgement of an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub accuracy: Accuracy,
    pub correct_answer: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug)]
pub struct Session {
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Idle → AwaitingResponse.
    pub fn submit_question(&mut self, question: &str) -> Result<(), SessionError> {
        self.expect_state("submit a question", |s| matches!(s, SessionState::Idle))?;
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        self.state = SessionState::AwaitingResponse {
            question: question.to_string(),
        };
        Ok(())
    }

    /// AwaitingResponse → AwaitingFeedback.
    pub fn receive_response(&mut self, generation: Generation) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::AwaitingResponse { question } => {
                self.state = SessionState::AwaitingFeedback {
                    question,
                    generation,
                };
                Ok(())
            }
            other => self.reject("receive a response", other),
        }
    }

    /// AwaitingFeedback → Done. Returns the exchange ready to be stored.
    pub fn submit_feedback(&mut self, feedback: Feedback) -> Result<NewRecord, SessionError> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::AwaitingFeedback {
                question,
                generation,
            } => {
                self.state = SessionState::Done { record_id: None };
                Ok(NewRecord {
                    question,
                    answer: generation.text,
                    feedback: combine_feedback(feedback.accuracy, feedback.comment.as_deref()),
                    correct_answer: non_blank(feedback.correct_answer),
                    is_correct: Some(feedback.accuracy),
                    response_time: Some(generation.elapsed_secs),
                })
            }
            other => self.reject("submit feedback", other),
        }
    }

    /// Remember the id the stored exchange received.
    pub fn mark_saved(&mut self, id: i64) -> Result<(), SessionError> {
        match &mut self.state {
            SessionState::Done { record_id } => {
                *record_id = Some(id);
                Ok(())
            }
            other => Err(SessionError::InvalidTransition {
                action: "mark the exchange saved",
                state: other.name(),
            }),
        }
    }

    /// Done → Idle, ready for the next question.
    pub fn next_question(&mut self) -> Result<(), SessionError> {
        self.expect_state("start the next question", |s| {
            matches!(s, SessionState::Done { .. })
        })?;
        self.state = SessionState::Idle;
        Ok(())
    }

    fn expect_state(
        &self,
        action: &'static str,
        allowed: impl Fn(&SessionState) -> bool,
    ) -> Result<(), SessionError> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }

    fn reject<T>(&mut self, action: &'static str, previous: SessionState) -> Result<T, SessionError> {
        let state = previous.name();
        self.state = previous;
        Err(SessionError::InvalidTransition { action, state })
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn generation() -> Generation {
        Generation {
            text: "Rust is a systems language.".into(),
            elapsed_secs: 1.5,
        }
    }

    #[test]
    fn test_full_cycle() {
        let mut session = Session::new();
        session.submit_question("  What is Rust?  ").unwrap();
        assert_eq!(
            session.state(),
            &SessionState::AwaitingResponse {
                question: "What is Rust?".into()
            }
        );

        session.receive_response(generation()).unwrap();
        let record = session
            .submit_feedback(Feedback {
                accuracy: Accuracy::Partial,
                correct_answer: Some("Rust is a memory-safe systems language.".into()),
                comment: Some("misses memory safety".into()),
            })
            .unwrap();

        assert_eq!(record.question, "What is Rust?");
        assert_eq!(record.answer, "Rust is a systems language.");
        assert_eq!(record.feedback, "partial correct: misses memory safety");
        assert_eq!(record.is_correct, Some(Accuracy::Partial));
        assert_eq!(record.response_time, Some(1.5));

        session.mark_saved(7).unwrap();
        assert_eq!(session.state(), &SessionState::Done { record_id: Some(7) });

        session.next_question().unwrap();
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn test_blank_reference_is_dropped() {
        let mut session = Session::new();
        session.submit_question("q").unwrap();
        session.receive_response(generation()).unwrap();
        let record = session
            .submit_feedback(Feedback {
                accuracy: Accuracy::Accurate,
                correct_answer: Some("   ".into()),
                comment: None,
            })
            .unwrap();
        assert_eq!(record.correct_answer, None);
        assert_eq!(record.feedback, "correct");
    }

    #[test]
    fn test_empty_question_rejected() {
        let mut session = Session::new();
        assert_eq!(session.submit_question("   "), Err(SessionError::EmptyQuestion));
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn test_invalid_transitions_keep_state() {
        let mut session = Session::new();
        assert!(matches!(
            session.receive_response(generation()),
            Err(SessionError::InvalidTransition { state: "idle", .. })
        ));
        assert_eq!(session.state(), &SessionState::Idle);

        session.submit_question("q").unwrap();
        assert!(session.submit_question("again").is_err());
        assert!(session.next_question().is_err());
        let err = session
            .submit_feedback(Feedback {
                accuracy: Accuracy::Inaccurate,
                correct_answer: None,
                comment: None,
            })
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot submit feedback while awaiting response"
        );
        assert!(matches!(session.state(), SessionState::AwaitingResponse { .. }));
    }
}
