//! Query session state and its transitions.
//!
//! The result tuple and the error message live inside the phase that owns them,
//! so a session can never hold both, and neither exists while idle or submitting.

use shared::{
    domain::{Phase, QueryMode, Source},
    protocol::{QueryAnswer, QueryRequest},
};

use crate::error::{QueryFailure, SessionError};

pub const MAX_QUERY_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Default)]
enum SessionState {
    #[default]
    Idle,
    Submitting {
        generation: u64,
    },
    Success(QueryAnswer),
    Error {
        message: String,
    },
}

/// A submission that has entered the submitting phase and still needs its one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub generation: u64,
    pub mode: QueryMode,
    pub request: QueryRequest,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    query_text: String,
    mode: QueryMode,
    state: SessionState,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// Replaces the query text, keeping at most `MAX_QUERY_CHARS` characters.
    pub fn set_query_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.query_text = match text.char_indices().nth(MAX_QUERY_CHARS) {
            Some((cut, _)) => text[..cut].to_string(),
            None => text,
        };
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: QueryMode) -> Result<(), SessionError> {
        if self.is_submitting() {
            return Err(SessionError::ModeLocked);
        }
        self.mode = mode;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            SessionState::Idle => Phase::Idle,
            SessionState::Submitting { .. } => Phase::Submitting,
            SessionState::Success(_) => Phase::Success,
            SessionState::Error { .. } => Phase::Error,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, SessionState::Submitting { .. })
    }

    /// Whether the submit affordance is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && !self.query_text.trim().is_empty()
    }

    /// Generation of the most recent submission; 0 before the first one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn response_html(&self) -> &str {
        match &self.state {
            SessionState::Success(answer) => &answer.response_html,
            _ => "",
        }
    }

    pub fn sources(&self) -> &[Source] {
        match &self.state {
            SessionState::Success(answer) => &answer.sources,
            _ => &[],
        }
    }

    pub fn confidence_score(&self) -> Option<f64> {
        match &self.state {
            SessionState::Success(answer) => answer.confidence_score,
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Enters the submitting phase, dropping any previous result or error.
    pub fn begin_submission(&mut self) -> Result<PendingQuery, SessionError> {
        if self.is_submitting() {
            return Err(SessionError::SubmissionInFlight);
        }
        let query = self.query_text.trim();
        if query.is_empty() {
            return Err(SessionError::EmptyQuery);
        }

        let request = QueryRequest::new(query);
        self.generation += 1;
        self.state = SessionState::Submitting {
            generation: self.generation,
        };

        Ok(PendingQuery {
            generation: self.generation,
            mode: self.mode,
            request,
        })
    }

    /// Stores the outcome of submission `generation`.
    ///
    /// Returns `false` and leaves the session untouched when that submission is
    /// no longer the one in flight.
    pub fn settle(&mut self, generation: u64, result: Result<QueryAnswer, QueryFailure>) -> bool {
        match self.state {
            SessionState::Submitting {
                generation: in_flight,
            } if in_flight == generation => {}
            _ => return false,
        }

        self.state = match result {
            Ok(answer) => SessionState::Success(answer),
            Err(failure) => SessionState::Error {
                message: failure.user_message(),
            },
        };
        true
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
