use thiserror::Error;

pub const FALLBACK_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Why a submission settled in the error phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryFailure {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("query service returned status {status}")]
    Application {
        status: u16,
        message: Option<String>,
    },
    #[error("malformed response payload: {0}")]
    Malformed(String),
}

impl QueryFailure {
    /// Text for the error banner: backend message, then transport text, then the fixed fallback.
    pub fn user_message(&self) -> String {
        let candidate = match self {
            Self::Application {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.trim().to_string(),
            Self::Application { status, .. } => {
                format!("request failed with status code {status}")
            }
            Self::Transport(message) | Self::Malformed(message) => message.trim().to_string(),
        };

        if candidate.is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            candidate
        }
    }
}

/// A user action the session refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("query text is empty")]
    EmptyQuery,
    #[error("a query is already in flight")]
    SubmissionInFlight,
    #[error("mode cannot change while a query is in flight")]
    ModeLocked,
}
