pub mod config;
pub mod controller;
pub mod error;
pub mod presenter;
pub mod sanitize;
pub mod session;
pub mod transport;

pub use config::{load_settings, normalize_base_url, ClientSettings};
pub use controller::{QueryController, SessionEvent, SubmitOutcome};
pub use error::{QueryFailure, SessionError};
pub use presenter::{render, ConfidenceBadge, ConfidenceTier, SourceLink, View};
pub use session::{PendingQuery, Session};
pub use transport::{HttpQueryTransport, QueryTransport};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
