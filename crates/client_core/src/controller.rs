use std::sync::Arc;

use shared::domain::{Phase, QueryMode};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    config::ClientSettings,
    error::{QueryFailure, SessionError},
    session::Session,
    transport::{HttpQueryTransport, QueryTransport},
};

const EVENT_CHANNEL_CAPACITY: usize = 64;
pub const CANCELLED_MESSAGE: &str = "request cancelled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged(Phase),
    /// A response arrived for a submission that is no longer in flight.
    Discarded { generation: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Blocked(SessionError),
    Settled(Phase),
    Discarded,
}

/// Owns the single session and issues one outbound call per submission.
pub struct QueryController<T: QueryTransport> {
    session: Arc<Mutex<Session>>,
    transport: T,
    events: broadcast::Sender<SessionEvent>,
}

impl QueryController<HttpQueryTransport> {
    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Self> {
        Ok(Self::new(HttpQueryTransport::from_settings(settings)?))
    }
}

impl<T: QueryTransport> QueryController<T> {
    pub fn new(transport: T) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session: Arc::new(Mutex::new(Session::new())),
            transport,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// A copy of the current session for rendering.
    pub async fn snapshot(&self) -> Session {
        self.session.lock().await.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.session.lock().await.phase()
    }

    pub async fn set_query_text(&self, text: impl Into<String>) {
        self.session.lock().await.set_query_text(text);
    }

    pub async fn set_mode(&self, mode: QueryMode) -> Result<(), SessionError> {
        self.session.lock().await.set_mode(mode)
    }

    /// Runs one submission to settlement.
    ///
    /// The session lock is not held across the network call, so observers see
    /// the submitting phase while the request is outstanding.
    pub async fn submit(&self) -> SubmitOutcome {
        let pending = match self.session.lock().await.begin_submission() {
            Ok(pending) => pending,
            Err(err) => return SubmitOutcome::Blocked(err),
        };
        info!(
            generation = pending.generation,
            mode = %pending.mode,
            "submitting query"
        );
        self.emit(SessionEvent::PhaseChanged(Phase::Submitting));
        let mut guard = SettleOnDrop {
            session: self.session.clone(),
            events: self.events.clone(),
            generation: pending.generation,
            armed: true,
        };

        let result = self
            .transport
            .send(pending.mode, &pending.request)
            .await;
        if let Err(failure) = &result {
            warn!(generation = pending.generation, %failure, "query failed");
        }

        let mut session = self.session.lock().await;
        let settled = session.settle(pending.generation, result);
        guard.armed = false;
        if !settled {
            warn!(
                generation = pending.generation,
                "discarding response for stale submission"
            );
            drop(session);
            self.emit(SessionEvent::Discarded {
                generation: pending.generation,
            });
            return SubmitOutcome::Discarded;
        }

        let phase = session.phase();
        drop(session);
        info!(generation = pending.generation, ?phase, "query settled");
        self.emit(SessionEvent::PhaseChanged(phase));
        SubmitOutcome::Settled(phase)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Settles a submission as cancelled when `submit` is dropped before it settles,
/// so the session does not stay in the submitting phase.
struct SettleOnDrop {
    session: Arc<Mutex<Session>>,
    events: broadcast::Sender<SessionEvent>,
    generation: u64,
    armed: bool,
}

fn settle_cancelled(
    session: &mut Session,
    events: &broadcast::Sender<SessionEvent>,
    generation: u64,
) {
    let cancelled = Err(QueryFailure::Transport(CANCELLED_MESSAGE.to_string()));
    if session.settle(generation, cancelled) {
        let _ = events.send(SessionEvent::PhaseChanged(session.phase()));
    }
}

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let generation = self.generation;
        warn!(generation, "submission dropped before settling");

        if let Ok(mut session) = self.session.try_lock() {
            settle_cancelled(&mut session, &self.events, generation);
            return;
        }

        // Lock is busy; settle once it frees up.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let session = self.session.clone();
        let events = self.events.clone();
        handle.spawn(async move {
            let mut session = session.lock().await;
            settle_cancelled(&mut session, &events, generation);
        });
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
