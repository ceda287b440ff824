//! Runtime for executing intake sessions
//!
//! Each live session owns a `SessionRuntime` task fed through its own
//! channel. `dispatch` waits until the session has finished with an event
//! before returning, so updates are handled one at a time in arrival order.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{Delivery, Envelope, SessionRuntime};
pub use traits::*;

use crate::signal::Signal;
use crate::state_machine::{Event, SessionContext, SessionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Bound on events queued for a single session
const SESSION_CHANNEL_CAPACITY: usize = 32;

/// What happened to a dispatched signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A new session was opened for the signal
    Created,
    /// Delivered to the live session
    Delivered,
    /// No session could take the signal
    Ignored,
}

/// Handle to interact with a running session
struct SessionHandle {
    event_tx: mpsc::Sender<Envelope>,
    /// Distinguishes successive sessions for the same id
    generation: u64,
}

type SessionMap = Arc<Mutex<HashMap<SessionId, SessionHandle>>>;

/// Registry of live sessions.
///
/// Sessions are created on a begin signal and removed when their runtime
/// reaches the terminal state.
pub struct SessionManager<S, R>
where
    S: RecordStore + 'static,
    R: ReplySink + 'static,
{
    store: Arc<S>,
    replies: Arc<R>,
    sessions: SessionMap,
    next_generation: AtomicU64,
}

impl<S, R> SessionManager<S, R>
where
    S: RecordStore + 'static,
    R: ReplySink + 'static,
{
    pub fn new(store: S, replies: R) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(replies))
    }

    pub fn from_shared(store: Arc<S>, replies: Arc<R>) -> Self {
        Self {
            store,
            replies,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Number of sessions currently open
    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Route an inbound signal to its session, opening one on begin.
    ///
    /// Returns once the session has run every effect of the signal, so the
    /// next signal for the same id sees the state it left behind.
    pub async fn dispatch(&self, session_id: SessionId, signal: Signal) -> DispatchOutcome {
        let Some(event) = Event::from_signal(signal) else {
            tracing::debug!(session = %session_id, "Ignoring unrecognised command");
            return DispatchOutcome::Ignored;
        };

        let existing = self
            .sessions
            .lock()
            .await
            .get(&session_id)
            .map(|h| (h.event_tx.clone(), h.generation));

        let event = match existing {
            Some((event_tx, generation)) => match deliver(&event_tx, event).await {
                Ok(()) => return DispatchOutcome::Delivered,
                Err(returned) => {
                    // Session ended before reaching the event
                    deregister(&self.sessions, session_id, generation).await;
                    let Some(event) = returned else {
                        tracing::warn!(session = %session_id, "Session stopped without acknowledging event");
                        return DispatchOutcome::Ignored;
                    };
                    event
                }
            },
            None => event,
        };

        if event != Event::Begin {
            tracing::debug!(session = %session_id, "No active session, ignoring message");
            return DispatchOutcome::Ignored;
        }

        self.start_session(session_id).await
    }

    async fn start_session(&self, session_id: SessionId) -> DispatchOutcome {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (event_tx, event_rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);

        // Queue the begin event before the runtime starts so it is handled first
        let (envelope, receipt) = Envelope::new(Event::Begin);
        if event_tx.try_send(envelope).is_err() {
            tracing::error!(session = %session_id, "Failed to queue begin event");
            return DispatchOutcome::Ignored;
        }

        let runtime = SessionRuntime::new(
            SessionContext::new(session_id),
            Arc::clone(&self.store),
            Arc::clone(&self.replies),
            event_rx,
        );

        self.sessions.lock().await.insert(
            session_id,
            SessionHandle {
                event_tx,
                generation,
            },
        );

        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            runtime.run().await;
            deregister(&sessions, session_id, generation).await;
        });

        if receipt.await.is_err() {
            tracing::warn!(session = %session_id, "Session stopped before handling begin");
        }
        DispatchOutcome::Created
    }
}

/// Hand an event to a session and wait until it has been handled.
///
/// On failure the event comes back if the session ended before reading it,
/// or `None` if the runtime went away without answering.
async fn deliver(event_tx: &mpsc::Sender<Envelope>, event: Event) -> Result<(), Option<Event>> {
    let (envelope, receipt) = Envelope::new(event);
    if let Err(mpsc::error::SendError(envelope)) = event_tx.send(envelope).await {
        return Err(Some(envelope.event));
    }

    match receipt.await {
        Ok(Delivery::Handled) => Ok(()),
        Ok(Delivery::Returned(event)) => Err(Some(event)),
        Err(_) => Err(None),
    }
}

/// Remove a session's handle unless a newer session has replaced it
async fn deregister(sessions: &SessionMap, session_id: SessionId, generation: u64) {
    let mut sessions = sessions.lock().await;
    if sessions
        .get(&session_id)
        .is_some_and(|h| h.generation == generation)
    {
        sessions.remove(&session_id);
    }
}
