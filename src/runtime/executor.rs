//! Per-session runtime executor

use super::traits::{RecordStore, ReplySink};
use crate::state_machine::{transition, Effect, Event, IntakeState, SessionContext};
use crate::store::Record;
use chrono::Local;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// How a queued event was dealt with by its session
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Run through the state machine, whether accepted or rejected
    Handled,
    /// The session ended before reaching it
    Returned(Event),
}

/// An inbound event and the acknowledgement its sender waits on
#[derive(Debug)]
pub struct Envelope {
    pub event: Event,
    pub delivered: oneshot::Sender<Delivery>,
}

impl Envelope {
    pub fn new(event: Event) -> (Self, oneshot::Receiver<Delivery>) {
        let (delivered, receipt) = oneshot::channel();
        (Self { event, delivered }, receipt)
    }
}

/// Drives one session's state machine, executing effects against the store
/// and the reply sink.
pub struct SessionRuntime<S, R>
where
    S: RecordStore + 'static,
    R: ReplySink + 'static,
{
    context: SessionContext,
    state: IntakeState,
    store: Arc<S>,
    replies: Arc<R>,
    inbox: mpsc::Receiver<Envelope>,
    /// Set by `EndSession`; the inbox is closed from then on
    ended: bool,
}

impl<S, R> SessionRuntime<S, R>
where
    S: RecordStore + 'static,
    R: ReplySink + 'static,
{
    pub fn new(
        context: SessionContext,
        store: Arc<S>,
        replies: Arc<R>,
        inbox: mpsc::Receiver<Envelope>,
    ) -> Self {
        Self {
            context,
            state: IntakeState::New,
            store,
            replies,
            inbox,
            ended: false,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn state(&self) -> &IntakeState {
        &self.state
    }

    /// Process events until the session ends or every sender is dropped.
    /// Returns the final state.
    ///
    /// Each event is acknowledged only after all of its effects have run.
    /// Events still queued when the session ends are handed back unprocessed.
    pub async fn run(mut self) -> IntakeState {
        let session = self.context.session_id;
        tracing::info!(session = %session, "Session started");

        while let Some(Envelope { event, delivered }) = self.inbox.recv().await {
            if let Err(e) = self.process_event(event).await {
                tracing::debug!(session = %session, state = self.state.label(), error = %e, "Dropped event");
            }
            let _ = delivered.send(Delivery::Handled);
            if self.ended {
                break;
            }
        }

        while let Ok(Envelope { event, delivered }) = self.inbox.try_recv() {
            tracing::debug!(session = %session, ?event, "Returning event queued after session end");
            let _ = delivered.send(Delivery::Returned(event));
        }

        if !self.state.is_terminal() {
            tracing::warn!(session = %session, state = self.state.label(), "Session stopped before finishing");
        }

        let elapsed = Local::now() - self.context.started_at;
        tracing::info!(
            session = %session,
            state = self.state.label(),
            duration_secs = elapsed.num_seconds(),
            "Session ended"
        );
        self.state
    }

    /// Apply one inbound event, plus any events its effects generate.
    pub async fn process_event(&mut self, event: Event) -> Result<(), String> {
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            // Pure state transition
            let result = transition(&self.state, &self.context, current_event)
                .map_err(|e| e.to_string())?;

            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        let session = self.context.session_id;
        match effect {
            Effect::Reply { text } => {
                if let Err(e) = self.replies.send_reply(session, &text).await {
                    tracing::warn!(session = %session, error = %e, "Failed to send reply");
                }
                None
            }

            Effect::PersistRecord { fields } => {
                let record = Record::new(fields);
                match self.store.append(&record).await {
                    Ok(()) => {
                        tracing::info!(session = %session, "Record saved");
                        Some(Event::RecordSaved)
                    }
                    Err(e) => {
                        tracing::error!(session = %session, error = %e, "Failed to save data");
                        Some(Event::RecordFailed {
                            message: e.to_string(),
                        })
                    }
                }
            }

            Effect::EndSession => {
                // No new events are accepted; queued ones go back to the sender
                self.inbox.close();
                self.ended = true;
                None
            }
        }
    }
}
