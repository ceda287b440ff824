//! Pure state transition function
//!
//! Every inbound message performs exactly one capture and one transition.
//! Input is never validated: any free text is accepted verbatim.

use super::prompts;
use super::{CapturedFields, Effect, Event, IntakeState, SessionContext};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: IntakeState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: IntakeState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// The reply text carried by this result, if any
    #[allow(dead_code)] // Used in tests
    pub fn reply(&self) -> Option<&str> {
        self.effects.iter().find_map(|e| match e {
            Effect::Reply { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Session already started")]
    AlreadyStarted,
    #[error("Session not started")]
    NotStarted,
    #[error("Record save in progress")]
    SaveInProgress,
    #[error("Session has ended")]
    SessionEnded,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs. Reading the
/// clock and touching the store are left to the runtime via effects.
pub fn transition(
    state: &IntakeState,
    _context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Cancellation (accepted from every prompting state)
        // ============================================================
        (
            IntakeState::New
            | IntakeState::AwaitingName
            | IntakeState::AwaitingPhone { .. }
            | IntakeState::AwaitingLocation { .. },
            Event::Cancel,
        ) => Ok(TransitionResult::new(IntakeState::Done)
            .with_effect(Effect::reply(prompts::CANCELLED))
            .with_effect(Effect::EndSession)),

        (IntakeState::Saving { .. }, Event::Cancel) => Err(TransitionError::SaveInProgress),

        // ============================================================
        // Field capture
        // ============================================================
        (IntakeState::New, Event::Begin) => {
            Ok(TransitionResult::new(IntakeState::AwaitingName)
                .with_effect(Effect::reply(prompts::WELCOME)))
        }

        (IntakeState::AwaitingName, Event::Text(name)) => {
            let reply = prompts::ask_phone(&name);
            Ok(TransitionResult::new(IntakeState::AwaitingPhone { name })
                .with_effect(Effect::Reply { text: reply }))
        }

        (IntakeState::AwaitingPhone { name }, Event::Text(phone_number)) => {
            Ok(TransitionResult::new(IntakeState::AwaitingLocation {
                name: name.clone(),
                phone_number,
            })
            .with_effect(Effect::reply(prompts::ASK_LOCATION)))
        }

        (IntakeState::AwaitingLocation { name, phone_number }, Event::Text(location)) => {
            let fields = CapturedFields::new(name.clone(), phone_number.clone(), location);
            Ok(
                TransitionResult::new(IntakeState::Saving {
                    fields: fields.clone(),
                })
                .with_effect(Effect::persist(fields)),
            )
        }

        // ============================================================
        // Persistence outcome (no retry either way)
        // ============================================================
        (IntakeState::Saving { fields }, Event::RecordSaved) => {
            Ok(TransitionResult::new(IntakeState::Done)
                .with_effect(Effect::Reply {
                    text: prompts::saved(fields),
                })
                .with_effect(Effect::EndSession))
        }

        (IntakeState::Saving { .. }, Event::RecordFailed { .. }) => {
            Ok(TransitionResult::new(IntakeState::Done)
                .with_effect(Effect::reply(prompts::SAVE_FAILED))
                .with_effect(Effect::EndSession))
        }

        // ============================================================
        // Everything else is dropped by the runtime
        // ============================================================
        (IntakeState::Done, _) => Err(TransitionError::SessionEnded),

        (_, Event::Begin) => Err(TransitionError::AlreadyStarted),

        (IntakeState::New, _) => Err(TransitionError::NotStarted),

        (IntakeState::Saving { .. }, Event::Text(_)) => Err(TransitionError::SaveInProgress),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in state {}",
            state.label()
        ))),
    }
}
