//! Effects produced by state transitions

use crate::state_machine::state::CapturedFields;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a text reply to the session's chat
    Reply { text: String },

    /// Append the completed record to the store
    PersistRecord { fields: CapturedFields },

    /// Tear down the session
    EndSession,
}

impl Effect {
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply { text: text.into() }
    }

    pub fn persist(fields: CapturedFields) -> Self {
        Effect::PersistRecord { fields }
    }
}
