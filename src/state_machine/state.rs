//! Intake session state types

use chrono::{DateTime, Local};
use std::fmt;

// ============================================================================
// Session Identity
// ============================================================================

/// Stable identity of one user's conversation, as delivered by the transport.
///
/// Conversations are tracked per chat and per user, so the same user talking
/// to the bot in two group chats has two independent sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub chat_id: i64,
    pub user_id: i64,
}

impl SessionId {
    pub fn new(chat_id: i64, user_id: i64) -> Self {
        Self { chat_id, user_id }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chat_id, self.user_id)
    }
}

/// Context for a session (immutable for its lifetime)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: SessionId,
    /// Wall-clock time the begin signal was accepted
    pub started_at: DateTime<Local>,
}

impl SessionContext {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            started_at: Local::now(),
        }
    }
}

// ============================================================================
// Captured Fields
// ============================================================================

/// The three free-text values collected by a completed conversation.
///
/// Only constructed once every field has been captured, so a value of this
/// type is always a complete record body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFields {
    pub name: String,
    pub phone_number: String,
    pub location: String,
}

impl CapturedFields {
    pub fn new(
        name: impl Into<String>,
        phone_number: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone_number: phone_number.into(),
            location: location.into(),
        }
    }
}

// ============================================================================
// Intake State
// ============================================================================

/// Intake conversation state
///
/// Captured values travel inside the variants, so a state can only hold the
/// fields that have actually been answered so far.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IntakeState {
    /// Session registered, begin signal not yet processed
    #[default]
    New,

    /// Welcome sent, waiting for the name
    AwaitingName,

    /// Name captured, waiting for the phone number
    AwaitingPhone { name: String },

    /// Name and phone captured, waiting for the location
    AwaitingLocation { name: String, phone_number: String },

    /// All fields captured, record append in progress.
    ///
    /// Left within the same turn it is entered in.
    Saving { fields: CapturedFields },

    /// Session over (saved, failed to save, or cancelled)
    Done,
}

impl IntakeState {
    /// Check if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, IntakeState::Done)
    }

    /// Short name for logs
    pub fn label(&self) -> &'static str {
        match self {
            IntakeState::New => "new",
            IntakeState::AwaitingName => "awaiting_name",
            IntakeState::AwaitingPhone { .. } => "awaiting_phone",
            IntakeState::AwaitingLocation { .. } => "awaiting_location",
            IntakeState::Saving { .. } => "saving",
            IntakeState::Done => "done",
        }
    }
}
