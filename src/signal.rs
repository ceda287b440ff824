//! Inbound message classification
//!
//! Turns raw message text into the three signals the intake flow
//! understands, plus a catch-all for commands it does not.

/// Command that opens a session
pub const BEGIN_COMMAND: &str = "start";
/// Command that abandons a session
pub const CANCEL_COMMAND: &str = "cancel";

/// A classified inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Begin,
    Cancel,
    /// Any other `/command`; never accepted as an answer
    Command(String),
    /// Free text, kept verbatim
    Text(String),
}

impl Signal {
    /// Classify message text.
    ///
    /// Only a `/` followed directly by at least one `[A-Za-z0-9_]` character
    /// is a command, which is exactly what Telegram tags as a `bot_command`
    /// entity. The name is that run of characters, so an `@botname` suffix
    /// or trailing arguments are ignored. Anything else, including a bare
    /// `/` or `/ Main St`, is free text.
    pub fn classify(text: &str) -> Self {
        let Some(rest) = text.strip_prefix('/') else {
            return Signal::Text(text.to_string());
        };

        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let (name, _) = rest.split_at(end);
        if name.is_empty() {
            return Signal::Text(text.to_string());
        }

        match name {
            BEGIN_COMMAND => Signal::Begin,
            CANCEL_COMMAND => Signal::Cancel,
            other => Signal::Command(other.to_string()),
        }
    }
}
