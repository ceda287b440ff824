//! Events that can occur in an intake session

use crate::signal::Signal;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Begin,
    Cancel,
    Text(String),

    // Store events
    RecordSaved,
    RecordFailed { message: String },
}

impl Event {
    /// Map a classified inbound signal to an event.
    ///
    /// Commands other than begin/cancel are never treated as free text, so
    /// they produce no event at all.
    pub fn from_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::Begin => Some(Event::Begin),
            Signal::Cancel => Some(Event::Cancel),
            Signal::Text(text) => Some(Event::Text(text)),
            Signal::Command(_) => None,
        }
    }
}
