//! Intake conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! the runtime feeds events in, executes the returned effects, and feeds
//! any resulting events back in.

mod effect;
pub mod event;
pub mod prompts;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{CapturedFields, IntakeState, SessionContext, SessionId};
pub use transition::{transition, TransitionError, TransitionResult};
