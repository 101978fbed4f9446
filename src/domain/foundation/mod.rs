//! Foundation module - Shared domain primitives.
//!
//! Contains the value objects and identifiers that form the vocabulary
//! of the Coverbot domain.

mod ids;
mod state_machine;
mod timestamp;

pub use ids::{ResourceId, RunId, ThreadId};
pub use state_machine::{InvalidTransition, StateMachine};
pub use timestamp::Timestamp;
