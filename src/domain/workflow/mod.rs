//! Workflow module - the suspendable step executor and its building blocks.
//!
//! A workflow is a directed composition of steps over a uniform
//! [`StepData`] envelope. Steps either complete, suspend awaiting user
//! input, or abort; the executor records the suspension point so a later
//! process invocation can resume exactly where the conversation paused.

mod collect_step;
mod envelope;
mod executor;
mod intent;
mod message;
mod run_context;
mod run_state;
mod step;

pub use collect_step::CollectStep;
pub use envelope::{
    ResumePayload, StepData, SuspendPayload, SuspendReason, TerminationPath,
};
pub use executor::{
    predicate, RunOutcome, StepNode, StepPredicate, WorkflowBuilder, WorkflowDefinition,
    WorkflowError,
};
pub use intent::{derive_intent, IntentChoice, CANCEL_CHOICE, CONTINUE_CHOICE, MIN_CONFIDENCE};
pub use message::Message;
pub use run_context::RunContext;
pub use run_state::{RunStatus, WorkflowId, WorkflowRunState};
pub use step::{EntryPhase, StepError, StepId, StepOutcome, WorkflowStep};
