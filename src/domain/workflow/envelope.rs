//! The uniform step input/output envelope.
//!
//! Every step consumes and produces the same [`StepData`] shape. This is
//! what lets steps compose into sequences, loops, branches, and nested
//! workflows without adapters: a step reads the slots it needs and passes
//! the rest through untouched.

use serde::{Deserialize, Serialize};

use crate::domain::collection::DataCollection;
use crate::domain::insurance::{PaymentReceipt, Policy, PolicyDraft, Quote};
use crate::domain::workflow::message::Message;

/// Chosen path through the termination flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPath {
    Cancellation,
    Withdrawal,
    NotNeeded,
}

/// The envelope flowing between steps of one run.
///
/// `completed` is the loop condition for `do_until` compositions: a
/// collection step keeps suspending and resuming until it can set it.
/// The business slots (`quote`, `policy`, …) are filled by the
/// side-effecting steps and read by later ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepData {
    pub user_message: Option<String>,
    pub data_collection: DataCollection,
    pub completed: bool,
    pub quote: Option<Quote>,
    pub policy: Option<Policy>,
    pub policy_draft: Option<PolicyDraft>,
    pub payment_result: Option<PaymentReceipt>,
    pub termination_path: Option<TerminationPath>,
    /// Messages produced by a terminal step for the caller.
    pub messages: Vec<Message>,
}

impl StepData {
    /// Creates an envelope from the inbound user message and prior data.
    pub fn from_input(user_message: Option<String>, data_collection: DataCollection) -> Self {
        Self {
            user_message,
            data_collection,
            ..Self::default()
        }
    }

}

/// Why a run paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendReason {
    /// Waiting for the user's next message.
    UserInput,
    /// The user cancelled; the run must not be resumed.
    Abort,
}

/// The value handed back to the caller when a step pauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspendPayload {
    pub reason: SuspendReason,
    pub data_collection: Option<DataCollection>,
    pub messages: Vec<Message>,
}

impl SuspendPayload {
    /// Suspension awaiting user input.
    pub fn user_input(data_collection: DataCollection, messages: Vec<Message>) -> Self {
        Self {
            reason: SuspendReason::UserInput,
            data_collection: Some(data_collection),
            messages,
        }
    }

    /// Abort payload; the surrounding run becomes non-resumable.
    pub fn abort(data_collection: DataCollection, messages: Vec<Message>) -> Self {
        Self {
            reason: SuspendReason::Abort,
            data_collection: Some(data_collection),
            messages,
        }
    }
}

/// Caller-supplied input when re-entering a suspended step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumePayload {
    pub user_message: String,
    pub data_collection: Option<DataCollection>,
}

impl ResumePayload {
    /// Creates a resume payload from the next user message.
    pub fn new(user_message: impl Into<String>, data_collection: Option<DataCollection>) -> Self {
        Self {
            user_message: user_message.into(),
            data_collection,
        }
    }
}
