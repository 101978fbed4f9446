//! The step contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::workflow::envelope::{ResumePayload, StepData, SuspendPayload};
use crate::domain::workflow::run_context::RunContext;
use crate::ports::ApiError;

/// Every step the engine knows, across all workflows.
///
/// Steps are addressed by enum variant rather than by string id so that a
/// workflow referencing a missing step cannot be constructed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    // Sales
    DateOfBirth,
    CoverageScope,
    FetchQuote,
    QuotePresentation,
    QuoteFollowUp,
    CurrentInsurance,
    ClaimsHistory,
    ClaimsCount,
    CheckClaimCount,
    FullName,
    EmailAddress,
    Address,
    ReviewData,
    CreatePolicyDraft,
    DownloadDocuments,
    AcceptDocuments,
    Iban,
    PaymentConfirmation,
    PayPolicy,
    Success,
    // Authentication
    AuthenticationData,
    FetchToken,
    FetchPolicy,
    ValidateAuthentication,
    // Policy management
    DisplayPolicyData,
    DeterminePath,
    CollectCancellationData,
    CollectWithdrawalData,
    ConfirmTermination,
    TerminatePolicy,
    AbortTermination,
}

impl StepId {
    /// Wire name of the step (kebab-case, mirrored in logs and memory).
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::DateOfBirth => "date-of-birth",
            StepId::CoverageScope => "coverage-scope",
            StepId::FetchQuote => "fetch-quote",
            StepId::QuotePresentation => "quote-presentation",
            StepId::QuoteFollowUp => "quote-follow-up",
            StepId::CurrentInsurance => "current-insurance",
            StepId::ClaimsHistory => "claims-history",
            StepId::ClaimsCount => "claims-count",
            StepId::CheckClaimCount => "check-claim-count",
            StepId::FullName => "full-name",
            StepId::EmailAddress => "email-address",
            StepId::Address => "address",
            StepId::ReviewData => "review-data",
            StepId::CreatePolicyDraft => "create-policy-draft",
            StepId::DownloadDocuments => "download-documents",
            StepId::AcceptDocuments => "accept-documents",
            StepId::Iban => "iban",
            StepId::PaymentConfirmation => "payment-confirmation",
            StepId::PayPolicy => "pay-policy",
            StepId::Success => "success",
            StepId::AuthenticationData => "authentication-data",
            StepId::FetchToken => "fetch-token",
            StepId::FetchPolicy => "fetch-policy",
            StepId::ValidateAuthentication => "validate-authentication",
            StepId::DisplayPolicyData => "display-policy-data",
            StepId::DeterminePath => "determine-path",
            StepId::CollectCancellationData => "collect-cancellation-data",
            StepId::CollectWithdrawalData => "collect-withdrawal-data",
            StepId::ConfirmTermination => "confirm-termination",
            StepId::TerminatePolicy => "terminate-policy",
            StepId::AbortTermination => "abort-termination",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a step is being entered.
///
/// The phase is explicit rather than inferred from "is resume data set"
/// so a step can always tell a genuine resume apart from a caller that
/// merely pre-filled optional input.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryPhase {
    /// First execution of the step in this position.
    Fresh,
    /// Re-entry after a suspension, with the user's answer.
    Resuming(ResumePayload),
}

impl EntryPhase {
    /// The resume payload, when this is a resume.
    pub fn resume(&self) -> Option<&ResumePayload> {
        match self {
            EntryPhase::Fresh => None,
            EntryPhase::Resuming(payload) => Some(payload),
        }
    }
}

/// What a step produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step finished; the executor advances (or loops, under
    /// `do_until`) with the returned envelope.
    Continue(StepData),
    /// The step needs user input; the run pauses here.
    Suspend(SuspendPayload),
    /// The user cancelled; the run terminates and cannot be resumed.
    Abort(SuspendPayload),
}

/// Failure inside a step's own logic or its external calls.
///
/// These are the errors the executor's retry policy applies to; suspension
/// and abort are ordinary outcomes, never errors.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("required data missing: {0}")]
    MissingData(&'static str),

    #[error("identity check failed: {0}")]
    IdentityMismatch(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A single unit of workflow logic.
#[async_trait]
pub trait WorkflowStep: Send + Sync {
    /// Stable identifier of the step.
    fn id(&self) -> StepId;

    /// Maximum attempts for this step's execution, including the first.
    ///
    /// Only raise this for steps whose failure mode is a flaky external
    /// call; retried attempts re-run the whole `execute`.
    fn max_attempts(&self) -> u32 {
        1
    }

    /// Runs the step.
    async fn execute(
        &self,
        input: StepData,
        phase: EntryPhase,
        ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError>;
}
