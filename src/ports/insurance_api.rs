//! Insurance API Port - the policy platform's REST services.

use async_trait::async_trait;

use crate::domain::insurance::{
    AuthToken, CancellationOrder, PaymentOrder, PaymentReceipt, Policy, PolicyDraft,
    PolicyDraftOrder, Quote, QuoteRequest, WithdrawalOrder,
};

/// Failures of the policy platform.
///
/// Non-2xx responses become `Http`; responses whose `success` flag is
/// false become `Rejected` with the platform's message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request rejected by the platform: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("response could not be decoded: {0}")]
    Decode(String),
}

/// Port for the external policy platform.
///
/// All operations are request/response; the executor's retry policy wraps
/// the steps that call them, not the calls themselves.
#[async_trait]
pub trait InsuranceApi: Send + Sync {
    /// Calculates a quote for the given parameters.
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError>;

    /// Creates an unpaid policy draft from a quote.
    async fn create_policy_draft(&self, order: &PolicyDraftOrder) -> Result<PolicyDraft, ApiError>;

    /// Pays a policy draft via SEPA.
    async fn pay_policy(
        &self,
        policy_id: &str,
        order: &PaymentOrder,
    ) -> Result<PaymentReceipt, ApiError>;

    /// Fetches a fresh bearer token.
    async fn fetch_token(&self) -> Result<AuthToken, ApiError>;

    /// Loads a policy, or `None` when the id is unknown.
    async fn fetch_policy(
        &self,
        policy_id: &str,
        token: &AuthToken,
    ) -> Result<Option<Policy>, ApiError>;

    /// Files an ordinary cancellation.
    async fn cancel_policy(
        &self,
        policy_id: &str,
        token: &AuthToken,
        order: &CancellationOrder,
    ) -> Result<(), ApiError>;

    /// Files a withdrawal inside the revocation window.
    async fn withdraw_policy(
        &self,
        policy_id: &str,
        token: &AuthToken,
        order: &WithdrawalOrder,
    ) -> Result<(), ApiError>;
}
