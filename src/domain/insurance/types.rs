//! Wire types of the policy platform.
//!
//! These mirror the REST service's JSON shapes (camelCase keys, amounts as
//! plain numbers in euros) restricted to the fields the workflows read.

use serde::{Deserialize, Serialize};

use crate::domain::collection::{CoverageScope, TerminationReason};
use crate::domain::foundation::Timestamp;

/// Tariff package sizes offered by the quote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TariffPackage {
    S,
    M,
    L,
}

/// Bearer token for the customer API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    /// Absolute expiry instant, derived from the service's `expires_in`.
    pub expires_at: Timestamp,
}

impl AuthToken {
    /// True when the token has expired as of `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_before(&now) || self.expires_at == now
    }
}

/// Parameters for a quote calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub product_name: String,
    pub package: TariffPackage,
    pub zip_code: String,
    pub date_of_birth: String,
    pub coverage_scope: CoverageScope,
    pub payment_schedule: String,
}

/// A calculated quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub quote_id: String,
    /// Gross amount per payment period, in euros.
    pub gross: f64,
    pub premium: f64,
    pub taxes: f64,
    pub package: TariffPackage,
}

/// Customer identity as the policy platform stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub values: CustomerValues,
}

/// Nested customer attributes (address, date of birth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerValues {
    pub date_of_birth: String,
    pub address_street: String,
    pub address_house_number: String,
    pub address_plz: String,
    pub address_city: String,
}

/// Order for creating a policy draft out of a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDraftOrder {
    pub quote_id: String,
    pub customer: Customer,
    pub policy_start_date: String,
    pub coverage_scope: CoverageScope,
    pub payment_schedule: String,
}

/// Invoice attached to a fresh policy draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInvoice {
    pub invoice_id: String,
    pub payment_order_id: String,
}

/// A created, not yet paid policy draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDraft {
    pub policy_id: String,
    pub pretty_id: String,
    pub draft_invoice: DraftInvoice,
}

/// SEPA payment order for a policy draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub invoice_id: String,
    pub payment_order_id: String,
    pub first_name: String,
    pub last_name: String,
    pub iban: String,
}

/// Confirmation of a successful payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub policy_id: String,
}

/// An issued policy, restricted to the fields the workflows read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub pretty_id: String,
    pub status: String,
    pub customer: Customer,
    pub starts_at: Timestamp,
    pub cancelled_at: Option<Timestamp>,
    pub withdrawn_at: Option<Timestamp>,
    pub package_name: String,
    pub iban: Option<String>,
}

/// Cancellation request for an established policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationOrder {
    pub cancel_at: String,
    pub reason: TerminationReason,
}

/// Withdrawal request for a policy inside the revocation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalOrder {
    pub withdraw_at: String,
    pub reason: TerminationReason,
}
