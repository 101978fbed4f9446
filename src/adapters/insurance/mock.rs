//! Mock policy platform for tests and offline runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::foundation::Timestamp;
use crate::domain::insurance::{
    AuthToken, CancellationOrder, Customer, CustomerValues, PaymentOrder, PaymentReceipt, Policy,
    PolicyDraft, PolicyDraftOrder, Quote, QuoteRequest, TariffPackage, WithdrawalOrder,
};
use crate::ports::{ApiError, InsuranceApi};

/// A termination filed against the mock platform.
#[derive(Debug, Clone, PartialEq)]
pub enum FiledTermination {
    Cancellation(CancellationOrder),
    Withdrawal(WithdrawalOrder),
}

/// In-memory platform double.
///
/// Quotes and drafts are deterministic; policies are whatever the test
/// seeded. Terminations are recorded for assertions.
#[derive(Clone, Default)]
pub struct MockInsuranceApi {
    policies: Arc<Mutex<HashMap<String, Policy>>>,
    terminations: Arc<Mutex<Vec<(String, FiledTermination)>>>,
    fail_quotes: Arc<Mutex<u32>>,
}

impl MockInsuranceApi {
    /// Creates an empty mock platform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a policy the workflows can authenticate against.
    pub fn with_policy(self, policy: Policy) -> Self {
        self.policies
            .lock()
            .unwrap()
            .insert(policy.id.clone(), policy);
        self
    }

    /// Makes the next `count` quote calls fail, for retry tests.
    pub fn failing_quotes(self, count: u32) -> Self {
        *self.fail_quotes.lock().unwrap() = count;
        self
    }

    /// Terminations filed so far.
    pub fn terminations(&self) -> Vec<(String, FiledTermination)> {
        self.terminations.lock().unwrap().clone()
    }

    /// A policy usable in tests: started `age_days` ago, undisputed.
    pub fn sample_policy(id: &str, age_days: i64) -> Policy {
        Policy {
            id: id.to_string(),
            pretty_id: format!("P-{id}"),
            status: "active".to_string(),
            customer: Customer {
                first_name: "Mara".to_string(),
                last_name: "Sommer".to_string(),
                email: "mara@example.com".to_string(),
                values: CustomerValues {
                    date_of_birth: "1992-08-15".to_string(),
                    address_street: "Hauptstr.".to_string(),
                    address_house_number: "5".to_string(),
                    address_plz: "10115".to_string(),
                    address_city: "Berlin".to_string(),
                },
            },
            starts_at: Timestamp::now().add_days(-age_days),
            cancelled_at: None,
            withdrawn_at: None,
            package_name: "M".to_string(),
            iban: Some("DE89370400440532013000".to_string()),
        }
    }
}

#[async_trait]
impl InsuranceApi for MockInsuranceApi {
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError> {
        let mut failures = self.fail_quotes.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(ApiError::Http {
                status: 503,
                message: "quote service overloaded".to_string(),
            });
        }

        Ok(Quote {
            quote_id: format!("quote-{}", request.zip_code),
            gross: 4.90,
            premium: 4.12,
            taxes: 0.78,
            package: TariffPackage::M,
        })
    }

    async fn create_policy_draft(&self, order: &PolicyDraftOrder) -> Result<PolicyDraft, ApiError> {
        Ok(PolicyDraft {
            policy_id: format!("draft-{}", order.quote_id),
            pretty_id: "P-DRAFT".to_string(),
            draft_invoice: crate::domain::insurance::DraftInvoice {
                invoice_id: "inv-1".to_string(),
                payment_order_id: "pay-1".to_string(),
            },
        })
    }

    async fn pay_policy(
        &self,
        policy_id: &str,
        _order: &PaymentOrder,
    ) -> Result<PaymentReceipt, ApiError> {
        Ok(PaymentReceipt {
            policy_id: policy_id.to_string(),
        })
    }

    async fn fetch_token(&self) -> Result<AuthToken, ApiError> {
        Ok(AuthToken {
            access_token: "mock-token".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: Timestamp::now().plus_secs(3600),
        })
    }

    async fn fetch_policy(
        &self,
        policy_id: &str,
        _token: &AuthToken,
    ) -> Result<Option<Policy>, ApiError> {
        Ok(self.policies.lock().unwrap().get(policy_id).cloned())
    }

    async fn cancel_policy(
        &self,
        policy_id: &str,
        _token: &AuthToken,
        order: &CancellationOrder,
    ) -> Result<(), ApiError> {
        self.terminations.lock().unwrap().push((
            policy_id.to_string(),
            FiledTermination::Cancellation(order.clone()),
        ));
        Ok(())
    }

    async fn withdraw_policy(
        &self,
        policy_id: &str,
        _token: &AuthToken,
        order: &WithdrawalOrder,
    ) -> Result<(), ApiError> {
        self.terminations.lock().unwrap().push((
            policy_id.to_string(),
            FiledTermination::Withdrawal(order.clone()),
        ));
        Ok(())
    }
}
