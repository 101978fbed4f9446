//! HTTP client for the policy platform.
//!
//! All endpoints live under a single base URL; the token endpoint uses
//! client credentials from configuration. Non-2xx responses become
//! [`ApiError::Http`]; endpoints with a `success` flag are additionally
//! checked and mapped to [`ApiError::Rejected`].

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;
use tracing::error;

use crate::domain::foundation::Timestamp;
use crate::domain::insurance::{
    AuthToken, CancellationOrder, PaymentOrder, PaymentReceipt, Policy, PolicyDraft,
    PolicyDraftOrder, Quote, QuoteRequest, WithdrawalOrder,
};
use crate::ports::{ApiError, InsuranceApi};

/// Configuration of the policy platform client.
#[derive(Debug, Clone)]
pub struct InsuranceApiConfig {
    pub base_url: String,
    pub client_id: String,
    client_secret: Secret<String>,
    pub timeout: Duration,
}

impl InsuranceApiConfig {
    /// Creates a configuration for the given platform.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret.into()),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

/// Envelope used by the quote/payment endpoints.
#[derive(Debug, Deserialize)]
struct SuccessEnvelope<T> {
    success: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

impl<T> SuccessEnvelope<T> {
    fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(self.message));
        }
        self.data
            .ok_or_else(|| ApiError::Decode("success response without data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: u64,
}

/// Policy platform client over reqwest.
pub struct HttpInsuranceApi {
    config: InsuranceApiConfig,
    client: Client,
}

impl HttpInsuranceApi {
    /// Creates a client over the configured platform.
    pub fn new(config: InsuranceApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), %message, "platform request failed");
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn post_json<B: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AuthToken>,
    ) -> Result<R, ApiError> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(&token.access_token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = Self::check_status(response).await?;
        response
            .json::<R>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl InsuranceApi for HttpInsuranceApi {
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError> {
        let envelope: SuccessEnvelope<Quote> = self.post_json("/v1/quote", request, None).await?;
        envelope.into_data()
    }

    async fn create_policy_draft(&self, order: &PolicyDraftOrder) -> Result<PolicyDraft, ApiError> {
        self.post_json("/v1/policies/new", order, None).await
    }

    async fn pay_policy(
        &self,
        policy_id: &str,
        order: &PaymentOrder,
    ) -> Result<PaymentReceipt, ApiError> {
        let envelope: SuccessEnvelope<PaymentReceipt> = self
            .post_json(&format!("/v1/policies/{policy_id}/pay"), order, None)
            .await?;
        envelope.into_data()
    }

    async fn fetch_token(&self) -> Result<AuthToken, ApiError> {
        let response = self
            .client
            .post(self.url("/v1/auth/token"))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = Self::check_status(response).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(AuthToken {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_at: Timestamp::now().plus_secs(token.expires_in),
        })
    }

    async fn fetch_policy(
        &self,
        policy_id: &str,
        token: &AuthToken,
    ) -> Result<Option<Policy>, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/v1/policies/{policy_id}")))
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        let policy: Policy = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(Some(policy))
    }

    async fn cancel_policy(
        &self,
        policy_id: &str,
        token: &AuthToken,
        order: &CancellationOrder,
    ) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post_json(
                &format!("/v1/policies/{policy_id}/cancel"),
                order,
                Some(token),
            )
            .await?;
        Ok(())
    }

    async fn withdraw_policy(
        &self,
        policy_id: &str,
        token: &AuthToken,
        order: &WithdrawalOrder,
    ) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post_json(
                &format!("/v1/policies/{policy_id}/withdraw"),
                order,
                Some(token),
            )
            .await?;
        Ok(())
    }
}
