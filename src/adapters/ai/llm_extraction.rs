//! LLM-backed implementation of the extraction port.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::json_extract::extract_json;
use super::llm_client::{LlmClient, LlmClientError};
use crate::domain::collection::DataCollection;
use crate::ports::{ExtractionClient, ExtractionError};

const EXTRACTION_PROMPT: &str = "\
You extract structured insurance data from a user message. Respond with a \
single JSON object using only these camelCase keys: dateOfBirth, \
coverageScope (single|withPartner|withChildren|withFamily), hasInsurance, \
hasClaims, claimCount, firstName, lastName, email, street, houseNumber, \
zipCode, city, startDate, iban, policyId, policyTerminationReason \
(extraordinaryTerminationForAnImportantReason|falseDeclarations|\
ordinaryCancellation|withdrawal), policyTerminationDate. Only include keys \
whose value is explicitly stated in the message. Never guess or infer \
missing information; dates and monetary amounts in particular must only be \
extracted when the user stated them. Use ISO format (yyyy-MM-dd is \
preferred but any stated form is acceptable) for dates.";

/// Extraction client backed by a chat-completions endpoint.
pub struct LlmExtractionClient {
    client: LlmClient,
}

impl LlmExtractionClient {
    /// Creates the client.
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExtractionClient for LlmExtractionClient {
    async fn extract(
        &self,
        user_message: &str,
        question: Option<&str>,
    ) -> Result<DataCollection, ExtractionError> {
        let payload = json!({
            "userMessage": user_message,
            "question": question,
        });

        let response = self
            .client
            .complete(EXTRACTION_PROMPT, &payload.to_string())
            .await
            .map_err(|error| match error {
                LlmClientError::Timeout { timeout_secs } => {
                    ExtractionError::Timeout { timeout_secs }
                }
                other => ExtractionError::Unavailable(other.to_string()),
            })?;

        let body = extract_json(&response);
        debug!(bytes = body.len(), "extraction response received");

        // A response that does not parse as the schema counts as a failed
        // extraction; the collection algorithm degrades it to "no new
        // data" rather than surfacing it.
        serde_json::from_str::<DataCollection>(&body)
            .map_err(|e| ExtractionError::Parse(e.to_string()))
    }
}
