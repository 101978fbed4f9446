//! LLM-backed implementation of the intent classifier port.

use async_trait::async_trait;
use serde_json::json;

use super::json_extract::extract_json;
use super::llm_client::LlmClient;
use crate::ports::{IntentClassifier, IntentError, IntentLabel, IntentPrediction};

const INTENT_PROMPT: &str = "\
You classify a user's reply to a question into exactly one of the allowed \
intents. Respond with a single JSON object {\"intent\": <label>, \
\"confidence\": <0.0-1.0>}. The label must be one of the allowed labels; \
pick the one whose description matches best and express how certain you \
are in the confidence value.";

/// Intent classifier backed by a chat-completions endpoint.
pub struct LlmIntentClassifier {
    client: LlmClient,
}

impl LlmIntentClassifier {
    /// Creates the classifier.
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, serde::Deserialize)]
struct IntentResponse {
    intent: String,
    confidence: f64,
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(
        &self,
        question: &str,
        user_message: &str,
        labels: &[IntentLabel],
    ) -> Result<IntentPrediction, IntentError> {
        let payload = json!({
            "question": question,
            "userMessage": user_message,
            "allowedIntents": labels
                .iter()
                .map(|l| json!({"label": l.label, "description": l.hint}))
                .collect::<Vec<_>>(),
        });

        let response = self
            .client
            .complete(INTENT_PROMPT, &payload.to_string())
            .await
            .map_err(|e| IntentError::Unavailable(e.to_string()))?;

        let parsed: IntentResponse = serde_json::from_str(&extract_json(&response))
            .map_err(|e| IntentError::Parse(e.to_string()))?;

        if !labels.iter().any(|l| l.label == parsed.intent) {
            return Err(IntentError::Parse(format!(
                "label `{}` is not in the allowed set",
                parsed.intent
            )));
        }

        Ok(IntentPrediction {
            label: parsed.intent,
            confidence: parsed.confidence,
        })
    }
}
