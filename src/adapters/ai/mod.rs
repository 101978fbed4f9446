//! AI adapters - LLM-backed and mock implementations of the extraction
//! and intent-classification ports.

mod json_extract;
mod llm_client;
mod llm_extraction;
mod llm_intent;
mod mock;

pub use json_extract::extract_json;
pub use llm_client::{LlmClient, LlmClientError, LlmConfig};
pub use llm_extraction::LlmExtractionClient;
pub use llm_intent::LlmIntentClassifier;
pub use mock::{MockExtractionClient, MockIntentClassifier};
