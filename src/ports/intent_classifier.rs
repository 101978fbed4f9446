//! Intent Classifier Port - closed-set intent labeling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One allowed label, with hint text describing utterances that map to
/// it. The hints travel to the classifier the way schema descriptions
/// travel to the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentLabel {
    pub label: &'static str,
    pub hint: &'static str,
}

/// Classifier output: the chosen label and the model's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPrediction {
    pub label: String,
    pub confidence: f64,
}

/// Failures of the classification capability.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("intent service unavailable: {0}")]
    Unavailable(String),

    #[error("intent response could not be parsed: {0}")]
    Parse(String),
}

/// Port for the intent-classification capability.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Maps the user's reply to one of the allowed labels.
    ///
    /// `question` is the last question shown, which disambiguates short
    /// replies. The returned label is one of `labels` or the call fails
    /// with [`IntentError::Parse`].
    async fn classify(
        &self,
        question: &str,
        user_message: &str,
        labels: &[IntentLabel],
    ) -> Result<IntentPrediction, IntentError>;
}
