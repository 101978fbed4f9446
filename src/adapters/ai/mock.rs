//! Mock extraction and intent adapters for tests and offline runs.
//!
//! Both mocks return pre-configured responses in order and track the
//! calls they received, so tests can drive a whole conversation without
//! a model and then verify what was asked.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::collection::DataCollection;
use crate::ports::{
    ExtractionClient, ExtractionError, IntentClassifier, IntentError, IntentLabel,
    IntentPrediction,
};

/// Mock extraction client with a queue of scripted results.
///
/// An empty queue yields empty records, i.e. "ran and found nothing".
#[derive(Clone, Default)]
pub struct MockExtractionClient {
    responses: Arc<Mutex<VecDeque<Result<DataCollection, String>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockExtractionClient {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful extraction result.
    pub fn with_extraction(self, record: DataCollection) -> Self {
        self.responses.lock().unwrap().push_back(Ok(record));
        self
    }

    /// Queues an extraction built by mutating an empty record.
    pub fn with_fields(self, fill: impl FnOnce(&mut DataCollection)) -> Self {
        let mut record = DataCollection::new();
        fill(&mut record);
        self.with_extraction(record)
    }

    /// Queues a failed extraction.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(Err(message.into()));
        self
    }

    /// Messages passed to `extract`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionClient for MockExtractionClient {
    async fn extract(
        &self,
        user_message: &str,
        _question: Option<&str>,
    ) -> Result<DataCollection, ExtractionError> {
        self.calls.lock().unwrap().push(user_message.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(record)) => Ok(record),
            Some(Err(message)) => Err(ExtractionError::Unavailable(message)),
            None => Ok(DataCollection::new()),
        }
    }
}

/// Mock intent classifier with a queue of scripted predictions.
///
/// An empty queue predicts `continue` with full confidence.
#[derive(Clone, Default)]
pub struct MockIntentClassifier {
    responses: Arc<Mutex<VecDeque<Result<IntentPrediction, String>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockIntentClassifier {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a prediction.
    pub fn with_prediction(self, label: impl Into<String>, confidence: f64) -> Self {
        self.responses.lock().unwrap().push_back(Ok(IntentPrediction {
            label: label.into(),
            confidence,
        }));
        self
    }

    /// Queues a classification failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(Err(message.into()));
        self
    }

    /// Messages passed to `classify`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for MockIntentClassifier {
    async fn classify(
        &self,
        _question: &str,
        user_message: &str,
        _labels: &[IntentLabel],
    ) -> Result<IntentPrediction, IntentError> {
        self.calls.lock().unwrap().push(user_message.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(prediction)) => Ok(prediction),
            Some(Err(message)) => Err(IntentError::Unavailable(message)),
            None => Ok(IntentPrediction {
                label: "continue".to_string(),
                confidence: 1.0,
            }),
        }
    }
}
