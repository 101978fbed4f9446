//! Hybrid data collection.
//!
//! Combines probabilistic extraction with deterministic validation:
//! extract over the whole schema, merge into what is already known,
//! validate, then check the current step's keys for completeness. A
//! failed extraction is not an error the user sees; it degrades to "this
//! turn supplied no new data" and the step re-asks for what is missing.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use super::merge::merge;
use super::record::{DataCollection, FieldKey};
use super::validators::{FieldValidators, ValueError};
use crate::ports::ExtractionClient;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub field: FieldKey,
    pub error: ValueError,
}

impl ValidationFailure {
    /// Wire representation: `{type, field, params}`.
    pub fn to_json(&self) -> serde_json::Value {
        let params: HashMap<String, String> = self.error.params();
        json!({
            "type": self.error.code(),
            "field": self.field.as_str(),
            "params": params,
        })
    }
}

/// Why a collection turn came up short.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionError {
    /// A present value is invalid. Always reported before missing fields
    /// so the user resolves one conflict at a time.
    Validation(ValidationFailure),
    /// Required fields are still absent.
    MissingFields(Vec<FieldKey>),
}

impl CollectionError {
    /// Wire representation, matching the shapes the conversation layer
    /// phrases questions around.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CollectionError::Validation(failure) => failure.to_json(),
            CollectionError::MissingFields(fields) => json!({
                "type": "missing_fields",
                "fields": fields.iter().map(|f| f.as_str()).collect::<Vec<_>>(),
            }),
        }
    }
}

/// Result of one collection turn.
///
/// Both variants carry the merged record: even an incomplete turn may
/// have learned values that must not be dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionOutcome {
    /// Every required key is present and valid.
    Complete { data: DataCollection },
    /// More input is needed; the step suspends with the error.
    Incomplete {
        data: DataCollection,
        error: CollectionError,
    },
}

impl CollectionOutcome {
    /// The merged record, regardless of completeness.
    pub fn data(&self) -> &DataCollection {
        match self {
            CollectionOutcome::Complete { data } => data,
            CollectionOutcome::Incomplete { data, .. } => data,
        }
    }
}

/// Orchestrates extraction, merge, validation and the completion check.
pub struct HybridCollector {
    extraction: Arc<dyn ExtractionClient>,
    validators: FieldValidators,
}

impl HybridCollector {
    /// Creates a collector over the given extraction client and
    /// validator set.
    pub fn new(extraction: Arc<dyn ExtractionClient>, validators: FieldValidators) -> Self {
        Self {
            extraction,
            validators,
        }
    }

    /// Runs one collection turn.
    ///
    /// `keys` are the current step's required fields; only they decide
    /// completion. Extraction always runs over the full schema because a
    /// user may volunteer values belonging to a later step.
    pub async fn collect(
        &self,
        keys: &[FieldKey],
        question: Option<&str>,
        user_message: &str,
        existing: &DataCollection,
    ) -> CollectionOutcome {
        let extracted = match self.extraction.extract(user_message, question).await {
            Ok(partial) => {
                info!(?keys, "extraction succeeded");
                partial
            }
            Err(error) => {
                // Degrades to an empty turn; the missing-fields path
                // below re-asks for whatever is still absent.
                debug!(%error, "extraction failed, continuing without new data");
                DataCollection::new()
            }
        };

        let merged = merge(Some(existing), Some(&extracted));
        let (cleaned, failures) = self.validate_and_clean(merged);

        if let Some(first) = failures.into_iter().next() {
            info!(field = %first.field, code = first.error.code(), "validation conflict");
            return CollectionOutcome::Incomplete {
                data: cleaned,
                error: CollectionError::Validation(first),
            };
        }

        let missing = cleaned.missing_keys(keys);
        if missing.is_empty() {
            info!(?keys, "collection complete");
            return CollectionOutcome::Complete { data: cleaned };
        }

        CollectionOutcome::Incomplete {
            data: cleaned,
            error: CollectionError::MissingFields(missing),
        }
    }

    /// Validates every present field in schema order.
    ///
    /// Passing values are replaced by their canonical form; failing
    /// values are kept as-is (the user corrects them next turn) and
    /// collected in order, so the first element is the first schema
    /// field that failed.
    fn validate_and_clean(&self, data: DataCollection) -> (DataCollection, Vec<ValidationFailure>) {
        let mut cleaned = data;
        let mut failures = Vec::new();

        for key in FieldKey::ALL {
            if cleaned.is_empty(key) {
                continue;
            }
            let raw = cleaned.text(key).map(str::to_string);
            if let Some(outcome) = self.validators.validate(key, raw.as_deref()) {
                match outcome {
                    Ok(canonical) => cleaned.set_text(key, canonical),
                    Err(error) => failures.push(ValidationFailure { field: key, error }),
                }
            }
        }

        (cleaned, failures)
    }
}
