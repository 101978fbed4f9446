//! Reusable data-collection steps.
//!
//! A `CollectStep` owns a subset of required fields and the question to
//! show while any of them is missing. It loops through suspend/resume
//! cycles (under `do_until`) until its own keys are satisfied, running
//! the hybrid collection pipeline on every user answer.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::domain::collection::{merge, CollectionError, CollectionOutcome, FieldKey, HybridCollector};
use crate::domain::workflow::envelope::{StepData, SuspendPayload};
use crate::domain::workflow::message::Message;
use crate::domain::workflow::run_context::RunContext;
use crate::domain::workflow::step::{EntryPhase, StepError, StepId, StepOutcome, WorkflowStep};

/// Action tag on collection `data` messages.
const COLLECT_ACTION: &str = "collect-data";

/// A workflow step that collects a fixed set of fields.
pub struct CollectStep {
    id: StepId,
    keys: Vec<FieldKey>,
    question: String,
    collector: Arc<HybridCollector>,
}

impl CollectStep {
    /// Creates a collection step.
    pub fn new(
        id: StepId,
        keys: impl Into<Vec<FieldKey>>,
        question: impl Into<String>,
        collector: Arc<HybridCollector>,
    ) -> Self {
        Self {
            id,
            keys: keys.into(),
            question: question.into(),
            collector,
        }
    }

    /// The fields this step is responsible for.
    pub fn keys(&self) -> &[FieldKey] {
        &self.keys
    }

    fn question_message(&self, missing: &[FieldKey]) -> Message {
        Message::data(
            json!({
                "message": self.question,
                "missingKeys": missing.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            }),
            Some(COLLECT_ACTION),
        )
    }

    fn error_message(&self, missing: &[FieldKey], error: &CollectionError) -> Message {
        let mut content = json!({
            "message": self.question,
            "missingKeys": missing.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        });
        if let (Some(target), serde_json::Value::Object(details)) =
            (content.as_object_mut(), error.to_json())
        {
            for (key, value) in details {
                target.insert(key, value);
            }
        }
        Message::data(content, Some(COLLECT_ACTION))
    }
}

#[async_trait]
impl WorkflowStep for CollectStep {
    fn id(&self) -> StepId {
        self.id
    }

    async fn execute(
        &self,
        input: StepData,
        phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        // Resume-supplied data wins over the envelope; a user correction
        // from this turn must shadow what the previous turn knew.
        let (resume_collection, user_message) = match &phase {
            EntryPhase::Resuming(resume) => (
                resume.data_collection.clone(),
                Some(resume.user_message.clone()),
            ),
            EntryPhase::Fresh => (None, input.user_message.clone()),
        };
        let data_collection = merge(Some(&input.data_collection), resume_collection.as_ref());

        let missing = data_collection.missing_keys(&self.keys);
        if missing.is_empty() {
            // Everything already known, e.g. volunteered in an earlier
            // step. No extraction call needed.
            return Ok(StepOutcome::Continue(StepData {
                data_collection,
                completed: true,
                ..input
            }));
        }

        let Some(user_message) = user_message.filter(|m| !m.trim().is_empty()) else {
            // First entry without an answer: show the question along with
            // exactly what is unknown.
            return Ok(StepOutcome::Suspend(SuspendPayload::user_input(
                data_collection.clone(),
                vec![self.question_message(&missing)],
            )));
        };

        let outcome = self
            .collector
            .collect(&self.keys, Some(&self.question), &user_message, &data_collection)
            .await;

        match outcome {
            CollectionOutcome::Complete { data } => Ok(StepOutcome::Continue(StepData {
                data_collection: data,
                completed: true,
                ..input
            })),
            CollectionOutcome::Incomplete { data, error } => {
                let message = self.error_message(&missing, &error);
                Ok(StepOutcome::Suspend(SuspendPayload::user_input(
                    data,
                    vec![message],
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collection::{DataCollection, FieldValidators, ValidationRules};
    use crate::domain::foundation::{ResourceId, ThreadId};
    use crate::domain::workflow::envelope::ResumePayload;
    use crate::ports::{ExtractionClient, ExtractionError};
    use chrono::NaiveDate;

    struct FixedExtraction(DataCollection);

    #[async_trait]
    impl ExtractionClient for FixedExtraction {
        async fn extract(
            &self,
            _user_message: &str,
            _question: Option<&str>,
        ) -> Result<DataCollection, ExtractionError> {
            Ok(self.0.clone())
        }
    }

    fn ctx() -> RunContext {
        RunContext::new(ThreadId::new("t1"), ResourceId::new("r1"), "trace")
    }

    fn collector(extracted: DataCollection) -> Arc<HybridCollector> {
        let validators = FieldValidators::new(ValidationRules::default())
            .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        Arc::new(HybridCollector::new(
            Arc::new(FixedExtraction(extracted)),
            validators,
        ))
    }

    fn birth_date_step(extracted: DataCollection) -> CollectStep {
        CollectStep::new(
            StepId::DateOfBirth,
            [FieldKey::DateOfBirth],
            "When were you born?",
            collector(extracted),
        )
    }

    #[tokio::test]
    async fn first_entry_suspends_with_question_and_missing_keys() {
        let step = birth_date_step(DataCollection::new());

        let outcome = step
            .execute(StepData::default(), EntryPhase::Fresh, &mut ctx())
            .await
            .unwrap();

        match outcome {
            StepOutcome::Suspend(payload) => {
                let Message::Data { content, action } = &payload.messages[0] else {
                    panic!("expected data message");
                };
                assert_eq!(action.as_deref(), Some("collect-data"));
                assert_eq!(content["message"], "When were you born?");
                assert_eq!(content["missingKeys"][0], "dateOfBirth");
            }
            other => panic!("expected suspension, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn resume_with_answer_completes_the_step() {
        let mut extracted = DataCollection::new();
        extracted.date_of_birth = Some("15.08.1992".into());
        let step = birth_date_step(extracted);

        let phase = EntryPhase::Resuming(ResumePayload::new("I was born on 15.08.1992", None));
        let outcome = step
            .execute(StepData::default(), phase, &mut ctx())
            .await
            .unwrap();

        match outcome {
            StepOutcome::Continue(data) => {
                assert!(data.completed);
                assert_eq!(data.data_collection.date_of_birth.as_deref(), Some("1992-08-15"));
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn already_satisfied_keys_pass_through_without_extraction() {
        let step = birth_date_step(DataCollection::new());

        let mut input = StepData::default();
        input.data_collection.date_of_birth = Some("1992-08-15".into());

        let outcome = step
            .execute(input, EntryPhase::Fresh, &mut ctx())
            .await
            .unwrap();

        match outcome {
            StepOutcome::Continue(data) => assert!(data.completed),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_value_suspends_with_the_single_error() {
        let mut extracted = DataCollection::new();
        extracted.date_of_birth = Some("31.13.1992".into());
        let step = birth_date_step(extracted);

        let phase = EntryPhase::Resuming(ResumePayload::new("31.13.1992", None));
        let outcome = step
            .execute(StepData::default(), phase, &mut ctx())
            .await
            .unwrap();

        match outcome {
            StepOutcome::Suspend(payload) => {
                let Message::Data { content, .. } = &payload.messages[0] else {
                    panic!("expected data message");
                };
                assert_eq!(content["type"], "wrong_format");
                assert_eq!(content["field"], "dateOfBirth");
                // The merged-but-unvalidated value is preserved.
                assert_eq!(
                    payload.data_collection.as_ref().unwrap().date_of_birth.as_deref(),
                    Some("31.13.1992")
                );
            }
            other => panic!("expected suspension, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn resume_collection_shadows_envelope_values() {
        let step = CollectStep::new(
            StepId::FullName,
            [FieldKey::FirstName],
            "What's your name?",
            collector(DataCollection::new()),
        );

        let mut input = StepData::default();
        input.data_collection.first_name = Some("Old".into());

        let mut corrected = DataCollection::new();
        corrected.first_name = Some("New".into());
        let phase = EntryPhase::Resuming(ResumePayload::new("call me New", Some(corrected)));

        let outcome = step.execute(input, phase, &mut ctx()).await.unwrap();
        match outcome {
            StepOutcome::Continue(data) => {
                assert_eq!(data.data_collection.first_name.as_deref(), Some("New"));
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn completion_invariant_holds() {
        // Extraction yields only one of two required keys: the step must
        // not report completion.
        let mut extracted = DataCollection::new();
        extracted.first_name = Some("Mara".into());
        let step = CollectStep::new(
            StepId::FullName,
            [FieldKey::FirstName, FieldKey::LastName],
            "Your full name?",
            collector(extracted),
        );

        let phase = EntryPhase::Resuming(ResumePayload::new("Mara", None));
        let outcome = step
            .execute(StepData::default(), phase, &mut ctx())
            .await
            .unwrap();

        match outcome {
            StepOutcome::Suspend(payload) => {
                let data = payload.data_collection.unwrap();
                assert!(data.missing_keys(&[FieldKey::LastName]) == vec![FieldKey::LastName]);
            }
            StepOutcome::Continue(data) => {
                panic!("completed with missing keys: {:?}", data.data_collection)
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
