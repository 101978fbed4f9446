//! Steps shared between workflows.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::domain::workflow::{
    derive_intent, EntryPhase, IntentChoice, Message, RunContext, StepData, StepError, StepId,
    StepOutcome, SuspendPayload, WorkflowStep,
};
use crate::ports::IntentClassifier;

/// A gate the user must wave through.
///
/// On fresh entry the step shows its question and suspends. On resume it
/// asks the intent classifier whether the reply cancels or continues:
/// cancel aborts the whole run, everything else completes the step. The
/// forward default means an unreliable classifier can never strand the
/// conversation here.
pub struct ConfirmStep {
    id: StepId,
    question: String,
    cancel_message: String,
    intent: Arc<dyn IntentClassifier>,
}

impl ConfirmStep {
    /// Creates a confirmation gate.
    pub fn new(
        id: StepId,
        question: impl Into<String>,
        cancel_message: impl Into<String>,
        intent: Arc<dyn IntentClassifier>,
    ) -> Self {
        Self {
            id,
            question: question.into(),
            cancel_message: cancel_message.into(),
            intent,
        }
    }
}

#[async_trait]
impl WorkflowStep for ConfirmStep {
    fn id(&self) -> StepId {
        self.id
    }

    async fn execute(
        &self,
        mut input: StepData,
        phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        let Some(resume) = phase.resume() else {
            return Ok(StepOutcome::Suspend(SuspendPayload::user_input(
                input.data_collection.clone(),
                vec![Message::text(self.question.clone())],
            )));
        };

        let choice =
            derive_intent(self.intent.as_ref(), &self.question, &resume.user_message).await;
        if choice == IntentChoice::Cancel {
            return Ok(StepOutcome::Abort(SuspendPayload::abort(
                input.data_collection.clone(),
                vec![Message::text(self.cancel_message.clone())],
            )));
        }

        input.completed = true;
        Ok(StepOutcome::Continue(input))
    }
}

/// Shows the authenticated policy and waits for the user to go on.
///
/// The payload is a `data` message so the presentation layer can phrase
/// the summary and the continuation question itself. The IBAN is masked
/// to its last four digits before it leaves the core.
pub struct DisplayPolicyDataStep;

impl DisplayPolicyDataStep {
    fn masked_iban(iban: Option<&str>) -> String {
        match iban {
            Some(iban) if iban.len() >= 4 => format!("****{}", &iban[iban.len() - 4..]),
            _ => "****".to_string(),
        }
    }
}

#[async_trait]
impl WorkflowStep for DisplayPolicyDataStep {
    fn id(&self) -> StepId {
        StepId::DisplayPolicyData
    }

    async fn execute(
        &self,
        input: StepData,
        phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        if phase.resume().is_some() {
            return Ok(StepOutcome::Continue(input));
        }

        let policy = input
            .policy
            .as_ref()
            .ok_or(StepError::MissingData("policy"))?;

        let summary = json!({
            "policyId": policy.pretty_id,
            "status": policy.status,
            "firstName": policy.customer.first_name,
            "lastName": policy.customer.last_name,
            "dateOfBirth": policy.customer.values.date_of_birth,
            "email": policy.customer.email,
            "address": format!(
                "{} {}, {} {}",
                policy.customer.values.address_street,
                policy.customer.values.address_house_number,
                policy.customer.values.address_plz,
                policy.customer.values.address_city,
            ),
            "tariff": policy.package_name,
            "startDate": policy.starts_at.to_rfc3339(),
            "iban": Self::masked_iban(policy.iban.as_deref()),
            "cancelledAt": policy.cancelled_at.map(|t| t.to_rfc3339()),
            "withdrawnAt": policy.withdrawn_at.map(|t| t.to_rfc3339()),
        });

        Ok(StepOutcome::Suspend(SuspendPayload::user_input(
            input.data_collection.clone(),
            vec![Message::data(
                json!({
                    "prompt": "Display the policy data and ask how to continue.",
                    "policyData": summary,
                }),
                None,
            )],
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::insurance::MockInsuranceApi;
    use crate::domain::foundation::{ResourceId, ThreadId};
    use crate::domain::workflow::ResumePayload;

    fn ctx() -> RunContext {
        RunContext::new(ThreadId::new("t1"), ResourceId::new("r1"), "trace")
    }

    #[tokio::test]
    async fn fresh_entry_suspends_with_masked_summary() {
        let mut input = StepData::default();
        input.policy = Some(MockInsuranceApi::sample_policy("pol-1", 30));

        let outcome = DisplayPolicyDataStep
            .execute(input, EntryPhase::Fresh, &mut ctx())
            .await
            .unwrap();

        match outcome {
            StepOutcome::Suspend(payload) => {
                let Message::Data { content, .. } = &payload.messages[0] else {
                    panic!("expected data message");
                };
                assert_eq!(content["policyData"]["iban"], "****3000");
                assert_eq!(content["policyData"]["firstName"], "Mara");
            }
            other => panic!("expected suspension, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn resume_passes_through() {
        let mut input = StepData::default();
        input.policy = Some(MockInsuranceApi::sample_policy("pol-1", 30));

        let outcome = DisplayPolicyDataStep
            .execute(
                input.clone(),
                EntryPhase::Resuming(ResumePayload::new("ok", None)),
                &mut ctx(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::Continue(input));
    }

    #[tokio::test]
    async fn missing_policy_is_a_step_error() {
        let result = DisplayPolicyDataStep
            .execute(StepData::default(), EntryPhase::Fresh, &mut ctx())
            .await;
        assert!(result.is_err());
    }

    mod confirm_step {
        use super::*;
        use crate::adapters::ai::MockIntentClassifier;

        fn step(intent: MockIntentClassifier) -> ConfirmStep {
            ConfirmStep::new(
                StepId::PaymentConfirmation,
                "Shall we proceed to payment?",
                "Alright, I've stopped the process.",
                Arc::new(intent),
            )
        }

        #[tokio::test]
        async fn fresh_entry_asks_the_question() {
            let outcome = step(MockIntentClassifier::new())
                .execute(StepData::default(), EntryPhase::Fresh, &mut ctx())
                .await
                .unwrap();

            match outcome {
                StepOutcome::Suspend(payload) => {
                    assert_eq!(
                        payload.messages[0],
                        Message::text("Shall we proceed to payment?")
                    );
                }
                other => panic!("expected suspension, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn confident_cancel_aborts() {
            let intent = MockIntentClassifier::new().with_prediction("cancel", 0.9);
            let outcome = step(intent)
                .execute(
                    StepData::default(),
                    EntryPhase::Resuming(ResumePayload::new("stop", None)),
                    &mut ctx(),
                )
                .await
                .unwrap();

            assert!(matches!(outcome, StepOutcome::Abort(_)));
        }

        #[tokio::test]
        async fn classifier_failure_continues() {
            let intent = MockIntentClassifier::new().with_failure("down");
            let outcome = step(intent)
                .execute(
                    StepData::default(),
                    EntryPhase::Resuming(ResumePayload::new("??", None)),
                    &mut ctx(),
                )
                .await
                .unwrap();

            match outcome {
                StepOutcome::Continue(data) => assert!(data.completed),
                other => panic!("expected completion, got {:?}", other),
            }
        }
    }
}
