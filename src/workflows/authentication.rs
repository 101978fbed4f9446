//! Authentication workflow: identify the caller against their policy.
//!
//! Collects the identity fields, fetches (or refreshes) a platform
//! token into the run context, loads the policy, and checks the
//! collected identity against the policy's customer record.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::WorkflowToolkit;
use crate::domain::collection::FieldKey;
use crate::domain::foundation::Timestamp;
use crate::domain::workflow::{
    CollectStep, EntryPhase, RunContext, StepData, StepError, StepId, StepOutcome,
    WorkflowBuilder, WorkflowDefinition, WorkflowId, WorkflowStep,
};
use crate::ports::InsuranceApi;

const AUTHENTICATION_QUESTION: &str =
    "To look up your policy I need your policy number, first and last name, \
     and date of birth.";

/// Fetches or refreshes the platform token into the run context.
pub struct FetchTokenStep {
    api: Arc<dyn InsuranceApi>,
}

#[async_trait]
impl WorkflowStep for FetchTokenStep {
    fn id(&self) -> StepId {
        StepId::FetchToken
    }

    async fn execute(
        &self,
        input: StepData,
        _phase: EntryPhase,
        ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        let needs_refresh = match ctx.authentication() {
            Some(token) => token.is_expired(Timestamp::now()),
            None => true,
        };
        if needs_refresh {
            let token = self.api.fetch_token().await?;
            info!("platform token refreshed");
            ctx.set_authentication(Some(token));
        }
        Ok(StepOutcome::Continue(input))
    }
}

/// Loads the policy named in the collected data.
pub struct FetchPolicyStep {
    api: Arc<dyn InsuranceApi>,
}

#[async_trait]
impl WorkflowStep for FetchPolicyStep {
    fn id(&self) -> StepId {
        StepId::FetchPolicy
    }

    fn max_attempts(&self) -> u32 {
        3
    }

    async fn execute(
        &self,
        mut input: StepData,
        _phase: EntryPhase,
        ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        let policy_id = input
            .data_collection
            .policy_id
            .clone()
            .ok_or(StepError::MissingData("policy id"))?;
        let token = ctx
            .authentication()
            .cloned()
            .ok_or(StepError::MissingData("access token"))?;

        let policy = self
            .api
            .fetch_policy(&policy_id, &token)
            .await?
            .ok_or(StepError::MissingData("policy not found"))?;

        input.policy = Some(policy);
        input.completed = true;
        Ok(StepOutcome::Continue(input))
    }
}

/// Checks the collected identity against the policy's customer record.
pub struct ValidateAuthenticationStep;

#[async_trait]
impl WorkflowStep for ValidateAuthenticationStep {
    fn id(&self) -> StepId {
        StepId::ValidateAuthentication
    }

    async fn execute(
        &self,
        mut input: StepData,
        _phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        let policy = input
            .policy
            .as_ref()
            .ok_or(StepError::MissingData("policy"))?;
        let collected = &input.data_collection;

        if collected.first_name.as_deref() != Some(policy.customer.first_name.as_str()) {
            return Err(StepError::IdentityMismatch("first name does not match"));
        }
        if collected.last_name.as_deref() != Some(policy.customer.last_name.as_str()) {
            return Err(StepError::IdentityMismatch("last name does not match"));
        }
        if collected.date_of_birth.as_deref()
            != Some(policy.customer.values.date_of_birth.as_str())
        {
            return Err(StepError::IdentityMismatch("date of birth does not match"));
        }

        input.completed = true;
        Ok(StepOutcome::Continue(input))
    }
}

/// Assembles the authentication workflow.
pub fn authentication_workflow(toolkit: &WorkflowToolkit) -> WorkflowDefinition {
    let data_step = Arc::new(CollectStep::new(
        StepId::AuthenticationData,
        [
            FieldKey::DateOfBirth,
            FieldKey::PolicyId,
            FieldKey::FirstName,
            FieldKey::LastName,
        ],
        AUTHENTICATION_QUESTION,
        toolkit.collector.clone(),
    ));

    WorkflowBuilder::new(WorkflowId::AuthenticationWorkflow)
        .do_until(data_step, |data| data.completed)
        .then(Arc::new(FetchTokenStep {
            api: toolkit.api.clone(),
        }))
        .then(Arc::new(FetchPolicyStep {
            api: toolkit.api.clone(),
        }))
        .then(Arc::new(ValidateAuthenticationStep))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockExtractionClient, MockIntentClassifier};
    use crate::adapters::insurance::MockInsuranceApi;
    use crate::domain::collection::{FieldValidators, HybridCollector, ValidationRules};
    use crate::domain::foundation::{ResourceId, ThreadId};
    use crate::domain::workflow::{ResumePayload, RunOutcome};

    fn toolkit(extraction: MockExtractionClient, api: MockInsuranceApi) -> WorkflowToolkit {
        let collector = Arc::new(HybridCollector::new(
            Arc::new(extraction),
            FieldValidators::new(ValidationRules::default()),
        ));
        WorkflowToolkit::new(
            collector,
            Arc::new(MockIntentClassifier::new()),
            Arc::new(api),
            ValidationRules::default().max_claim_count,
        )
    }

    fn ctx() -> RunContext {
        RunContext::new(ThreadId::new("t1"), ResourceId::new("r1"), "trace")
    }

    #[tokio::test]
    async fn authenticates_against_a_matching_policy() {
        let extraction = MockExtractionClient::new().with_fields(|r| {
            r.policy_id = Some("pol-1".into());
            r.first_name = Some("Mara".into());
            r.last_name = Some("Sommer".into());
            r.date_of_birth = Some("1992-08-15".into());
        });
        let api = MockInsuranceApi::new().with_policy(MockInsuranceApi::sample_policy("pol-1", 30));
        let workflow = authentication_workflow(&toolkit(extraction, api));

        let mut context = ctx();

        // First turn: the data step suspends with its question.
        let (cursor, snapshot) = match workflow.start(StepData::default(), &mut context).await {
            RunOutcome::Suspended {
                cursor, snapshot, ..
            } => (cursor, snapshot),
            other => panic!("expected suspension, got {:?}", other),
        };

        // Second turn: the user supplies everything at once.
        let outcome = workflow
            .resume(
                snapshot,
                &cursor,
                ResumePayload::new(
                    "Mara Sommer, policy pol-1, born 1992-08-15",
                    None,
                ),
                &mut context,
            )
            .await;

        match outcome {
            RunOutcome::Success(data) => {
                assert!(data.completed);
                assert_eq!(data.policy.unwrap().pretty_id, "P-pol-1");
                assert!(context.authentication().is_some());
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn mismatched_identity_fails_the_run() {
        let extraction = MockExtractionClient::new().with_fields(|r| {
            r.policy_id = Some("pol-1".into());
            r.first_name = Some("Eve".into());
            r.last_name = Some("Sommer".into());
            r.date_of_birth = Some("1992-08-15".into());
        });
        let api = MockInsuranceApi::new().with_policy(MockInsuranceApi::sample_policy("pol-1", 30));
        let workflow = authentication_workflow(&toolkit(extraction, api));

        let mut context = ctx();
        let (cursor, snapshot) = match workflow.start(StepData::default(), &mut context).await {
            RunOutcome::Suspended {
                cursor, snapshot, ..
            } => (cursor, snapshot),
            other => panic!("expected suspension, got {:?}", other),
        };

        let outcome = workflow
            .resume(
                snapshot,
                &cursor,
                ResumePayload::new("it's Eve", None),
                &mut context,
            )
            .await;

        assert!(matches!(outcome, RunOutcome::Failed(_)));
    }
}
