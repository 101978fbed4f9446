//! Policy management workflows: inquiry and termination.
//!
//! Both start with authentication. Termination computes its path from the
//! policy's age: inside the 14-day revocation window a withdrawal is
//! filed, afterwards an ordinary cancellation; policies already disputed
//! need nothing and the flow aborts with an explanation.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::authentication::authentication_workflow;
use super::shared::{ConfirmStep, DisplayPolicyDataStep};
use super::WorkflowToolkit;
use crate::domain::collection::FieldKey;
use crate::domain::foundation::Timestamp;
use crate::domain::insurance::{CancellationOrder, WithdrawalOrder};
use crate::domain::workflow::{
    predicate, CollectStep, EntryPhase, Message, RunContext, StepData, StepError, StepId,
    StepNode, StepOutcome, SuspendPayload, TerminationPath, WorkflowBuilder, WorkflowDefinition,
    WorkflowId, WorkflowStep,
};
use crate::ports::InsuranceApi;

/// Days after policy start during which withdrawal replaces cancellation.
const WITHDRAWAL_WINDOW_DAYS: i64 = 14;

/// Chooses between cancellation, withdrawal, and nothing-to-do.
struct DeterminePathStep;

#[async_trait]
impl WorkflowStep for DeterminePathStep {
    fn id(&self) -> StepId {
        StepId::DeterminePath
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

        let path = if policy.cancelled_at.is_some() || policy.withdrawn_at.is_some() {
            TerminationPath::NotNeeded
        } else {
            let age = Timestamp::now()
                .as_datetime()
                .signed_duration_since(*policy.starts_at.as_datetime())
                .num_days();
            if age >= WITHDRAWAL_WINDOW_DAYS {
                TerminationPath::Cancellation
            } else {
                TerminationPath::Withdrawal
            }
        };

        info!(?path, "termination path determined");
        input.termination_path = Some(path);
        Ok(StepOutcome::Continue(input))
    }
}

/// Ends the flow when the policy is already cancelled or withdrawn.
struct AbortTerminationStep;

#[async_trait]
impl WorkflowStep for AbortTerminationStep {
    fn id(&self) -> StepId {
        StepId::AbortTermination
    }

    async fn execute(
        &self,
        input: StepData,
        _phase: EntryPhase,
        _ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        Ok(StepOutcome::Abort(SuspendPayload::abort(
            input.data_collection,
            vec![Message::text(
                "This policy is already terminated; there is nothing to do.",
            )],
        )))
    }
}

/// Files the cancellation or withdrawal at the platform.
struct TerminatePolicyStep {
    api: Arc<dyn InsuranceApi>,
}

#[async_trait]
impl WorkflowStep for TerminatePolicyStep {
    fn id(&self) -> StepId {
        StepId::TerminatePolicy
    }

    async fn execute(
        &self,
        mut input: StepData,
        _phase: EntryPhase,
        ctx: &mut RunContext,
    ) -> Result<StepOutcome, StepError> {
        let collection = &input.data_collection;
        let policy_id = collection
            .policy_id
            .clone()
            .ok_or(StepError::MissingData("policy id"))?;
        let token = ctx
            .authentication()
            .cloned()
            .ok_or(StepError::MissingData("access token"))?;
        let reason = collection
            .policy_termination_reason
            .ok_or(StepError::MissingData("termination reason"))?;

        match input.termination_path {
            Some(TerminationPath::Cancellation) => {
                let cancel_at = collection
                    .policy_termination_date
                    .clone()
                    .ok_or(StepError::MissingData("cancellation date"))?;
                self.api
                    .cancel_policy(&policy_id, &token, &CancellationOrder { cancel_at, reason })
                    .await?;
            }
            Some(TerminationPath::Withdrawal) => {
                // Withdrawal needs no date from the user; default today.
                let withdraw_at = collection.policy_termination_date.clone().unwrap_or_else(
                    || Timestamp::now().date().format("%Y-%m-%d").to_string(),
                );
                self.api
                    .withdraw_policy(
                        &policy_id,
                        &token,
                        &WithdrawalOrder { withdraw_at, reason },
                    )
                    .await?;
            }
            Some(TerminationPath::NotNeeded) | None => {
                return Err(StepError::MissingData("termination path"));
            }
        }

        info!(%policy_id, path = ?input.termination_path, "termination filed");
        input.messages = vec![Message::text(
            "Done, your termination request has been filed. You'll receive a \
             confirmation shortly.",
        )];
        input.completed = true;
        Ok(StepOutcome::Continue(input))
    }
}

/// Inquiry: authenticate, then show the policy.
pub fn policy_management_workflow(toolkit: &WorkflowToolkit) -> WorkflowDefinition {
    WorkflowBuilder::new(WorkflowId::PolicyManagementWorkflow)
        .sub_workflow(authentication_workflow(toolkit))
        .then(Arc::new(DisplayPolicyDataStep))
        .build()
}

fn termination_branch(
    toolkit: &WorkflowToolkit,
    collect_id: StepId,
    keys: Vec<FieldKey>,
    question: &str,
) -> WorkflowDefinition {
    let collect_step = Arc::new(CollectStep::new(
        collect_id,
        keys,
        question,
        toolkit.collector.clone(),
    ));
    let confirm = Arc::new(ConfirmStep::new(
        StepId::ConfirmTermination,
        "I'm about to file the termination. Shall I proceed?",
        "Alright, the termination was not filed.",
        toolkit.intent.clone(),
    ));

    WorkflowBuilder::new(WorkflowId::PolicyManagementTerminateWorkflow)
        .do_until(collect_step, |data| data.completed)
        .do_until(confirm, |data| data.completed)
        .then(Arc::new(TerminatePolicyStep {
            api: toolkit.api.clone(),
        }))
        .build()
}

/// Termination: authenticate, show the policy, pick the path, collect
/// the matching fields, confirm, file.
pub fn policy_management_terminate_workflow(toolkit: &WorkflowToolkit) -> WorkflowDefinition {
    let cancellation_flow = termination_branch(
        toolkit,
        StepId::CollectCancellationData,
        vec![
            FieldKey::PolicyTerminationReason,
            FieldKey::PolicyTerminationDate,
        ],
        "To cancel your policy I need the reason and the date the \
         cancellation should take effect.",
    );
    let withdrawal_flow = termination_branch(
        toolkit,
        StepId::CollectWithdrawalData,
        vec![FieldKey::PolicyTerminationReason],
        "You're within the revocation window, so we can withdraw the \
         contract entirely. What is the reason?",
    );

    WorkflowBuilder::new(WorkflowId::PolicyManagementTerminateWorkflow)
        .sub_workflow(authentication_workflow(toolkit))
        .then(Arc::new(DisplayPolicyDataStep))
        .then(Arc::new(DeterminePathStep))
        .branch(vec![
            (
                predicate(|data| data.termination_path == Some(TerminationPath::NotNeeded)),
                StepNode::step(Arc::new(AbortTerminationStep)),
            ),
            (
                predicate(|data| {
                    data.termination_path == Some(TerminationPath::Cancellation)
                }),
                StepNode::sub(cancellation_flow),
            ),
            (
                predicate(|data| data.termination_path == Some(TerminationPath::Withdrawal)),
                StepNode::sub(withdrawal_flow),
            ),
        ])
        .build()
}
