//! The workflow runner - the boundary between a conversation turn and
//! the executor.
//!
//! One call per inbound user message: locate the thread's active run and
//! resume it, or start a new one; then persist whatever the turn
//! produced. Aborts and failures clear the active-workflow pointer, so
//! a dead run can never swallow the next message.

use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::registry::WorkflowRegistry;
use super::thread_memory::{ThreadMemory, ThreadUpdate};
use crate::domain::foundation::{ResourceId, RunId, ThreadId};
use crate::domain::workflow::{
    Message, ResumePayload, RunContext, RunOutcome, RunStatus, StepData, WorkflowId,
    WorkflowRunState,
};
use crate::ports::{
    ActiveWorkflow, RunStore, RunStoreError, StoredRun, ThreadStore, ThreadStoreError,
};

/// The only failure text a user ever sees from this layer.
const GENERIC_ERROR: &str =
    "Something went wrong on our side. Please try again in a moment.";

/// Storage failures inside a turn; mapped to the generic error message.
#[derive(Debug, thiserror::Error)]
enum RunnerError {
    #[error(transparent)]
    Thread(#[from] ThreadStoreError),

    #[error(transparent)]
    Run(#[from] RunStoreError),
}

enum Turn {
    Start,
    Resume(ActiveWorkflow, StoredRun),
}

/// Drives workflow runs per conversation turn.
pub struct WorkflowRunner {
    registry: WorkflowRegistry,
    threads: Arc<dyn ThreadStore>,
    runs: Arc<dyn RunStore>,
}

impl WorkflowRunner {
    /// Creates a runner over the given registry and stores.
    pub fn new(
        registry: WorkflowRegistry,
        threads: Arc<dyn ThreadStore>,
        runs: Arc<dyn RunStore>,
    ) -> Self {
        Self {
            registry,
            threads,
            runs,
        }
    }

    /// Handles one inbound user message for a thread.
    ///
    /// Never fails outward: storage and workflow failures surface as a
    /// generic error message while the detail goes to the logs.
    pub async fn handle_message(
        &self,
        workflow_id: WorkflowId,
        thread_id: &ThreadId,
        resource_id: &ResourceId,
        user_message: &str,
    ) -> Vec<Message> {
        match self
            .drive(workflow_id, thread_id, resource_id, user_message)
            .await
        {
            Ok(messages) => messages,
            Err(error) => {
                warn!(%error, workflow = %workflow_id, "turn failed at the storage boundary");
                vec![generic_error(workflow_id)]
            }
        }
    }

    async fn drive(
        &self,
        workflow_id: WorkflowId,
        thread_id: &ThreadId,
        resource_id: &ResourceId,
        user_message: &str,
    ) -> Result<Vec<Message>, RunnerError> {
        let memory = ThreadMemory::new(
            self.threads.clone(),
            workflow_thread(thread_id),
            resource_id.clone(),
        );
        let thread = memory.get().await?;

        let trace_id = RunId::new().to_string();
        let mut ctx = RunContext::new(thread_id.clone(), resource_id.clone(), trace_id);
        ctx.set_authentication(thread.metadata.authentication.clone());

        let prior_collection = thread.metadata.data_collection.clone();

        // At most one active workflow per thread: a stored pointer wins
        // over the requested workflow until its run finishes or dies.
        let turn = match thread.metadata.active_workflow.clone() {
            Some(pointer) => {
                if pointer.id != workflow_id {
                    warn!(
                        requested = %workflow_id,
                        active = %pointer.id,
                        "another workflow is active on this thread, resuming it"
                    );
                }
                match self.runs.load(&pointer.run_id).await? {
                    Some(stored) => Turn::Resume(pointer, stored),
                    None => {
                        warn!(run = %pointer.run_id, "active workflow points at a lost run");
                        memory
                            .update(ThreadUpdate::new().active_workflow(None))
                            .await?;
                        Turn::Start
                    }
                }
            }
            None => Turn::Start,
        };

        let (effective_id, run_id, outcome) = match turn {
            Turn::Resume(pointer, stored) => {
                info!(workflow = %pointer.id, run = %pointer.run_id, "resuming run");
                let definition = self.registry.get(pointer.id);
                let resume = ResumePayload::new(user_message, prior_collection.clone());
                let outcome = definition
                    .resume(stored.snapshot, &stored.state.cursor, resume, &mut ctx)
                    .await;
                (pointer.id, pointer.run_id, outcome)
            }
            Turn::Start => {
                let run_id = RunId::new();
                info!(workflow = %workflow_id, run = %run_id, "starting run");
                let definition = self.registry.get(workflow_id);
                let input = StepData::from_input(
                    Some(user_message.to_string()),
                    prior_collection.clone().unwrap_or_default(),
                );
                let outcome = definition.start(input, &mut ctx).await;
                (workflow_id, run_id, outcome)
            }
        };

        // Steps may have refreshed the platform token; cache it.
        if ctx.authentication() != thread.metadata.authentication.as_ref() {
            memory
                .update(ThreadUpdate::new().authentication(ctx.authentication().cloned()))
                .await?;
        }

        match outcome {
            RunOutcome::Success(output) => {
                self.runs.delete(&run_id).await?;
                memory
                    .update(
                        ThreadUpdate::new()
                            .data_collection(Some(output.data_collection.clone()))
                            .active_workflow(None),
                    )
                    .await?;
                Ok(output.messages)
            }

            RunOutcome::Suspended {
                payload,
                cursor,
                step,
                snapshot,
            } => {
                self.runs
                    .save(StoredRun {
                        state: WorkflowRunState {
                            workflow_id: effective_id,
                            run_id,
                            cursor: cursor.clone(),
                            status: RunStatus::Suspended,
                        },
                        snapshot,
                    })
                    .await?;
                memory
                    .update(
                        ThreadUpdate::new()
                            .data_collection(payload.data_collection.clone().or(prior_collection))
                            .active_workflow(Some(ActiveWorkflow {
                                id: effective_id,
                                run_id,
                                cursor,
                                current_step: step,
                            })),
                    )
                    .await?;
                Ok(payload.messages)
            }

            RunOutcome::Aborted(payload) => {
                info!(workflow = %effective_id, run = %run_id, "run aborted by the user");
                self.runs.delete(&run_id).await?;
                memory
                    .update(
                        ThreadUpdate::new()
                            .data_collection(payload.data_collection.clone().or(prior_collection))
                            .active_workflow(None),
                    )
                    .await?;
                Ok(payload.messages)
            }

            RunOutcome::Failed(error) => {
                warn!(%error, workflow = %effective_id, run = %run_id, "run failed");
                self.runs.delete(&run_id).await?;
                memory
                    .update(
                        ThreadUpdate::new()
                            .data_collection(None)
                            .active_workflow(None),
                    )
                    .await?;
                Ok(vec![generic_error(effective_id)])
            }
        }
    }
}

/// Workflow state lives on its own thread key, apart from chat history.
fn workflow_thread(thread_id: &ThreadId) -> ThreadId {
    ThreadId::new(format!("workflow_{thread_id}"))
}

fn generic_error(workflow_id: WorkflowId) -> Message {
    Message::error(
        GENERIC_ERROR,
        Some(json!({
            "source": "workflow_error",
            "workflowId": workflow_id.as_str(),
        })),
    )
}
