//! The workflow step executor.
//!
//! A [`WorkflowDefinition`] is a tree of nodes: plain steps, bounded
//! repeat-until loops, ordered branches, and nested sub-workflows. The
//! executor walks that tree, and when a step suspends it returns the
//! cursor (the index path to the suspended node) together with the
//! envelope that was about to enter the step. Persisting both is all a
//! later invocation needs to resume the run in place.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::workflow::envelope::{ResumePayload, StepData, SuspendPayload};
use crate::domain::workflow::run_context::RunContext;
use crate::domain::workflow::run_state::WorkflowId;
use crate::domain::workflow::step::{EntryPhase, StepError, StepId, StepOutcome, WorkflowStep};

/// Predicate over the step envelope, used by loops and branches.
pub type StepPredicate = Arc<dyn Fn(&StepData) -> bool + Send + Sync>;

/// One node of a workflow definition.
#[derive(Clone)]
pub enum StepNode {
    /// A step executed once.
    Step(Arc<dyn WorkflowStep>),
    /// A step re-invoked (feeding its own output back in) until the
    /// predicate holds on the output.
    DoUntil {
        step: Arc<dyn WorkflowStep>,
        until: StepPredicate,
    },
    /// Ordered `(predicate, target)` pairs; the first match executes.
    /// When nothing matches the node is skipped.
    Branch(Vec<(StepPredicate, StepNode)>),
    /// A whole workflow nested as a single node; its suspensions are
    /// transparent to the parent.
    SubWorkflow(WorkflowDefinition),
}

impl StepNode {
    /// Wraps a step for use as a branch target.
    pub fn step(step: Arc<dyn WorkflowStep>) -> Self {
        StepNode::Step(step)
    }

    /// Wraps a nested workflow for use as a branch target.
    pub fn sub(definition: WorkflowDefinition) -> Self {
        StepNode::SubWorkflow(definition)
    }
}

impl fmt::Debug for StepNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepNode::Step(step) => write!(f, "Step({})", step.id()),
            StepNode::DoUntil { step, .. } => write!(f, "DoUntil({})", step.id()),
            StepNode::Branch(arms) => write!(f, "Branch({} arms)", arms.len()),
            StepNode::SubWorkflow(def) => write!(f, "SubWorkflow({})", def.id()),
        }
    }
}

/// Builds a [`StepPredicate`] from a closure.
pub fn predicate(f: impl Fn(&StepData) -> bool + Send + Sync + 'static) -> StepPredicate {
    Arc::new(f)
}

/// Failures that terminate a run.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("step {step} failed after {attempts} attempt(s): {source}")]
    StepFailed {
        step: StepId,
        attempts: u32,
        #[source]
        source: StepError,
    },

    #[error("cursor {cursor:?} does not address a node of {workflow}")]
    InvalidCursor {
        workflow: WorkflowId,
        cursor: Vec<usize>,
    },
}

/// Terminal result of driving a run as far as it will go this turn.
#[derive(Debug)]
pub enum RunOutcome {
    /// The final node finished; the envelope holds the outcome messages.
    Success(StepData),
    /// A step paused for user input. `cursor` addresses the node,
    /// `step` names it, and `snapshot` is the envelope to feed back in
    /// on resume.
    Suspended {
        payload: SuspendPayload,
        cursor: Vec<usize>,
        step: StepId,
        snapshot: StepData,
    },
    /// The user cancelled; the run is over and must not be resumed.
    Aborted(SuspendPayload),
    /// A step exhausted its attempts.
    Failed(WorkflowError),
}

enum NodeRun {
    Continue(StepData),
    Suspended {
        payload: SuspendPayload,
        cursor: Vec<usize>,
        step: StepId,
        snapshot: StepData,
    },
    Aborted(SuspendPayload),
}

type NodeFuture<'a> = Pin<Box<dyn Future<Output = Result<NodeRun, WorkflowError>> + Send + 'a>>;

/// An executable workflow: an id plus its node tree.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    id: WorkflowId,
    nodes: Vec<StepNode>,
}

impl WorkflowDefinition {
    /// The workflow's identifier.
    pub fn id(&self) -> WorkflowId {
        self.id
    }

    /// Starts a fresh run with the given input envelope.
    pub async fn start(&self, input: StepData, ctx: &mut RunContext) -> RunOutcome {
        match self.run_nodes(input, None, ctx).await {
            Ok(NodeRun::Continue(data)) => RunOutcome::Success(data),
            Ok(NodeRun::Suspended {
                payload,
                cursor,
                step,
                snapshot,
            }) => RunOutcome::Suspended {
                payload,
                cursor,
                step,
                snapshot,
            },
            Ok(NodeRun::Aborted(payload)) => RunOutcome::Aborted(payload),
            Err(error) => RunOutcome::Failed(error),
        }
    }

    /// Resumes a suspended run.
    ///
    /// `snapshot` must be the envelope returned by the suspending
    /// [`RunOutcome::Suspended`]; `cursor` the recorded node path. The
    /// addressed step is re-entered with [`EntryPhase::Resuming`] and
    /// execution continues from there.
    pub async fn resume(
        &self,
        snapshot: StepData,
        cursor: &[usize],
        resume: ResumePayload,
        ctx: &mut RunContext,
    ) -> RunOutcome {
        match self.run_nodes(snapshot, Some((cursor, resume)), ctx).await {
            Ok(NodeRun::Continue(data)) => RunOutcome::Success(data),
            Ok(NodeRun::Suspended {
                payload,
                cursor,
                step,
                snapshot,
            }) => RunOutcome::Suspended {
                payload,
                cursor,
                step,
                snapshot,
            },
            Ok(NodeRun::Aborted(payload)) => RunOutcome::Aborted(payload),
            Err(error) => RunOutcome::Failed(error),
        }
    }

    fn invalid_cursor(&self, cursor: &[usize]) -> WorkflowError {
        WorkflowError::InvalidCursor {
            workflow: self.id,
            cursor: cursor.to_vec(),
        }
    }

    /// Walks this definition's node list, starting at the cursor head
    /// when resuming. Only the first visited node sees the resume entry;
    /// every later node enters fresh.
    fn run_nodes<'a>(
        &'a self,
        mut data: StepData,
        entry: Option<(&'a [usize], ResumePayload)>,
        ctx: &'a mut RunContext,
    ) -> NodeFuture<'a> {
        Box::pin(async move {
            let (start, mut entry) = match entry {
                Some((cursor, resume)) => {
                    let (&head, rest) = cursor
                        .split_first()
                        .ok_or_else(|| self.invalid_cursor(cursor))?;
                    if head >= self.nodes.len() {
                        return Err(self.invalid_cursor(cursor));
                    }
                    (head, Some((rest, resume)))
                }
                None => (0, None),
            };

            let mut index = start;
            while index < self.nodes.len() {
                let node_entry = entry.take();
                match self
                    .run_node(&self.nodes[index], data, node_entry, ctx)
                    .await?
                {
                    NodeRun::Continue(output) => {
                        data = output;
                        index += 1;
                    }
                    NodeRun::Suspended {
                        payload,
                        mut cursor,
                        step,
                        snapshot,
                    } => {
                        cursor.insert(0, index);
                        return Ok(NodeRun::Suspended {
                            payload,
                            cursor,
                            step,
                            snapshot,
                        });
                    }
                    NodeRun::Aborted(payload) => return Ok(NodeRun::Aborted(payload)),
                }
            }

            Ok(NodeRun::Continue(data))
        })
    }

    fn run_node<'a>(
        &'a self,
        node: &'a StepNode,
        data: StepData,
        entry: Option<(&'a [usize], ResumePayload)>,
        ctx: &'a mut RunContext,
    ) -> NodeFuture<'a> {
        Box::pin(async move {
            match node {
                StepNode::Step(step) => {
                    let phase = self.leaf_phase(entry)?;
                    let snapshot = data.clone();
                    match self.execute_step(step.as_ref(), data, phase, ctx).await? {
                        StepOutcome::Continue(output) => Ok(NodeRun::Continue(output)),
                        StepOutcome::Suspend(payload) => Ok(NodeRun::Suspended {
                            payload,
                            cursor: Vec::new(),
                            step: step.id(),
                            snapshot,
                        }),
                        StepOutcome::Abort(payload) => Ok(NodeRun::Aborted(payload)),
                    }
                }

                StepNode::DoUntil { step, until } => {
                    let mut current = data;
                    let mut phase = self.leaf_phase(entry)?;
                    loop {
                        let snapshot = current.clone();
                        match self.execute_step(step.as_ref(), current, phase, ctx).await? {
                            StepOutcome::Continue(output) => {
                                if until(&output) {
                                    return Ok(NodeRun::Continue(output));
                                }
                                current = output;
                                phase = EntryPhase::Fresh;
                            }
                            StepOutcome::Suspend(payload) => {
                                return Ok(NodeRun::Suspended {
                                    payload,
                                    cursor: Vec::new(),
                                    step: step.id(),
                                    snapshot,
                                })
                            }
                            StepOutcome::Abort(payload) => return Ok(NodeRun::Aborted(payload)),
                        }
                    }
                }

                StepNode::Branch(arms) => {
                    if let Some((rest, resume)) = entry {
                        let (&arm_index, arm_rest) = rest
                            .split_first()
                            .ok_or_else(|| self.invalid_cursor(rest))?;
                        let (_, target) = arms
                            .get(arm_index)
                            .ok_or_else(|| self.invalid_cursor(rest))?;
                        return match self
                            .run_node(target, data, Some((arm_rest, resume)), ctx)
                            .await?
                        {
                            NodeRun::Suspended {
                                payload,
                                mut cursor,
                                step,
                                snapshot,
                            } => {
                                cursor.insert(0, arm_index);
                                Ok(NodeRun::Suspended {
                                    payload,
                                    cursor,
                                    step,
                                    snapshot,
                                })
                            }
                            other => Ok(other),
                        };
                    }

                    for (arm_index, (condition, target)) in arms.iter().enumerate() {
                        if condition(&data) {
                            return match self.run_node(target, data, None, ctx).await? {
                                NodeRun::Suspended {
                                    payload,
                                    mut cursor,
                                    step,
                                    snapshot,
                                } => {
                                    cursor.insert(0, arm_index);
                                    Ok(NodeRun::Suspended {
                                        payload,
                                        cursor,
                                        step,
                                        snapshot,
                                    })
                                }
                                other => Ok(other),
                            };
                        }
                    }

                    // No arm matched: the branch is a no-op.
                    Ok(NodeRun::Continue(data))
                }

                StepNode::SubWorkflow(definition) => definition.run_nodes(data, entry, ctx).await,
            }
        })
    }

    /// Entry phase for a leaf step. A non-empty remaining cursor here
    /// means the recorded position no longer matches the definition.
    fn leaf_phase(
        &self,
        entry: Option<(&[usize], ResumePayload)>,
    ) -> Result<EntryPhase, WorkflowError> {
        match entry {
            None => Ok(EntryPhase::Fresh),
            Some((rest, resume)) if rest.is_empty() => Ok(EntryPhase::Resuming(resume)),
            Some((rest, _)) => Err(self.invalid_cursor(rest)),
        }
    }

    /// Runs one step, re-attempting on error up to its declared budget.
    ///
    /// Suspension and abort are outcomes, not errors; they are never
    /// retried.
    async fn execute_step(
        &self,
        step: &dyn WorkflowStep,
        input: StepData,
        phase: EntryPhase,
        ctx: &mut RunContext,
    ) -> Result<StepOutcome, WorkflowError> {
        let budget = step.max_attempts().max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            info!(
                workflow = %self.id,
                step = %step.id(),
                attempt,
                resuming = phase.resume().is_some(),
                "step"
            );
            match step.execute(input.clone(), phase.clone(), ctx).await {
                Ok(outcome) => return Ok(outcome),
                Err(error) if attempt < budget => {
                    warn!(
                        workflow = %self.id,
                        step = %step.id(),
                        attempt,
                        error = %error,
                        "step attempt failed, retrying"
                    );
                }
                Err(error) => {
                    return Err(WorkflowError::StepFailed {
                        step: step.id(),
                        attempts: attempt,
                        source: error,
                    })
                }
            }
        }
    }
}

/// Fluent construction of workflow definitions.
///
/// The composition surface mirrors how the flows read: `then` for
/// unconditional sequence, `do_until` for suspend/resume loops, `branch`
/// for conditional sub-flows, `sub_workflow` for nesting.
pub struct WorkflowBuilder {
    id: WorkflowId,
    nodes: Vec<StepNode>,
}

impl WorkflowBuilder {
    /// Starts a definition for the given workflow id.
    pub fn new(id: WorkflowId) -> Self {
        Self {
            id,
            nodes: Vec::new(),
        }
    }

    /// Appends an unconditional step.
    pub fn then(mut self, step: Arc<dyn WorkflowStep>) -> Self {
        self.nodes.push(StepNode::Step(step));
        self
    }

    /// Appends a repeat-until loop around a step.
    pub fn do_until(
        mut self,
        step: Arc<dyn WorkflowStep>,
        until: impl Fn(&StepData) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.nodes.push(StepNode::DoUntil {
            step,
            until: Arc::new(until),
        });
        self
    }

    /// Appends an ordered branch.
    pub fn branch(mut self, arms: Vec<(StepPredicate, StepNode)>) -> Self {
        self.nodes.push(StepNode::Branch(arms));
        self
    }

    /// Appends a nested workflow.
    pub fn sub_workflow(mut self, definition: WorkflowDefinition) -> Self {
        self.nodes.push(StepNode::SubWorkflow(definition));
        self
    }

    /// Finalizes the definition.
    pub fn build(self) -> WorkflowDefinition {
        WorkflowDefinition {
            id: self.id,
            nodes: self.nodes,
        }
    }
}
