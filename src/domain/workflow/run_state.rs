//! Run identity and lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{RunId, StateMachine};

/// The workflows this deployment ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowId {
    SalesWorkflow,
    AuthenticationWorkflow,
    PolicyManagementWorkflow,
    PolicyManagementTerminateWorkflow,
}

impl WorkflowId {
    /// Wire name of the workflow.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowId::SalesWorkflow => "sales-workflow",
            WorkflowId::AuthenticationWorkflow => "authentication-workflow",
            WorkflowId::PolicyManagementWorkflow => "policy-management-workflow",
            WorkflowId::PolicyManagementTerminateWorkflow => {
                "policy-management-terminate-workflow"
            }
        }
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Suspended,
    Success,
    Failed,
}

impl StateMachine for RunStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use RunStatus::*;
        matches!(
            (self, target),
            (Running, Suspended) | (Running, Success) | (Running, Failed) | (Suspended, Running)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use RunStatus::*;
        match self {
            Running => vec![Suspended, Success, Failed],
            Suspended => vec![Running],
            Success | Failed => vec![],
        }
    }
}

/// Position and status of one workflow run.
///
/// The cursor addresses the suspended node inside the (possibly nested)
/// workflow definition; it is what gets mirrored into thread memory so an
/// unrelated process invocation can resume the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRunState {
    pub workflow_id: WorkflowId,
    pub run_id: RunId,
    pub cursor: Vec<usize>,
    pub status: RunStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspended_runs_can_only_resume() {
        assert_eq!(RunStatus::Suspended.valid_transitions(), vec![RunStatus::Running]);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(RunStatus::Success.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }

    #[test]
    fn running_cannot_jump_back_to_running() {
        assert!(RunStatus::Running.transition_to(RunStatus::Running).is_err());
    }

    #[test]
    fn suspend_resume_cycle_is_legal() {
        let status = RunStatus::Running
            .transition_to(RunStatus::Suspended)
            .and_then(|s| s.transition_to(RunStatus::Running))
            .and_then(|s| s.transition_to(RunStatus::Success))
            .unwrap();
        assert_eq!(status, RunStatus::Success);
    }

    #[test]
    fn workflow_id_wire_names_match_serde() {
        let json = serde_json::to_string(&WorkflowId::SalesWorkflow).unwrap();
        assert_eq!(json, "\"sales-workflow\"");
    }
}
