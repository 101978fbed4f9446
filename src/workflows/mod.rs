//! Workflows - the concrete business processes built on the executor.
//!
//! Each function assembles a [`WorkflowDefinition`] from collection steps
//! and the process-specific steps defined here. Definitions are built
//! once at startup; a workflow referencing an unknown step cannot exist.

mod authentication;
mod policy_management;
mod sales;
mod shared;

use std::sync::Arc;

use crate::domain::collection::HybridCollector;
use crate::ports::{InsuranceApi, IntentClassifier};

pub use authentication::authentication_workflow;
pub use policy_management::{policy_management_terminate_workflow, policy_management_workflow};
pub use sales::sales_workflow;

/// Shared dependencies for assembling workflow definitions.
#[derive(Clone)]
pub struct WorkflowToolkit {
    pub collector: Arc<HybridCollector>,
    pub intent: Arc<dyn IntentClassifier>,
    pub api: Arc<dyn InsuranceApi>,
    /// Claims above this count fail underwriting.
    pub max_claim_count: u32,
}

impl WorkflowToolkit {
    /// Creates the toolkit.
    pub fn new(
        collector: Arc<HybridCollector>,
        intent: Arc<dyn IntentClassifier>,
        api: Arc<dyn InsuranceApi>,
        max_claim_count: u32,
    ) -> Self {
        Self {
            collector,
            intent,
            api,
            max_claim_count,
        }
    }
}
