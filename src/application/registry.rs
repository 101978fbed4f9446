//! The workflow registry.
//!
//! All definitions are built once at construction, one per
//! [`WorkflowId`] variant. Lookup is a total match: a workflow id that
//! exists cannot fail to resolve, which is the point of keying by enum
//! instead of by string.

use crate::domain::workflow::{WorkflowDefinition, WorkflowId};
use crate::workflows::{
    authentication_workflow, policy_management_terminate_workflow, policy_management_workflow,
    sales_workflow, WorkflowToolkit,
};

/// Holds one built definition per workflow.
pub struct WorkflowRegistry {
    sales: WorkflowDefinition,
    authentication: WorkflowDefinition,
    policy_management: WorkflowDefinition,
    policy_management_terminate: WorkflowDefinition,
}

impl WorkflowRegistry {
    /// Builds every workflow from the toolkit.
    pub fn new(toolkit: &WorkflowToolkit) -> Self {
        Self {
            sales: sales_workflow(toolkit),
            authentication: authentication_workflow(toolkit),
            policy_management: policy_management_workflow(toolkit),
            policy_management_terminate: policy_management_terminate_workflow(toolkit),
        }
    }

    /// Resolves a workflow id to its definition.
    pub fn get(&self, id: WorkflowId) -> &WorkflowDefinition {
        match id {
            WorkflowId::SalesWorkflow => &self.sales,
            WorkflowId::AuthenticationWorkflow => &self.authentication,
            WorkflowId::PolicyManagementWorkflow => &self.policy_management,
            WorkflowId::PolicyManagementTerminateWorkflow => &self.policy_management_terminate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockExtractionClient, MockIntentClassifier};
    use crate::adapters::insurance::MockInsuranceApi;
    use crate::domain::collection::{FieldValidators, HybridCollector, ValidationRules};
    use std::sync::Arc;

    #[test]
    fn every_workflow_id_resolves_to_its_definition() {
        let collector = Arc::new(HybridCollector::new(
            Arc::new(MockExtractionClient::new()),
            FieldValidators::new(ValidationRules::default()),
        ));
        let toolkit = WorkflowToolkit::new(
            collector,
            Arc::new(MockIntentClassifier::new()),
            Arc::new(MockInsuranceApi::new()),
            2,
        );
        let registry = WorkflowRegistry::new(&toolkit);

        for id in [
            WorkflowId::SalesWorkflow,
            WorkflowId::AuthenticationWorkflow,
            WorkflowId::PolicyManagementWorkflow,
            WorkflowId::PolicyManagementTerminateWorkflow,
        ] {
            assert_eq!(registry.get(id).id(), id);
        }
    }
}
