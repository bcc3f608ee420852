// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Workflow` trait and the registry `pipulate-server` populates at
//! startup.
//!
//! Replaces dynamic plugin discovery (scanning a directory for modules with
//! known attributes) with an explicit trait every workflow implements
//! directly. Workflow implementations stay thin - steps, labels, an
//! optional transform - because all control flow lives in
//! [`crate::runtime::WorkflowRuntime`], shared by composition, not
//! inheritance.

use crate::step_registry::StepRegistry;
use std::collections::HashMap;
use std::sync::Arc;

pub trait Workflow: Send + Sync {
    fn app_name(&self) -> &str;
    fn display_name(&self) -> &str;
    fn endpoint_message(&self) -> &str;
    fn training_prompt(&self) -> &str;
    fn steps(&self) -> &StepRegistry;

    /// Whether reverting to a step should prefill its previous value by
    /// default. Individual `StepDescriptor`s may still override this.
    fn preserve_refill(&self) -> bool {
        true
    }

    /// Seed `step_id`'s suggested input from the previous step's captured
    /// value. Delegates to the matching `StepDescriptor`'s transform, if
    /// any.
    fn transform(&self, step_id: &str, prev_value: &str) -> Option<String> {
        self.steps()
            .get(step_id)
            .and_then(|s| s.transform.as_ref())
            .map(|f| f(prev_value))
    }
}

/// Registry of every known workflow, keyed by `app_name`.
#[derive(Default)]
pub struct WorkflowRegistry {
    workflows: HashMap<String, Arc<dyn Workflow>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, workflow: Arc<dyn Workflow>) {
        self.workflows.insert(workflow.app_name().to_string(), workflow);
    }

    pub fn get(&self, app_name: &str) -> Option<Arc<dyn Workflow>> {
        self.workflows.get(app_name).cloned()
    }

    pub fn app_names(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hello_workflow::HelloWorkflow;

    #[test]
    fn registry_looks_up_registered_workflow_by_app_name() {
        let mut registry = WorkflowRegistry::new();
        registry.register(Arc::new(HelloWorkflow::new()));
        assert!(registry.get("hello").is_some());
        assert!(registry.get("missing").is_none());
    }
}
