// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hello`: the two-step demo workflow used to exercise the runtime
//! end-to-end (S1-S3 scenarios).

use crate::step_registry::StepRegistry;
use crate::workflow::Workflow;
use pipulate_core::StepDescriptor;

pub struct HelloWorkflow {
    steps: StepRegistry,
}

impl HelloWorkflow {
    pub fn new() -> Self {
        let steps = StepRegistry::builder()
            .step(StepDescriptor::new("step_01", "name", "Your Name"))
            .step(
                StepDescriptor::new("step_02", "greeting", "Greeting")
                    .refill(true)
                    .with_transform(|prev| format!("Hello {prev}")),
            )
            .finalize();
        Self { steps }
    }
}

impl Default for HelloWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow for HelloWorkflow {
    fn app_name(&self) -> &str {
        "hello"
    }

    fn display_name(&self) -> &str {
        "Hello Workflow"
    }

    fn endpoint_message(&self) -> &str {
        "Welcome to the Hello workflow - a two-step introduction to Pipulate."
    }

    fn training_prompt(&self) -> &str {
        "This workflow collects a name and produces a greeting."
    }

    fn steps(&self) -> &StepRegistry {
        &self.steps
    }
}
