// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative step descriptors per workflow.
//!
//! A workflow author builds one of these with the builder, ending in
//! `.finalize()`. The last entry is always the synthetic `finalize` step;
//! the runtime never has to special-case "is this the last step" by string
//! comparison because `StepRegistry` tracks it directly.

use pipulate_core::{StepDescriptor, StepId};
use std::collections::HashMap;

/// Ordered, indexed collection of a workflow's step descriptors.
pub struct StepRegistry {
    steps: Vec<StepDescriptor>,
    index: HashMap<String, usize>,
}

impl StepRegistry {
    pub fn builder() -> StepRegistryBuilder {
        StepRegistryBuilder { steps: Vec::new() }
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn get(&self, step_id: &str) -> Option<&StepDescriptor> {
        self.index.get(step_id).map(|&i| &self.steps[i])
    }

    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.index.get(step_id).copied()
    }

    /// The step immediately after `step_id`, or `None` if it's the last one.
    pub fn next_after(&self, step_id: &str) -> Option<&StepDescriptor> {
        let pos = self.position(step_id)?;
        self.steps.get(pos + 1)
    }

    /// All non-finalize step ids, in order.
    pub fn non_finalize_steps(&self) -> impl Iterator<Item = &StepDescriptor> {
        self.steps.iter().filter(|s| !s.is_finalize())
    }

    /// Whether `step_id` is the last non-finalize step (the one whose
    /// successful submit should additionally narrate "ready to finalize").
    pub fn is_last_before_finalize(&self, step_id: &str) -> bool {
        let Some(pos) = self.position(step_id) else {
            return false;
        };
        self.steps
            .get(pos + 1)
            .is_some_and(|next| next.is_finalize())
    }

    pub fn first(&self) -> Option<&StepDescriptor> {
        self.steps.first()
    }
}

pub struct StepRegistryBuilder {
    steps: Vec<StepDescriptor>,
}

impl StepRegistryBuilder {
    pub fn step(mut self, descriptor: StepDescriptor) -> Self {
        self.steps.push(descriptor);
        self
    }

    /// Append the synthetic terminal step and freeze the registry.
    pub fn finalize(mut self) -> StepRegistry {
        self.steps.push(StepDescriptor::new(
            StepId::new("finalize"),
            "finalized",
            "Finalize",
        ));
        let index = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str().to_string(), i))
            .collect();
        StepRegistry {
            steps: self.steps,
            index,
        }
    }
}
