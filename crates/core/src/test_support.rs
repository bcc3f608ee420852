// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::domain::{PipelineState, StepDescriptor};
use chrono::Utc;

/// A freshly-initialized pipeline with no steps done.
pub fn fresh_pipeline(pipeline_id: &str, app_name: &str) -> PipelineState {
    PipelineState::new(pipeline_id, app_name, Utc::now())
}

/// The two-step `hello` workflow exercised by the S1-S3 scenario tests:
/// capture a name, then greet it, then finalize.
pub fn hello_steps() -> Vec<StepDescriptor> {
    vec![
        StepDescriptor::new("step_01", "name", "Your Name").refill(true),
        StepDescriptor::new("step_02", "greeting", "Greeting")
            .refill(true)
            .with_transform(|name| format!("Hello {name}")),
        StepDescriptor::new("finalize", "finalized", "Finalize"),
    ]
}
