// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The Pipulate workflow engine: step registry, pipeline state, the
//! chain-reaction runtime, and ordered narration, built on top of
//! `pipulate-storage`.

mod error;
mod hello_workflow;
mod message_queue;
mod pipeline_store;
mod runtime;
mod step_registry;
mod workflow;

pub use error::RuntimeError;
pub use hello_workflow::HelloWorkflow;
pub use message_queue::{MessageQueue, NarrationBackend, VerbatimNarrationBackend};
pub use pipeline_store::{PipelineIdGen, PipelineStore};
pub use runtime::{Fragment, Phase, StepRender, Trigger, TriggerMode, WorkflowRuntime};
pub use step_registry::{StepRegistry, StepRegistryBuilder};
pub use workflow::{Workflow, WorkflowRegistry};
