// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workflow state machine: phase resolution, the chain-reaction
//! protocol, revert, finalize/unfinalize, and submit validation.
//!
//! `render_step`/`submit_step`/`revert`/`finalize`/`init` never return an
//! HTML string. They return a [`StepRender`] - a fragment value plus an
//! optional [`Trigger`] - so the chain-reaction invariant (property 1, the
//! spec's testable properties) is checkable without string-matching
//! markup. The Host Adapter is the only thing that turns a `StepRender`
//! into `hx-get`/`hx-trigger` attributes.

use crate::message_queue::MessageQueue;
use crate::pipeline_store::PipelineStore;
use crate::workflow::Workflow;
use crate::RuntimeError;
use pipulate_core::{MessageRole, PipelineState, StepId};
use std::collections::HashMap;
use std::sync::Arc;

/// Rendering mode of a step at a moment in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Locked,
    Completed,
    Input,
}

/// How a trigger should fire. Only `Load` exists today (auto-fire on
/// insertion); kept as an enum so the Host Adapter's match is exhaustive
/// against future trigger modes rather than a bare `bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    Load,
}

/// A first-class "load the next step" instruction. Present on every
/// Completed/Locked render, absent on every Input render - the mechanical
/// encoding of the chain-reaction invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub target_step: StepId,
    pub mode: TriggerMode,
}

/// A render result a workflow step (or the finalize/revert/init endpoints)
/// produce. Never HTML - the Host Adapter composes markup from this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Input phase: an editable form with an optional suggested value.
    Form {
        step_id: StepId,
        label: String,
        suggested_value: Option<String>,
    },
    /// Completed phase: the captured value plus a revert control.
    Completed {
        step_id: StepId,
        value: serde_json::Value,
        label: String,
    },
    /// Locked phase: read-only rendering of the captured value.
    Locked {
        step_id: StepId,
        value: serde_json::Value,
        label: String,
    },
    /// Empty placeholder - rendered for steps not yet reached.
    Placeholder { step_id: StepId },
    /// Validation or conflict failure. Never advances the chain.
    Error { message: String },
    /// The finalize control is available (all non-finalize steps done).
    FinalizeControl,
    /// The unfinalize ("unlock") control, shown once finalized.
    UnlockControl,
    /// Full container rebuild from step 1 - used by init/revert/finalize.
    FullRebuild { pipeline_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRender {
    pub fragment: Fragment,
    pub trigger: Option<Trigger>,
}

pub struct WorkflowRuntime {
    pipelines: PipelineStore,
    messages: Option<Arc<MessageQueue>>,
}

impl WorkflowRuntime {
    pub fn new(pipelines: PipelineStore, messages: Option<Arc<MessageQueue>>) -> Self {
        Self { pipelines, messages }
    }

    /// Existing pipeline keys for `app_name`, for the landing page's resume
    /// datalist.
    pub fn list_pipeline_keys(&self, app_name: &str) -> Vec<String> {
        self.pipelines.list_keys(app_name)
    }

    fn narrate(&self, content: impl Into<String>, verbatim: bool, role: MessageRole) {
        if let Some(queue) = &self.messages {
            queue.add(content, verbatim, role);
        }
    }

    fn phase_for(state: &PipelineState, step_id: &str, done_field: &str) -> Phase {
        let done = state.step_done(step_id, done_field);
        if state.is_finalized() && done {
            Phase::Locked
        } else if done && state.revert_target.as_deref() != Some(step_id) {
            Phase::Completed
        } else {
            Phase::Input
        }
    }

    fn trigger_for_next(workflow: &dyn Workflow, step_id: &str) -> Option<Trigger> {
        workflow.steps().next_after(step_id).map(|next| Trigger {
            target_step: next.id.clone(),
            mode: TriggerMode::Load,
        })
    }

    /// GET `/<app>/<step_id>`.
    pub fn render_step(
        &self,
        workflow: &dyn Workflow,
        pipeline_id: &str,
        step_id: &str,
    ) -> Result<StepRender, RuntimeError> {
        let descriptor = workflow
            .steps()
            .get(step_id)
            .ok_or_else(|| RuntimeError::StepNotFound(step_id.to_string()))?
            .clone();

        let state = self
            .pipelines
            .read(pipeline_id)
            .ok_or_else(|| RuntimeError::PipelineNotFound(pipeline_id.to_string()))?;

        let phase = Self::phase_for(&state, step_id, &descriptor.done);
        let value = state
            .steps
            .get(step_id)
            .and_then(|s| s.get(&descriptor.done))
            .cloned();

        match phase {
            Phase::Locked => Ok(StepRender {
                fragment: Fragment::Locked {
                    step_id: descriptor.id.clone(),
                    value: value.unwrap_or(serde_json::Value::Null),
                    label: descriptor.show.clone(),
                },
                trigger: Self::trigger_for_next(workflow, step_id),
            }),
            Phase::Completed => Ok(StepRender {
                fragment: Fragment::Completed {
                    step_id: descriptor.id.clone(),
                    value: value.unwrap_or(serde_json::Value::Null),
                    label: descriptor.show.clone(),
                },
                trigger: Self::trigger_for_next(workflow, step_id),
            }),
            Phase::Input => {
                let suggested_value = if descriptor.refill {
                    value.and_then(|v| v.as_str().map(str::to_string))
                } else {
                    None
                };
                let suggested_value = suggested_value.or_else(|| {
                    let current_pos = workflow.steps().position(step_id)?;
                    let prev = workflow.steps().steps()[..current_pos].last()?;
                    let prev_value = state.steps.get(prev.id.as_str())?.get(&prev.done)?.as_str()?;
                    workflow.transform(step_id, prev_value)
                });
                Ok(StepRender {
                    fragment: Fragment::Form {
                        step_id: descriptor.id.clone(),
                        label: descriptor.show.clone(),
                        suggested_value,
                    },
                    trigger: None,
                })
            }
        }
    }

    /// Validate step input: reject empty or whitespace-only values. Workflows
    /// may layer field-specific rules on top but must preserve this shape.
    pub fn validate_step_input(value: &str, label: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err(format!("{label} cannot be empty"));
        }
        Ok(())
    }

    /// POST `/<app>/<step_id>_submit`.
    pub fn submit_step(
        &self,
        workflow: &dyn Workflow,
        pipeline_id: &str,
        step_id: &str,
        form: &HashMap<String, String>,
    ) -> Result<StepRender, RuntimeError> {
        let descriptor = workflow
            .steps()
            .get(step_id)
            .ok_or_else(|| RuntimeError::StepNotFound(step_id.to_string()))?
            .clone();

        let state = self
            .pipelines
            .read(pipeline_id)
            .ok_or_else(|| RuntimeError::PipelineNotFound(pipeline_id.to_string()))?;

        if state.is_finalized() {
            return self.render_step(workflow, pipeline_id, step_id);
        }

        let raw_value = form.get(&descriptor.done).cloned().unwrap_or_default();
        if let Err(message) = Self::validate_step_input(&raw_value, &descriptor.show) {
            return Ok(StepRender {
                fragment: Fragment::Error { message },
                trigger: None,
            });
        }

        let state = self.pipelines.set_step_data(
            pipeline_id,
            step_id,
            &descriptor.done,
            serde_json::Value::String(raw_value.clone()),
        )?;

        self.narrate(
            format!("{}: captured {} = {raw_value}", workflow.app_name(), descriptor.show),
            true,
            MessageRole::System,
        );

        if workflow.steps().is_last_before_finalize(step_id) {
            self.narrate(
                format!("{} is ready to finalize", workflow.app_name()),
                true,
                MessageRole::System,
            );
        }

        Ok(StepRender {
            fragment: Fragment::Completed {
                step_id: descriptor.id.clone(),
                value: serde_json::Value::String(raw_value),
                label: descriptor.show.clone(),
            },
            trigger: Self::trigger_for_next(workflow, step_id),
        })
    }

    /// POST `/<app>/revert` with `step_id` in the form.
    pub fn revert(
        &self,
        workflow: &dyn Workflow,
        pipeline_id: &str,
        step_id: &str,
    ) -> Result<StepRender, RuntimeError> {
        let mut state = self
            .pipelines
            .clear_steps_from(pipeline_id, step_id, workflow.steps())?;
        state.revert_target = Some(step_id.to_string());
        self.pipelines.write(&mut state)?;

        self.narrate(
            format!("{}: reverted to {step_id}", workflow.app_name()),
            true,
            MessageRole::System,
        );

        Ok(self.full_rebuild(workflow, pipeline_id))
    }

    /// GET `/<app>/finalize`.
    pub fn finalize_status(
        &self,
        workflow: &dyn Workflow,
        pipeline_id: &str,
    ) -> Result<StepRender, RuntimeError> {
        let state = self
            .pipelines
            .read(pipeline_id)
            .ok_or_else(|| RuntimeError::PipelineNotFound(pipeline_id.to_string()))?;

        if state.is_finalized() {
            return Ok(StepRender {
                fragment: Fragment::UnlockControl,
                trigger: None,
            });
        }

        let all_done = workflow
            .steps()
            .non_finalize_steps()
            .all(|s| state.step_done(s.id.as_str(), &s.done));

        if all_done {
            Ok(StepRender {
                fragment: Fragment::FinalizeControl,
                trigger: None,
            })
        } else {
            Ok(StepRender {
                fragment: Fragment::Placeholder {
                    step_id: StepId::new("finalize"),
                },
                trigger: None,
            })
        }
    }

    /// POST `/<app>/finalize`.
    pub fn finalize(
        &self,
        workflow: &dyn Workflow,
        pipeline_id: &str,
    ) -> Result<StepRender, RuntimeError> {
        let mut state = self
            .pipelines
            .read(pipeline_id)
            .ok_or_else(|| RuntimeError::PipelineNotFound(pipeline_id.to_string()))?;
        state.finalize = Some(pipulate_core::FinalizeInfo { finalized: true });
        self.pipelines.write(&mut state)?;

        self.narrate(
            format!("{} finalized", workflow.app_name()),
            true,
            MessageRole::System,
        );

        Ok(self.full_rebuild(workflow, pipeline_id))
    }

    /// POST `/<app>/unfinalize`.
    pub fn unfinalize(
        &self,
        workflow: &dyn Workflow,
        pipeline_id: &str,
    ) -> Result<StepRender, RuntimeError> {
        let mut state = self
            .pipelines
            .read(pipeline_id)
            .ok_or_else(|| RuntimeError::PipelineNotFound(pipeline_id.to_string()))?;
        state.finalize = None;
        self.pipelines.write(&mut state)?;

        self.narrate(
            format!("{} unfinalized", workflow.app_name()),
            true,
            MessageRole::System,
        );

        Ok(self.full_rebuild(workflow, pipeline_id))
    }

    /// POST `/<app>/init`. `submitted_key` may be empty (caller should
    /// treat that as a host-level page refresh before calling this), a bare
    /// user part, or an already-prefixed full key.
    pub fn init(
        &self,
        workflow: &dyn Workflow,
        submitted_key: &str,
    ) -> Result<StepRender, RuntimeError> {
        let (_, prefix, _) = self.pipelines.generate_pipeline_key(workflow.app_name());
        let pipeline_id = if submitted_key.starts_with(&prefix) {
            submitted_key.to_string()
        } else {
            format!("{prefix}{submitted_key}")
        };

        let (state, created) = self
            .pipelines
            .initialize_if_missing(&pipeline_id, workflow.app_name())?;

        if created {
            self.narrate(workflow.endpoint_message(), true, MessageRole::System);
        } else if state.is_finalized() {
            self.narrate(
                format!("{pipeline_id} resumed - locked and finalized"),
                true,
                MessageRole::System,
            );
        } else {
            self.narrate(format!("{pipeline_id} resumed"), true, MessageRole::System);
        }

        Ok(self.full_rebuild(workflow, &pipeline_id))
    }

    fn full_rebuild(&self, workflow: &dyn Workflow, pipeline_id: &str) -> StepRender {
        let first = workflow.steps().first();
        StepRender {
            fragment: Fragment::FullRebuild {
                pipeline_id: pipeline_id.to_string(),
            },
            trigger: first.map(|step| Trigger {
                target_step: step.id.clone(),
                mode: TriggerMode::Load,
            }),
        }
    }
}
