// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Pipeline / Step / Conversation / Backup data model.

use crate::define_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

define_id! {
    /// Composite key `<profile>-<plugin>-<user_part>` identifying one running
    /// pipeline instance. Unique per workflow.
    pub struct PipelineId;
}

define_id! {
    /// Name of a workflow (the `<app>` segment of its routes).
    pub struct WorkflowId;
}

define_id! {
    /// Stable id of a step within a workflow, e.g. `step_01` or `finalize`.
    pub struct StepId;
}

/// A pure transform that seeds a step's suggested input from the previous
/// step's captured value. Side-effect free by construction: it is a plain
/// closure, never given access to storage or the runtime.
pub type Transform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Declarative description of one step. Workflows build an ordered list of
/// these; the runtime never mutates a descriptor, only the state it indexes.
#[derive(Clone)]
pub struct StepDescriptor {
    pub id: StepId,
    /// Field inside `state[id]` whose presence marks the step done.
    pub done: String,
    /// Human-facing label, e.g. "Your Name".
    pub show: String,
    /// Whether reverting to this step should prefill its previous value.
    pub refill: bool,
    pub transform: Option<Transform>,
}

impl std::fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("id", &self.id)
            .field("done", &self.done)
            .field("show", &self.show)
            .field("refill", &self.refill)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl StepDescriptor {
    pub fn new(id: impl Into<StepId>, done: impl Into<String>, show: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            done: done.into(),
            show: show.into(),
            refill: false,
            transform: None,
        }
    }

    pub fn refill(mut self, refill: bool) -> Self {
        self.refill = refill;
        self
    }

    pub fn with_transform(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(f));
        self
    }

    pub fn is_finalize(&self) -> bool {
        self.id.as_str() == "finalize"
    }
}

/// Per-step captured data: at minimum the `done` field, optionally more.
pub type StepState = serde_json::Map<String, serde_json::Value>;

/// `state.finalize`, present once the pipeline has been locked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinalizeInfo {
    pub finalized: bool,
}

/// The full persisted state of one pipeline instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub pipeline_id: String,
    pub app_name: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub steps: BTreeMap<String, StepState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalize: Option<FinalizeInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_revert_target")]
    pub revert_target: Option<String>,
}

impl PipelineState {
    pub fn new(pipeline_id: impl Into<String>, app_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            app_name: app_name.into(),
            created: now,
            updated: now,
            steps: BTreeMap::new(),
            finalize: None,
            revert_target: None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalize.as_ref().is_some_and(|f| f.finalized)
    }

    pub fn step_done(&self, step_id: &str, done_field: &str) -> bool {
        self.steps
            .get(step_id)
            .and_then(|s| s.get(done_field))
            .is_some()
    }
}

/// One message in the append-only conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationMessage {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub role: MessageRole,
    pub content: String,
    pub message_hash: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "system" => Ok(MessageRole::System),
            other => Err(format!("unknown message role: {other}")),
        }
    }
}

/// Which generation of the durable backup rotation, or which periodic tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupTier {
    Son,
    Father,
    Grandfather,
    Daily,
    Weekly,
    Monthly,
}

impl BackupTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupTier::Son => "son",
            BackupTier::Father => "father",
            BackupTier::Grandfather => "grandfather",
            BackupTier::Daily => "daily",
            BackupTier::Weekly => "weekly",
            BackupTier::Monthly => "monthly",
        }
    }
}

/// A durable, small fact Chip O'Theseus chose to remember across restarts.
/// Distinct from conversation history: explicit key/value facts, not a
/// transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiKeychainEntry {
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_state_step_done_reads_the_configured_field() {
        let mut state = PipelineState::new("default-hello-01", "hello", Utc::now());
        let mut step = StepState::new();
        step.insert("name".into(), "Ada".into());
        state.steps.insert("step_01".into(), step);
        assert!(state.step_done("step_01", "name"));
        assert!(!state.step_done("step_01", "greeting"));
        assert!(!state.step_done("step_02", "greeting"));
    }

    #[test]
    fn finalized_flag_requires_the_nested_field() {
        let mut state = PipelineState::new("default-hello-01", "hello", Utc::now());
        assert!(!state.is_finalized());
        state.finalize = Some(FinalizeInfo { finalized: true });
        assert!(state.is_finalized());
    }
}
