// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the workflow runtime.

use pipulate_storage::{BackupError, ConversationError, StorageError};
use thiserror::Error;

/// The error kinds the runtime raises or reports. The runtime never
/// propagates these through the HTTP response - every handler converts the
/// relevant variant into a renderable fragment instead.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("validation failed: {0}")]
    ValidationError(String),
    #[error("pipeline key {key} already belongs to workflow {existing_app}, not {requested_app}")]
    PipelineConflict {
        key: String,
        existing_app: String,
        requested_app: String,
    },
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("backup failure: {0}")]
    BackupFailure(#[from] BackupError),
    #[error("restore failure: {0}")]
    RestoreFailure(String),
    #[error("external tool failure: {0}")]
    ExternalToolFailure(#[from] anyhow::Error),
    #[error("pipeline not found: {0}")]
    PipelineNotFound(String),
    #[error("step not found: {0}")]
    StepNotFound(String),
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),
}

impl From<ConversationError> for RuntimeError {
    fn from(e: ConversationError) -> Self {
        RuntimeError::StorageUnavailable(StorageError::Unavailable(e.to_string()))
    }
}
