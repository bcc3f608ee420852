// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the storage layer.

use crate::{CheckpointError, SnapshotError, WalError};
use thiserror::Error;

/// `set`/`delete` on a `KeyedStore` fail only this way: callers must treat
/// a successful write as must-succeed and this as the sole failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("write-ahead log error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
