// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("no running server found (pid file {0} missing or stale)")]
    ServerNotRunning(std::path::PathBuf),
    #[error("failed to signal server process {pid}: {source}")]
    SignalFailed { pid: u32, source: std::io::Error },
    #[error("storage error: {0}")]
    Storage(#[from] pipulate_storage::StorageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
