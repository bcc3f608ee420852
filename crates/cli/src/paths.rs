// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mirrors `pipulate-server`'s state-directory resolution so the CLI and
//! the server agree on where the keyed store and pid file live without the
//! CLI depending on the (axum-carrying) server crate.

use std::path::PathBuf;

const ENV_STATE_DIR: &str = "PIPULATE_STATE_DIR";

pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));
    home.join(".pipulate")
}

pub fn pid_file_path() -> PathBuf {
    state_dir().join("pipulate-server.pid")
}

pub fn keyed_store_dir() -> PathBuf {
    state_dir().join("store")
}
