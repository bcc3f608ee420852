// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where the server's durable files live on disk.
//!
//! `PIPULATE_STATE_DIR` overrides everything; otherwise state lives under
//! `<home>/.pipulate`, mirroring the shape `PipulateConfig::backup_root`'s
//! own default (`<home>/.pipulate/backups`) already assumes.

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

pub fn conversation_db_path() -> PathBuf {
    state_dir().join("conversation.db")
}

pub fn keyed_store_dir() -> PathBuf {
    state_dir().join("store")
}

pub fn config_file_path() -> PathBuf {
    state_dir().join("pipulate.toml")
}
