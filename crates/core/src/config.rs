// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PipulateConfig`: the four knobs §6 enumerates. TOML file plus
//! environment overrides, loaded once at process startup - no hot reload,
//! no remote config service. Kept dependency-light on purpose: this is a
//! handful of scalars, not a generalized config layer.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Environment variable names, checked after the TOML file and before the
/// built-in defaults below.
const ENV_BACKUP_ROOT: &str = "PIPULATE_BACKUP_ROOT";
const ENV_MAX_MESSAGES: &str = "PIPULATE_MAX_MESSAGES";
const ENV_SESSION_ID: &str = "PIPULATE_SESSION_ID";
const ENV_PRESERVE_REFILL: &str = "PIPULATE_PRESERVE_REFILL";

fn default_backup_root() -> PathBuf {
    dirs_home().join(".pipulate").join("backups")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

fn default_max_messages() -> usize {
    10_000
}

fn default_session_id() -> String {
    "default".to_string()
}

fn default_preserve_refill() -> bool {
    true
}

/// The four environment/configuration knobs the core honours (§6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipulateConfig {
    /// Override the backup directory root (default `<home>/.pipulate/backups`).
    pub backup_root: PathBuf,
    /// Conversation in-memory window size.
    pub max_messages: usize,
    /// Default session label for appended messages.
    pub session_id: String,
    /// Default value for the workflow-global refill-on-revert policy.
    pub preserve_refill: bool,
}

impl Default for PipulateConfig {
    fn default() -> Self {
        Self {
            backup_root: default_backup_root(),
            max_messages: default_max_messages(),
            session_id: default_session_id(),
            preserve_refill: default_preserve_refill(),
        }
    }
}

impl PipulateConfig {
    /// Load from `path` if it exists (TOML), falling back to defaults for
    /// any field the file omits, then apply environment overrides on top.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Build straight from the process environment and defaults, skipping
    /// any file. Used by the CLI and by tests that don't want a fixture file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var(ENV_BACKUP_ROOT) {
            self.backup_root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var(ENV_MAX_MESSAGES) {
            if let Ok(n) = v.parse() {
                self.max_messages = n;
            }
        }
        if let Ok(v) = std::env::var(ENV_SESSION_ID) {
            self.session_id = v;
        }
        if let Ok(v) = std::env::var(ENV_PRESERVE_REFILL) {
            if let Ok(b) = v.parse() {
                self.preserve_refill = b;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variable mutation in tests must be serialized process-wide.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_when_file_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = PipulateConfig::load(Path::new("/nonexistent/pipulate.toml")).expect("load");
        assert_eq!(config.max_messages, 10_000);
        assert!(config.preserve_refill);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pipulate.toml");
        std::fs::write(&path, "max_messages = 500\nsession_id = \"test-session\"\n").expect("write");
        let config = PipulateConfig::load(&path).expect("load");
        assert_eq!(config.max_messages, 500);
        assert_eq!(config.session_id, "test-session");
        assert!(config.preserve_refill, "omitted fields keep their default");
    }

    #[test]
    fn env_var_overrides_file_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(ENV_MAX_MESSAGES, "42");
        let config = PipulateConfig::load(Path::new("/nonexistent/pipulate.toml")).expect("load");
        std::env::remove_var(ENV_MAX_MESSAGES);
        assert_eq!(config.max_messages, 42);
    }
}
