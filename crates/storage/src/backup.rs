// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable backups that survive deleting the whole working directory.
//!
//! Two cooperating pieces, grounded on the two backup schemes the source
//! system actually ran side by side:
//!
//! - [`BackupManager`]: daily-windowed, per-table backups for the small
//!   tables (`profile`, `tasks`, the AI keychain) with "newer `updated_at`
//!   wins" merge semantics.
//! - [`ConversationBackupManager`]: a three-generation son/father/grandfather
//!   rotation specifically for the conversation database, since losing the
//!   last N turns of a conversation is a worse failure mode than losing a
//!   day's worth of profile edits.

use chrono::{DateTime, Local, NaiveDate, Utc};
use pipulate_core::BackupTier;
use rusqlite::Connection;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("no {tier} backup exists")]
    NoSuchBackup { tier: String },
    #[error("backup is missing required schema: {0}")]
    MissingSchema(String),
}

/// Per-table merge configuration: which column is the primary key and which
/// carries the "newer wins" timestamp.
#[derive(Debug, Clone)]
pub struct TableBackupConfig {
    pub primary_key: String,
    pub timestamp_field: String,
}

impl Default for TableBackupConfig {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            timestamp_field: "updated_at".to_string(),
        }
    }
}

/// Daily-windowed per-table backup manager with newer-wins merge.
pub struct BackupManager {
    backup_root: PathBuf,
    table_configs: HashMap<String, TableBackupConfig>,
}

impl BackupManager {
    pub fn new(backup_root: PathBuf) -> Result<Self, BackupError> {
        fs::create_dir_all(&backup_root)?;
        let mut table_configs = HashMap::new();
        table_configs.insert("profile".to_string(), TableBackupConfig::default());
        table_configs.insert("tasks".to_string(), TableBackupConfig::default());
        table_configs.insert("ai_keychain".to_string(), TableBackupConfig::default());
        Ok(Self {
            backup_root,
            table_configs,
        })
    }

    pub fn with_table_config(mut self, table: &str, config: TableBackupConfig) -> Self {
        self.table_configs.insert(table.to_string(), config);
        self
    }

    fn backup_filename(&self, table: &str, date: NaiveDate) -> PathBuf {
        self.backup_root.join(format!("{table}_{date}.db"))
    }

    fn config_for(&self, table: &str) -> TableBackupConfig {
        self.table_configs.get(table).cloned().unwrap_or_default()
    }

    /// Ensure `updated_at`/`deleted_at` soft-delete columns exist on `table`.
    pub fn ensure_soft_delete_schema(db_path: &Path, table: &str) -> Result<(), BackupError> {
        let conn = Connection::open(db_path)?;
        let mut columns = Vec::new();
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(1)?;
            columns.push(name);
        }

        if !columns.iter().any(|c| c == "updated_at") {
            conn.execute(
                &format!("ALTER TABLE {table} ADD COLUMN updated_at TEXT DEFAULT CURRENT_TIMESTAMP"),
                [],
            )?;
            info!(table, "added updated_at column for soft-delete tracking");
        }
        if !columns.iter().any(|c| c == "deleted_at") {
            conn.execute(
                &format!("ALTER TABLE {table} ADD COLUMN deleted_at TEXT DEFAULT NULL"),
                [],
            )?;
            info!(table, "added deleted_at column for soft-delete tracking");
        }
        Ok(())
    }

    /// Back up `table` from `source_db_path` into today's backup file.
    /// Never fatal to the caller - failures are reported, not propagated.
    pub fn backup_table(&self, source_db_path: &Path, table: &str) -> bool {
        match self.backup_table_inner(source_db_path, table) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(table, error = %e, "backup failed");
                false
            }
        }
    }

    fn backup_table_inner(&self, source_db_path: &Path, table: &str) -> Result<bool, BackupError> {
        if !source_db_path.exists() {
            warn!(path = %source_db_path.display(), "source database does not exist, skipping backup");
            return Ok(false);
        }

        Self::ensure_soft_delete_schema(source_db_path, table)?;

        let backup_file = self.backup_filename(table, Local::now().date_naive());
        if !backup_file.exists() {
            fs::copy(source_db_path, &backup_file)?;
            info!(table, backup = %backup_file.display(), "created initial backup");
            return Ok(true);
        }

        self.merge_table_data(source_db_path, &backup_file, table)
    }

    /// Merge `table`'s rows from `source_db` into `backup_db`: insert rows
    /// absent from the backup, overwrite a backup row only when the source
    /// row's timestamp field is strictly newer.
    fn merge_table_data(
        &self,
        source_db: &Path,
        backup_db: &Path,
        table: &str,
    ) -> Result<bool, BackupError> {
        let config = self.config_for(table);
        let source = Connection::open(source_db)?;
        let backup = Connection::open(backup_db)?;

        let mut col_stmt = source.prepare(&format!("PRAGMA table_info({table})"))?;
        let columns: Vec<String> = col_stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;
        drop(col_stmt);

        let select_cols = columns.join(", ");
        let mut row_stmt = source.prepare(&format!("SELECT {select_cols} FROM {table}"))?;
        let pk_idx = columns
            .iter()
            .position(|c| *c == config.primary_key)
            .unwrap_or(0);
        let ts_idx = columns.iter().position(|c| *c == config.timestamp_field);

        let mut rows = row_stmt.query([])?;
        while let Some(row) = rows.next()? {
            let values: Vec<rusqlite::types::Value> = (0..columns.len())
                .map(|i| row.get_unwrap::<_, rusqlite::types::Value>(i))
                .collect();
            let pk_value = &values[pk_idx];

            let existing_ts: Option<String> = backup
                .query_row(
                    &format!(
                        "SELECT {} FROM {table} WHERE {} = ?1",
                        config.timestamp_field, config.primary_key
                    ),
                    [pk_value],
                    |r| r.get(0),
                )
                .ok();

            match existing_ts {
                None => {
                    let placeholders = (1..=columns.len())
                        .map(|i| format!("?{i}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    backup.execute(
                        &format!("INSERT INTO {table} ({select_cols}) VALUES ({placeholders})"),
                        rusqlite::params_from_iter(values.iter()),
                    )?;
                }
                Some(backup_ts) => {
                    let source_ts = ts_idx
                        .and_then(|i| match &values[i] {
                            rusqlite::types::Value::Text(s) => Some(s.clone()),
                            _ => None,
                        })
                        .unwrap_or_default();
                    if source_ts > backup_ts {
                        let set_clause = columns
                            .iter()
                            .enumerate()
                            .filter(|(_, c)| **c != config.primary_key)
                            .map(|(i, c)| format!("{c} = ?{}", i + 1))
                            .collect::<Vec<_>>()
                            .join(", ");
                        let mut params: Vec<&rusqlite::types::Value> = values
                            .iter()
                            .enumerate()
                            .filter(|(i, _)| *i != pk_idx)
                            .map(|(_, v)| v)
                            .collect();
                        params.push(pk_value);
                        backup.execute(
                            &format!(
                                "UPDATE {table} SET {set_clause} WHERE {} = ?{}",
                                config.primary_key,
                                columns.len()
                            ),
                            rusqlite::params_from_iter(params),
                        )?;
                    }
                }
            }
        }

        Ok(true)
    }

    /// Restore `table` into `target_db_path` from the most recent backup.
    /// Backup data is treated as source of truth: the same newer-wins merge
    /// runs in the opposite direction.
    pub fn restore_table(&self, target_db_path: &Path, table: &str) -> bool {
        let backup_file = self.backup_filename(table, Local::now().date_naive());
        if !backup_file.exists() {
            warn!(table, "no backup found to restore from");
            return false;
        }
        if Self::ensure_soft_delete_schema(target_db_path, table).is_err() {
            return false;
        }
        self.merge_table_data(&backup_file, target_db_path, table)
            .unwrap_or(false)
    }

    /// Back up every configured table plus the AI keychain. Called
    /// periodically and at startup; individual failures never abort the
    /// batch.
    pub fn auto_backup_all(&self, main_db: &Path, keychain_db: &Path) -> HashMap<String, bool> {
        let mut results = HashMap::new();
        for table in ["profile", "tasks"] {
            results.insert(table.to_string(), self.backup_table(main_db, table));
        }
        if keychain_db.exists() {
            results.insert(
                "ai_keychain".to_string(),
                self.backup_table(keychain_db, "ai_keychain"),
            );
        }
        let successful = results.values().filter(|v| **v).count();
        info!(successful, total = results.len(), "auto-backup complete");
        results
    }

    /// Restore every configured table plus the AI keychain. Called on a
    /// fresh install when the working directory is empty.
    pub fn auto_restore_all(&self, main_db: &Path, keychain_db: &Path) -> HashMap<String, bool> {
        let mut results = HashMap::new();
        for table in ["profile", "tasks"] {
            results.insert(table.to_string(), self.restore_table(main_db, table));
        }
        results.insert(
            "ai_keychain".to_string(),
            self.restore_table(keychain_db, "ai_keychain"),
        );
        results
    }

    /// Remove backup files whose embedded date is older than `keep_days`.
    pub fn cleanup_old_backups(&self, keep_days: i64) {
        let cutoff = Utc::now() - chrono::Duration::days(keep_days);
        let Ok(entries) = fs::read_dir(&self.backup_root) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(date_str) = stem.rsplit('_').next() else {
                continue;
            };
            let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
                continue;
            };
            let file_time: DateTime<Utc> = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
            if file_time < cutoff {
                if fs::remove_file(&path).is_ok() {
                    info!(path = %path.display(), "removed backup past retention window");
                }
            }
        }
    }
}

/// Son/father/grandfather rotation for the conversation database.
///
/// - Son: latest backup, made before each risky operation.
/// - Father: previous backup, rotated when a new son is created.
/// - Grandfather: oldest kept backup.
pub struct ConversationBackupManager {
    source_db_path: PathBuf,
    backup_dir: PathBuf,
}

impl ConversationBackupManager {
    pub fn new(source_db_path: PathBuf, backup_dir: PathBuf) -> Result<Self, BackupError> {
        fs::create_dir_all(&backup_dir)?;
        Ok(Self {
            source_db_path,
            backup_dir,
        })
    }

    fn tier_path(&self, tier: BackupTier) -> PathBuf {
        self.backup_dir.join(format!("discussion_{}.db", tier.as_str()))
    }

    /// Rotate grandfather <- father <- son, then copy the current database
    /// in as the new son. Rotation is rename-based: a crash mid-rotation
    /// always leaves at least one prior generation intact.
    pub fn create_backup(&self, reason: &str) -> Result<bool, BackupError> {
        if !self.source_db_path.exists() {
            warn!(path = %self.source_db_path.display(), "conversation database does not exist, skipping backup");
            return Ok(false);
        }

        self.rotate_backups()?;
        fs::copy(&self.source_db_path, self.tier_path(BackupTier::Son))?;
        info!(reason, "conversation backup created");
        Ok(true)
    }

    fn rotate_backups(&self) -> Result<(), BackupError> {
        let father = self.tier_path(BackupTier::Father);
        let grandfather = self.tier_path(BackupTier::Grandfather);
        let son = self.tier_path(BackupTier::Son);

        if father.exists() {
            if grandfather.exists() {
                fs::remove_file(&grandfather)?;
            }
            fs::rename(&father, &grandfather)?;
        }
        if son.exists() {
            fs::rename(&son, &father)?;
        }
        Ok(())
    }

    /// Restore the conversation database from `tier`, taking an emergency
    /// snapshot of the current state first so a bad restore is itself
    /// recoverable.
    pub fn restore_from_backup(&self, tier: BackupTier) -> Result<bool, BackupError> {
        let backup_file = self.tier_path(tier);
        if !backup_file.exists() {
            return Err(BackupError::NoSuchBackup {
                tier: tier.as_str().to_string(),
            });
        }

        if self.source_db_path.exists() {
            let emergency = self
                .backup_dir
                .join(format!("emergency_backup_{}.db", Utc::now().format("%Y%m%d_%H%M%S")));
            fs::copy(&self.source_db_path, &emergency)?;
            info!(path = %emergency.display(), "emergency backup created before restore");
        }

        fs::copy(&backup_file, &self.source_db_path)?;
        info!(tier = tier.as_str(), "conversation restored from backup");
        Ok(true)
    }

    /// Verify a backup is a well-formed SQLite file with the conversation
    /// schema, returning the row count if so.
    pub fn verify_backup_integrity(&self, tier: BackupTier) -> Result<usize, BackupError> {
        let backup_file = self.tier_path(tier);
        if !backup_file.exists() {
            return Err(BackupError::NoSuchBackup {
                tier: tier.as_str().to_string(),
            });
        }

        let conn = Connection::open(&backup_file)?;
        let has_table: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'conversation_messages'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n > 0)?;

        if !has_table {
            return Err(BackupError::MissingSchema("conversation_messages".to_string()));
        }

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM conversation_messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_profile_db(path: &Path) {
        let conn = Connection::open(path).expect("open");
        conn.execute(
            "CREATE TABLE profile (id INTEGER PRIMARY KEY, name TEXT, updated_at TEXT, deleted_at TEXT)",
            [],
        )
        .expect("create");
    }

    #[test]
    fn backup_table_creates_initial_copy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("main.db");
        make_profile_db(&db_path);
        Connection::open(&db_path)
            .expect("open")
            .execute(
                "INSERT INTO profile (id, name, updated_at) VALUES (1, 'Ada', '2026-01-01T00:00:00')",
                [],
            )
            .expect("insert");

        let manager = BackupManager::new(dir.path().join("backups")).expect("manager");
        assert!(manager.backup_table(&db_path, "profile"));
        assert!(manager
            .backup_filename("profile", Local::now().date_naive())
            .exists());
    }

    #[test]
    fn restore_preserves_newer_target_row() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("target.db");
        make_profile_db(&target);
        Connection::open(&target)
            .expect("open")
            .execute(
                "INSERT INTO profile (id, name, updated_at) VALUES (1, 'Newer', '2026-06-01T00:00:00')",
                [],
            )
            .expect("insert");

        let manager = BackupManager::new(dir.path().join("backups")).expect("manager");
        let backup_file = manager.backup_filename("profile", Local::now().date_naive());
        make_profile_db(&backup_file);
        Connection::open(&backup_file)
            .expect("open")
            .execute(
                "INSERT INTO profile (id, name, updated_at) VALUES (1, 'Older', '2026-01-01T00:00:00')",
                [],
            )
            .expect("insert");

        assert!(manager.restore_table(&target, "profile"));
        let name: String = Connection::open(&target)
            .expect("open")
            .query_row("SELECT name FROM profile WHERE id = 1", [], |r| r.get(0))
            .expect("query");
        assert_eq!(name, "Newer");
    }

    #[test]
    fn son_father_grandfather_rotation_keeps_three_generations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("discussion.db");
        fs::write(&source, b"v1").expect("write");
        let manager = ConversationBackupManager::new(source.clone(), dir.path().join("backups")).expect("manager");

        manager.create_backup("first").expect("backup1");
        fs::write(&source, b"v2").expect("write");
        manager.create_backup("second").expect("backup2");
        fs::write(&source, b"v3").expect("write");
        manager.create_backup("third").expect("backup3");

        assert!(manager.tier_path(BackupTier::Son).exists());
        assert!(manager.tier_path(BackupTier::Father).exists());
        assert!(manager.tier_path(BackupTier::Grandfather).exists());
        assert_eq!(
            fs::read(manager.tier_path(BackupTier::Son)).expect("read"),
            b"v3"
        );
    }
}
