// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic backup sweep: runs `BackupManager`/`ConversationBackupManager`
//! on an interval instead of after every write, the same trade-off the
//! teacher's `auto_backup_all` sweep makes for its own tables.

use std::path::PathBuf;
use std::time::Duration;

use pipulate_storage::{BackupManager, ConversationBackupManager};
use tokio::time::interval;
use tracing::{info, warn};

const RETENTION_DAYS: i64 = 30;

pub fn spawn(
    backup_manager: BackupManager,
    conversation_backup: ConversationBackupManager,
    main_db: PathBuf,
    keychain_db: PathBuf,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            let results = backup_manager.auto_backup_all(&main_db, &keychain_db);
            for (table, ok) in results {
                if !ok {
                    warn!(table, "table backup skipped or failed");
                }
            }
            match conversation_backup.create_backup("periodic") {
                Ok(true) => info!("rotated conversation backup"),
                Ok(false) => {}
                Err(err) => warn!(%err, "conversation backup failed"),
            }
            backup_manager.cleanup_old_backups(RETENTION_DAYS);
        }
    })
}
