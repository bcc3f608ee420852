// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A durable, append-only conversation log backed by SQLite.
//!
//! Messages are deduplicated against a window of recently appended
//! `(role, content)` pairs, kept in an "active" table up to a retention
//! ceiling, and rolled into an "archive" table beyond that so the active
//! table stays small for fast reads while nothing is ever discarded.
//!
//! Listing pages newest-first by `id` (`id` is authoritative, not
//! `timestamp` - clock skew between process restarts otherwise reorders
//! messages that were actually appended in sequence) and re-sorts the page
//! back to chronological order before returning it.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{backup::Backup, params, Connection};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use pipulate_core::{ConversationMessage, MessageRole};

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// How many of the most recently appended messages are checked for an exact
/// content-hash match before inserting, so rapid accidental resubmits don't
/// create duplicate rows.
const DEDUP_WINDOW: usize = 20;

/// Default active-table row count above which the oldest rows are moved
/// into the archive table; overridden by `PipulateConfig::max_messages`.
const DEFAULT_ACTIVE_TABLE_CEILING: usize = 2000;

/// Session concept is carried in the schema for forward compatibility but a
/// single local assistant only ever has one session today.
const DEFAULT_SESSION_ID: &str = "default";

/// The stats contract (§4.3): `db_total` is a fresh `COUNT(*)` against the
/// active table, so `total == db_total` always holds - divergence would mean
/// the in-memory bookkeeping drifted from what's actually on disk.
#[derive(Debug, Clone, Default)]
pub struct ConversationStats {
    pub total: usize,
    pub per_role_counts: HashMap<String, usize>,
    pub total_content_length: usize,
    pub avg_length: f64,
    pub db_total: usize,
    pub architecture: String,
    pub session_id: String,
}

pub struct ConversationLog {
    conn: Mutex<Connection>,
    /// The last [`DEDUP_WINDOW`] `(role, content)` pairs appended, in order -
    /// the in-memory dedup gate. Keyed on the pair rather than
    /// `message_hash` because the hash is timestamp-salted and would never
    /// collide within the window otherwise.
    recent_window: Mutex<Vec<(String, String)>>,
    session_id: String,
    max_active: usize,
}

impl ConversationLog {
    pub fn open(db_path: &Path) -> Result<Self, ConversationError> {
        Self::open_with_config(db_path, DEFAULT_SESSION_ID, DEFAULT_ACTIVE_TABLE_CEILING)
    }

    /// Open with the `session_id`/`max_messages` knobs `PipulateConfig`
    /// exposes (§6). `max_messages` bounds the active table the same way it
    /// bounds the in-memory window - both are "how much history stays hot".
    pub fn open_with_config(
        db_path: &Path,
        session_id: impl Into<String>,
        max_messages: usize,
    ) -> Result<Self, ConversationError> {
        if let Some(parent) = db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;

        let log = Self {
            conn: Mutex::new(conn),
            recent_window: Mutex::new(Vec::new()),
            session_id: session_id.into(),
            max_active: max_messages,
        };
        log.sync_dedup_cache_from_database()?;
        Ok(log)
    }

    pub fn open_in_memory() -> Result<Self, ConversationError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            recent_window: Mutex::new(Vec::new()),
            session_id: DEFAULT_SESSION_ID.to_string(),
            max_active: DEFAULT_ACTIVE_TABLE_CEILING,
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), ConversationError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS conversation_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                message_hash TEXT NOT NULL UNIQUE
            );
            CREATE INDEX IF NOT EXISTS idx_conversation_messages_hash
                ON conversation_messages (message_hash);

            CREATE TABLE IF NOT EXISTS conversation_messages_archive (
                id INTEGER PRIMARY KEY,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                message_hash TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Reload the dedup cache from the DESC page of the active table,
    /// re-sorted to ascending `id` order - see module docs for why `id`,
    /// not `timestamp`, is authoritative.
    fn sync_dedup_cache_from_database(&self) -> Result<(), ConversationError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT role, content FROM conversation_messages ORDER BY id DESC LIMIT ?1",
        )?;
        let mut window: Vec<(String, String)> = stmt
            .query_map(params![DEDUP_WINDOW as i64], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;
        window.reverse();
        *self.recent_window.lock() = window;
        Ok(())
    }

    /// Stable 16-hex digest of `role:content:timestamp` (§3) - the
    /// `message_hash` UNIQUE column's backstop against an accidental
    /// concurrent duplicate. The timestamp salt means this alone can't
    /// detect "same message sent twice" across time; that's what
    /// `recent_window` is for.
    fn content_hash(role: &str, content: &str, timestamp: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{role}:{content}:{timestamp}").as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..16].to_string()
    }

    /// Append a message. A duplicate `(role, content)` within the last
    /// [`DEDUP_WINDOW`] messages is silently ignored and `Ok(false)` is
    /// returned; a genuinely new message is inserted and `Ok(true)` is
    /// returned. Outside that window the same content can be re-appended -
    /// dedup is window-scoped, not permanent (§8 property 5).
    pub fn append(&self, role: MessageRole, content: &str) -> Result<bool, ConversationError> {
        {
            let recent = self.recent_window.lock();
            if recent.iter().any(|(r, c)| r == role.as_str() && c == content) {
                debug!("skipping duplicate conversation message within dedup window");
                return Ok(false);
            }
        }

        let now = Utc::now();
        let timestamp = now.to_rfc3339();
        let hash = Self::content_hash(role.as_str(), content, &timestamp);

        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO conversation_messages (session_id, role, content, timestamp, message_hash)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![self.session_id, role.as_str(), content, timestamp, hash],
        )?;
        drop(conn);

        if inserted == 0 {
            return Ok(false);
        }

        let mut recent = self.recent_window.lock();
        recent.push((role.as_str().to_string(), content.to_string()));
        if recent.len() > DEDUP_WINDOW {
            let overflow = recent.len() - DEDUP_WINDOW;
            recent.drain(0..overflow);
        }
        drop(recent);

        self.archive_overflow_if_needed()?;
        Ok(true)
    }

    /// Move the oldest rows out of the active table once it grows past
    /// `max_active`, keeping active reads fast without losing
    /// history.
    fn archive_overflow_if_needed(&self) -> Result<(), ConversationError> {
        let conn = self.conn.lock();
        let active_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM conversation_messages", [], |r| r.get(0))?;
        if (active_count as usize) <= self.max_active {
            return Ok(());
        }

        let overflow = active_count as usize - self.max_active;
        conn.execute(
            "INSERT INTO conversation_messages_archive (id, session_id, role, content, timestamp, message_hash)
             SELECT id, session_id, role, content, timestamp, message_hash FROM conversation_messages
             ORDER BY id ASC LIMIT ?1",
            params![overflow as i64],
        )?;
        conn.execute(
            "DELETE FROM conversation_messages WHERE id IN (
                SELECT id FROM conversation_messages ORDER BY id ASC LIMIT ?1
            )",
            params![overflow as i64],
        )?;
        info!(overflow, "archived oldest conversation messages");
        Ok(())
    }

    /// Return up to `limit` most recent messages, in chronological order.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<ConversationMessage>, ConversationError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, role, content, timestamp, message_hash FROM conversation_messages
             ORDER BY id DESC LIMIT ?1",
        )?;
        let mut rows: Vec<ConversationMessage> = stmt
            .query_map(params![limit as i64], |row| {
                let id: i64 = row.get(0)?;
                let session_id: String = row.get(1)?;
                let role: String = row.get(2)?;
                let content: String = row.get(3)?;
                let timestamp: String = row.get(4)?;
                let message_hash: String = row.get(5)?;
                Ok((id, session_id, role, content, timestamp, message_hash))
            })?
            .filter_map(|r| r.ok())
            .map(|(id, session_id, role, content, timestamp, message_hash)| ConversationMessage {
                id,
                session_id,
                role: role.parse().unwrap_or(MessageRole::User),
                content,
                timestamp: timestamp
                    .parse::<DateTime<Utc>>()
                    .unwrap_or_else(|_| Utc::now()),
                message_hash,
            })
            .collect();
        rows.reverse();
        Ok(rows)
    }

    /// `total` and `db_total` are both `COUNT(*)` against the active table,
    /// computed from the same query result - they can never diverge, which
    /// is the point: the field exists so callers can assert it rather than
    /// trust an in-memory counter that could have drifted.
    pub fn stats(&self) -> Result<ConversationStats, ConversationError> {
        let conn = self.conn.lock();
        let db_total: i64 =
            conn.query_row("SELECT COUNT(*) FROM conversation_messages", [], |r| r.get(0))?;

        let mut per_role_counts = HashMap::new();
        let mut stmt =
            conn.prepare("SELECT role, COUNT(*) FROM conversation_messages GROUP BY role")?;
        let rows = stmt.query_map([], |row| {
            let role: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((role, count as usize))
        })?;
        for row in rows {
            let (role, count) = row?;
            per_role_counts.insert(role, count);
        }
        drop(stmt);

        let total_content_length: i64 = conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(content)), 0) FROM conversation_messages",
            [],
            |r| r.get(0),
        )?;

        let avg_length = if db_total > 0 {
            total_content_length as f64 / db_total as f64
        } else {
            0.0
        };

        Ok(ConversationStats {
            total: db_total as usize,
            per_role_counts,
            total_content_length: total_content_length as usize,
            avg_length,
            db_total: db_total as usize,
            architecture: "sqlite-append-only-with-archive".to_string(),
            session_id: self.session_id.clone(),
        })
    }

    /// Archive every active message, then empty the active table. Never
    /// touches previously archived rows - the archive table only grows.
    /// Returns the number of rows archived.
    pub fn clear(&self) -> Result<usize, ConversationError> {
        let conn = self.conn.lock();
        let archived = conn.execute(
            "INSERT INTO conversation_messages_archive (id, session_id, role, content, timestamp, message_hash)
             SELECT id, session_id, role, content, timestamp, message_hash FROM conversation_messages",
            [],
        )?;
        conn.execute("DELETE FROM conversation_messages", [])?;
        drop(conn);
        *self.recent_window.lock() = Vec::new();
        info!(archived, "cleared active conversation table");
        Ok(archived)
    }

    /// Replace this log's contents with a full copy of the database at
    /// `backup_path`, using SQLite's own page-level backup API rather than a
    /// row-by-row copy.
    pub fn restore_from_backup(&self, backup_path: &Path) -> Result<(), ConversationError> {
        let source = Connection::open(backup_path)?;
        let mut dest = self.conn.lock();
        {
            let backup = Backup::new(&source, &mut dest)?;
            backup.run_to_completion(5, std::time::Duration::from_millis(10), None)?;
        }
        drop(dest);
        self.sync_dedup_cache_from_database()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_list_round_trips_in_chronological_order() {
        let log = ConversationLog::open_in_memory().expect("open");
        log.append(MessageRole::User, "hello").expect("append");
        log.append(MessageRole::Assistant, "hi there").expect("append");

        let messages = log.list_recent(10).expect("list");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].content, "hi there");
    }

    #[test]
    fn duplicate_content_is_deduplicated() {
        let log = ConversationLog::open_in_memory().expect("open");
        assert!(log.append(MessageRole::User, "same message").expect("append1"));
        assert!(!log.append(MessageRole::User, "same message").expect("append2"));

        let stats = log.stats().expect("stats");
        assert_eq!(stats.total, 1);
        assert_eq!(stats.total, stats.db_total);
    }

    #[test]
    fn distinct_roles_are_not_deduplicated() {
        let log = ConversationLog::open_in_memory().expect("open");
        log.append(MessageRole::User, "ping").expect("append1");
        log.append(MessageRole::Assistant, "ping").expect("append2");

        let stats = log.stats().expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.per_role_counts.get("user"), Some(&1));
        assert_eq!(stats.per_role_counts.get("assistant"), Some(&1));
    }

    #[test]
    fn repeated_content_outside_the_window_is_appended_again() {
        let log = ConversationLog::open_in_memory().expect("open");
        assert!(log.append(MessageRole::User, "hello").expect("append1"));
        for i in 0..DEDUP_WINDOW {
            log.append(MessageRole::User, &format!("filler {i}"))
                .expect("filler append");
        }
        assert!(log
            .append(MessageRole::User, "hello")
            .expect("append outside window"));

        let stats = log.stats().expect("stats");
        assert_eq!(stats.total, stats.db_total);
    }

    #[test]
    fn stats_total_always_matches_db_total() {
        let log = ConversationLog::open_in_memory().expect("open");
        log.append(MessageRole::User, "one").expect("append1");
        log.append(MessageRole::Assistant, "two").expect("append2");
        log.append(MessageRole::System, "three").expect("append3");

        let stats = log.stats().expect("stats");
        assert_eq!(stats.total, stats.db_total);
        assert_eq!(stats.total, 3);
        assert!(stats.avg_length > 0.0);
        assert_eq!(stats.session_id, "default");
    }

    #[test]
    fn clear_archives_active_rows_instead_of_deleting_them() {
        let log = ConversationLog::open_in_memory().expect("open");
        log.append(MessageRole::User, "one").expect("append");
        log.append(MessageRole::Assistant, "two").expect("append");

        let archived = log.clear().expect("clear");
        assert_eq!(archived, 2);
        assert_eq!(log.list_recent(10).expect("list").len(), 0);

        let stats = log.stats().expect("stats");
        assert_eq!(stats.total, 0);
        assert_eq!(stats.db_total, 0);
    }
}
