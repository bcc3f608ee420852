//! S7: if a row exists in both the backup and the target with a newer
//! `updated_at` in the target, `restore_table` leaves the target row
//! unchanged rather than overwriting it with stale backup data.

use pipulate_storage::BackupManager;
use rusqlite::Connection;

fn make_db(path: &std::path::Path, id: i64, value: &str, updated_at: &str) {
    let conn = Connection::open(path).expect("open db");
    conn.execute_batch(
        "CREATE TABLE items (id INTEGER PRIMARY KEY, value TEXT NOT NULL, updated_at TEXT NOT NULL)",
    )
    .expect("create table");
    conn.execute(
        "INSERT INTO items (id, value, updated_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![id, value, updated_at],
    )
    .expect("insert row");
}

#[test]
fn restore_leaves_a_newer_target_row_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target_path = dir.path().join("target.db");
    let backup_root = dir.path().join("backups");

    make_db(&target_path, 1, "target-value", "2026-07-28T12:00:00Z");

    let manager = BackupManager::new(backup_root).expect("new manager");
    // Seed today's backup file directly from an older snapshot so the
    // backup row's updated_at predates the target row's.
    assert!(manager.backup_table(&target_path, "items"));

    // Age the backup row down by rewriting it directly - `backup_table`
    // would otherwise just re-copy the current (newer) target forward.
    let backup_file = dir
        .path()
        .join("backups")
        .join(format!("items_{}.db", chrono::Local::now().date_naive()));
    {
        let conn = Connection::open(&backup_file).expect("open backup");
        conn.execute(
            "UPDATE items SET value = 'stale-backup-value', updated_at = '2026-07-27T00:00:00Z' WHERE id = 1",
            [],
        )
        .expect("age backup row");
    }

    let restored = manager.restore_table(&target_path, "items");
    assert!(restored);

    let conn = Connection::open(&target_path).expect("open target");
    let (value, updated_at): (String, String) = conn
        .query_row("SELECT value, updated_at FROM items WHERE id = 1", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .expect("read target row");

    assert_eq!(value, "target-value");
    assert_eq!(updated_at, "2026-07-28T12:00:00Z");
}
