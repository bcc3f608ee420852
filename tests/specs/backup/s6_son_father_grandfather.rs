//! S6: three successive `create_backup` calls populate all three
//! generations, and the son is always a copy of the latest source.

use pipulate_storage::ConversationBackupManager;
use std::fs;

fn write_source(path: &std::path::Path, content: &[u8]) {
    fs::write(path, content).expect("write source db");
}

#[test]
fn three_backups_populate_son_father_and_grandfather() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("conversation.db");
    let backups = dir.path().join("backups");

    let manager = ConversationBackupManager::new(source.clone(), backups.clone()).expect("new");

    write_source(&source, b"generation one");
    assert!(manager.create_backup("first").expect("backup 1"));

    write_source(&source, b"generation two, longer");
    assert!(manager.create_backup("second").expect("backup 2"));

    write_source(&source, b"generation three, longer still");
    assert!(manager.create_backup("third").expect("backup 3"));

    let son = backups.join("discussion_son.db");
    let father = backups.join("discussion_father.db");
    let grandfather = backups.join("discussion_grandfather.db");

    assert!(son.exists());
    assert!(father.exists());
    assert!(grandfather.exists());

    let son_bytes = fs::read(&son).expect("read son");
    let source_bytes = fs::read(&source).expect("read source");
    assert_eq!(son_bytes, source_bytes);

    let father_bytes = fs::read(&father).expect("read father");
    assert_eq!(father_bytes, b"generation two, longer");

    let grandfather_bytes = fs::read(&grandfather).expect("read grandfather");
    assert_eq!(grandfather_bytes, b"generation one");
}

#[test]
fn backup_is_skipped_when_source_does_not_exist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("missing.db");
    let backups = dir.path().join("backups");

    let manager = ConversationBackupManager::new(source, backups).expect("new");
    let created = manager.create_backup("noop").expect("backup call");
    assert!(!created);
}
