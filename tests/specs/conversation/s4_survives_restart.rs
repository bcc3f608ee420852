//! S4: the conversation log survives a process restart because it is
//! backed by a real file, not memory - a fresh `ConversationLog` opened
//! over the same path sees everything the old one wrote.

use pipulate_core::MessageRole;
use pipulate_storage::ConversationLog;

#[test]
fn a_fresh_instance_over_the_same_database_sees_prior_messages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("conversation.db");

    {
        let log = ConversationLog::open(&db_path).expect("open");
        log.append(MessageRole::User, "The test word is flibbertigibbet.")
            .expect("append");
    }

    let log = ConversationLog::open(&db_path).expect("reopen");
    let messages = log.list_recent(10).expect("list");
    assert!(messages.iter().any(|m| m.content == "The test word is flibbertigibbet."));

    let stats = log.stats().expect("stats");
    assert_eq!(stats.total, stats.db_total);
    assert_eq!(stats.total, 1);
}
