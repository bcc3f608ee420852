//! S5: appending the same (role, content) pair twice in a row is a no-op
//! the second time - the dedup window collapses repeats instead of
//! growing the log.

use pipulate_core::MessageRole;
use pipulate_storage::ConversationLog;

#[test]
fn repeating_the_same_message_is_deduped() {
    let log = ConversationLog::open_in_memory().expect("open");

    let first = log.append(MessageRole::User, "hi").expect("append");
    assert!(first);

    let second = log.append(MessageRole::User, "hi").expect("append");
    assert!(!second);

    let stats = log.stats().expect("stats");
    assert_eq!(stats.total, 1);
}

#[test]
fn a_different_message_after_a_duplicate_is_still_appended() {
    let log = ConversationLog::open_in_memory().expect("open");

    log.append(MessageRole::User, "hi").expect("append");
    log.append(MessageRole::User, "hi").expect("append");
    let third = log.append(MessageRole::User, "bye").expect("append");
    assert!(third);

    let stats = log.stats().expect("stats");
    assert_eq!(stats.total, 2);
}
