use crate::prelude::CliHome;
use pipulate_core::SystemClock;
use pipulate_storage::{KeyedStore, KeychainStore};
use std::sync::Arc;

#[test]
fn keychain_set_persists_a_fact_readable_by_a_fresh_store_handle() {
    let home = CliHome::new();
    let output = home
        .cmd()
        .args(["keychain", "set", "favorite-color", "teal"])
        .output()
        .expect("run pipulate keychain set");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("favorite-color = teal"));

    let store = Arc::new(KeyedStore::open(&home.path().join("store")).expect("open store"));
    let keychain = KeychainStore::new(store, Arc::new(SystemClock));
    let entry = keychain.get("favorite-color").expect("entry present");
    assert_eq!(entry.value, "teal");
}

#[test]
fn keychain_set_twice_upserts_rather_than_duplicating() {
    let home = CliHome::new();
    home.cmd()
        .args(["keychain", "set", "mood", "curious"])
        .output()
        .expect("first set");
    home.cmd()
        .args(["keychain", "set", "mood", "determined"])
        .output()
        .expect("second set");

    let store = Arc::new(KeyedStore::open(&home.path().join("store")).expect("open store"));
    let keychain = KeychainStore::new(store, Arc::new(SystemClock));
    let entry = keychain.get("mood").expect("entry present");
    assert_eq!(entry.value, "determined");
    assert_eq!(keychain.list().len(), 1);
}
