// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pipulate keychain set <key> <value>`: upsert a durable AI-keychain fact
//! (§3.1) without going through the server process.

use std::sync::Arc;

use pipulate_core::SystemClock;
use pipulate_storage::{KeyedStore, KeychainStore};

use crate::error::CliError;
use crate::paths;

pub fn set(key: &str, value: &str) -> Result<(), CliError> {
    let store = Arc::new(KeyedStore::open(&paths::keyed_store_dir())?);
    let keychain = KeychainStore::new(store, Arc::new(SystemClock));
    let entry = keychain.append_keychain_fact(key, value)?;
    println!("{} = {}", entry.key, entry.value);
    Ok(())
}
