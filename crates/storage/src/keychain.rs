// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed accessor over `KeyedStore` for the AI keychain (§3.1): durable
//! key/value facts an assistant collaborator accumulates across sessions.
//! Participates in `KeyedStore`'s own WAL/snapshot durability rather than
//! `BackupManager`'s sqlite-table path - there is no sqlite table backing
//! it.

use std::sync::Arc;

use pipulate_core::{AiKeychainEntry, Clock};

use crate::error::StorageError;
use crate::keyed_store::KeyedStore;

const KEYCHAIN_PREFIX: &str = "keychain:";

pub struct KeychainStore {
    store: Arc<KeyedStore>,
    clock: Arc<dyn Clock>,
}

impl KeychainStore {
    pub fn new(store: Arc<KeyedStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn key_for(key: &str) -> String {
        format!("{KEYCHAIN_PREFIX}{key}")
    }

    pub fn get(&self, key: &str) -> Option<AiKeychainEntry> {
        self.store
            .get(&Self::key_for(key))
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Create `key` if absent, otherwise overwrite its value and bump
    /// `updated_at` - the original `created_at` is preserved across updates.
    pub fn append_keychain_fact(&self, key: &str, value: &str) -> Result<AiKeychainEntry, StorageError> {
        let now = self.clock.now();
        let entry = match self.get(key) {
            Some(mut existing) => {
                existing.value = value.to_string();
                existing.updated_at = now;
                existing
            }
            None => AiKeychainEntry {
                key: key.to_string(),
                value: value.to_string(),
                created_at: now,
                updated_at: now,
            },
        };
        let json = serde_json::to_value(&entry).expect("AiKeychainEntry always serializes");
        self.store.set(&Self::key_for(key), json)?;
        Ok(entry)
    }

    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.store.delete(&Self::key_for(key))
    }

    pub fn list(&self) -> Vec<AiKeychainEntry> {
        self.store
            .iter_prefix(KEYCHAIN_PREFIX)
            .into_iter()
            .filter_map(|(_, v)| serde_json::from_value(v).ok())
            .collect()
    }
}
