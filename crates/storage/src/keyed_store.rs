// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A durable string-keyed JSON map: the substrate every pipeline and the
//! AI keychain are persisted into.
//!
//! Writes go through a WAL before being applied in memory (`set`/`delete`
//! cannot silently lose data); a background [`Checkpointer`](crate::checkpoint::Checkpointer)
//! periodically compacts the WAL into a snapshot so recovery does not have
//! to replay the whole history.

use crate::checkpoint::{self, CheckpointError, Checkpointer};
use crate::error::StorageError;
use crate::snapshot::Snapshot;
use crate::wal::{StoreOp, Wal};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// The materialized state a `KeyedStore` holds in memory.
pub type KeyedStoreState = HashMap<String, serde_json::Value>;

struct Inner {
    state: KeyedStoreState,
    wal: Wal,
}

/// A durable key -> JSON value map with atomic single-key writes.
pub struct KeyedStore {
    inner: Mutex<Inner>,
    checkpointer: Checkpointer,
    snapshot_path: PathBuf,
}

impl KeyedStore {
    /// Open (or create) a store rooted at `dir`, recovering from the most
    /// recent snapshot plus any WAL entries written after it.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir)?;
        let snapshot_path = dir.join("snapshot.zst");
        let wal_path = dir.join("wal.jsonl");

        let snapshot = checkpoint::load_snapshot(&snapshot_path)?;
        let (mut state, processed_seq) = match snapshot {
            Some(Snapshot { seq, state, .. }) => (state, seq),
            None => (HashMap::new(), 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        for entry in wal.entries_after(processed_seq)? {
            apply(&mut state, &entry.op);
            wal.mark_processed(entry.seq);
        }

        info!(
            recovered_keys = state.len(),
            processed_seq, "KeyedStore recovered"
        );

        Ok(Self {
            inner: Mutex::new(Inner { state, wal }),
            checkpointer: Checkpointer::new(snapshot_path.clone()),
            snapshot_path,
        })
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.lock().state.get(key).cloned()
    }

    /// Atomically overwrite a key. The only failure mode is `StorageUnavailable`
    /// (the WAL write itself failing) - callers must treat success as durable.
    pub fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        let op = StoreOp::Set {
            key: key.to_string(),
            value: value.clone(),
        };
        let mut inner = self.inner.lock();
        inner
            .wal
            .append(&op)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        inner
            .wal
            .flush()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        inner.state.insert(key.to_string(), value);
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        let op = StoreOp::Delete {
            key: key.to_string(),
        };
        let mut inner = self.inner.lock();
        inner
            .wal
            .append(&op)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        inner
            .wal
            .flush()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        inner.state.remove(key);
        Ok(())
    }

    /// Enumerate all `(key, value)` pairs whose key starts with `prefix`.
    pub fn iter_prefix(&self, prefix: &str) -> Vec<(String, serde_json::Value)> {
        self.inner
            .lock()
            .state
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Take a background checkpoint and truncate the WAL once it is durable.
    ///
    /// Safe to call while other handlers run: `get`/`set`/`delete` only hold
    /// the lock briefly, and the heavy serialize+compress+fsync work happens
    /// off that lock, in the checkpoint thread.
    pub fn checkpoint(&self) -> Result<(), CheckpointError> {
        let (seq, state) = {
            let inner = self.inner.lock();
            (inner.wal.write_seq(), inner.state.clone())
        };
        let handle = self.checkpointer.start(seq, &state);
        let result = handle.wait()?;
        let mut inner = self.inner.lock();
        inner.wal.mark_processed(result.seq);
        inner
            .wal
            .truncate_before(result.seq)
            .map_err(|e| CheckpointError::Failed(e.to_string()))?;
        Ok(())
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}

fn apply(state: &mut KeyedStoreState, op: &StoreOp) {
    match op {
        StoreOp::Set { key, value } => {
            state.insert(key.clone(), value.clone());
        }
        StoreOp::Delete { key } => {
            state.remove(key);
        }
    }
}
