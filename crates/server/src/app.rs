// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires every durable component together into one axum `Router`.
//!
//! `profile`/`tasks` are the surrounding web app's own tables (out of
//! scope here, §2/§3 Non-goals) - `BackupManager` still carries the
//! capability to snapshot them, it just has nothing to back up in this
//! server. The AI keychain lives inside `KeyedStore`, which already gets
//! durability from its own WAL/snapshot pair, so it rides along on
//! `KeyedStore::checkpoint` rather than `BackupManager`'s sqlite-table path.

use std::sync::Arc;

use pipulate_adapters::{build_router, AppState};
use pipulate_core::{PipulateConfig, SystemClock, UuidIdGen};
use pipulate_engine::{
    HelloWorkflow, MessageQueue, PipelineStore, VerbatimNarrationBackend, WorkflowRegistry, WorkflowRuntime,
};
use pipulate_storage::{BackupManager, ConversationBackupManager, ConversationLog, KeyedStore};

pub struct Application {
    pub router: axum::Router,
    pub keyed_store: Arc<KeyedStore>,
    pub conversation: Arc<ConversationLog>,
    pub backup_manager: BackupManager,
    pub conversation_backup: ConversationBackupManager,
}

pub fn build(
    config: &PipulateConfig,
    keyed_store_dir: &std::path::Path,
    conversation_db_path: &std::path::Path,
) -> anyhow::Result<Application> {
    let keyed_store = Arc::new(KeyedStore::open(keyed_store_dir)?);
    let conversation = Arc::new(ConversationLog::open_with_config(
        conversation_db_path,
        config.session_id.clone(),
        config.max_messages,
    )?);

    let pipelines = PipelineStore::new(Arc::clone(&keyed_store), Arc::new(SystemClock), Arc::new(UuidIdGen));
    let messages = Arc::new(MessageQueue::new(
        Arc::clone(&conversation),
        Arc::new(VerbatimNarrationBackend),
    ));
    let runtime = Arc::new(WorkflowRuntime::new(pipelines, Some(messages)));

    let mut workflows = WorkflowRegistry::new();
    workflows.register(Arc::new(HelloWorkflow::new()));

    let state = AppState::new(runtime, Arc::new(workflows));
    let router = build_router(state);

    let backup_manager = BackupManager::new(config.backup_root.join("tables"))?;
    let conversation_backup =
        ConversationBackupManager::new(conversation_db_path.to_path_buf(), config.backup_root.join("conversation"))?;

    Ok(Application {
        router,
        keyed_store,
        conversation,
        backup_manager,
        conversation_backup,
    })
}
