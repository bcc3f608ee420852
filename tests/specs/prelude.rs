//! Shared test helpers for the workspace-level behavioral specs.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use pipulate_adapters::{build_router, AppState};
use pipulate_core::id::SequentialIdGen;
use pipulate_core::SystemClock;
use pipulate_engine::{HelloWorkflow, MessageQueue, PipelineStore, VerbatimNarrationBackend, WorkflowRegistry, WorkflowRuntime};
use pipulate_storage::{ConversationLog, KeyedStore};
use tower::ServiceExt;

/// An in-process `hello` workflow harness: a real axum router over a
/// tempdir-backed `KeyedStore` and an in-memory `ConversationLog`.
pub struct Harness {
    pub router: axum::Router,
    pub conversation: Arc<ConversationLog>,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let keyed = Arc::new(KeyedStore::open(dir.path()).expect("open keyed store"));
        let pipelines = PipelineStore::new(keyed, Arc::new(SystemClock), Arc::new(SequentialIdGen::default()));
        let conversation = Arc::new(ConversationLog::open_in_memory().expect("open conversation"));
        let messages = Arc::new(MessageQueue::new(Arc::clone(&conversation), Arc::new(VerbatimNarrationBackend)));
        let runtime = Arc::new(WorkflowRuntime::new(pipelines, Some(messages)));
        let mut workflows = WorkflowRegistry::new();
        workflows.register(Arc::new(HelloWorkflow::new()));
        let state = AppState::new(runtime, Arc::new(workflows));
        Self {
            router: build_router(state),
            conversation,
            _dir: dir,
        }
    }

    pub async fn get(&self, path: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    pub async fn post_form(&self, path: &str, form_body: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(
                Request::post(path)
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(form_body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response")
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

pub fn assert_ok(response: &Response<Body>) {
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// CLI
// =============================================================================

/// A temporary, isolated `PIPULATE_STATE_DIR` for black-box CLI specs.
pub struct CliHome {
    dir: tempfile::TempDir,
}

impl CliHome {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("pipulate").expect("pipulate binary");
        cmd.env("PIPULATE_STATE_DIR", self.path());
        cmd
    }
}
