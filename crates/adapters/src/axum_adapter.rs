// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The production Host Adapter: an axum router translating HTTP requests
//! into `WorkflowRuntime` calls and `StepRender` results into HTML
//! responses.
//!
//! `pipeline_id` travels as a `?pipeline_id=` query parameter on GETs and a
//! `pipeline_id` form field on POSTs - the wire convention the spec leaves
//! unstated for the Host Adapter boundary.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use pipulate_engine::{Fragment, RuntimeError, WorkflowRegistry, WorkflowRuntime};

use crate::host::HostAdapter;
use crate::render::{render_fragment, RenderedFragment};

/// Turns a `StepRender` into HTML via the shared [`render_fragment`]
/// function. Stateless - every piece of mutable state lives in `AppState`.
pub struct AxumHostAdapter;

impl HostAdapter for AxumHostAdapter {
    fn render(
        &self,
        app_name: &str,
        pipeline_id: &str,
        workflow: &dyn pipulate_engine::Workflow,
        step_render: &pipulate_engine::StepRender,
    ) -> RenderedFragment {
        render_fragment(app_name, pipeline_id, workflow, step_render)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<WorkflowRuntime>,
    pub workflows: Arc<WorkflowRegistry>,
    pub adapter: Arc<dyn HostAdapter>,
}

impl AppState {
    pub fn new(runtime: Arc<WorkflowRuntime>, workflows: Arc<WorkflowRegistry>) -> Self {
        Self {
            runtime,
            workflows,
            adapter: Arc::new(AxumHostAdapter),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/:app", get(landing))
        .route("/:app/init", post(init))
        .route("/:app/revert", post(revert))
        .route("/:app/finalize", get(finalize_status).post(finalize))
        .route("/:app/unfinalize", post(unfinalize))
        .route("/:app/:step", get(step_get).post(step_post))
        .with_state(state)
}

struct HandlerError(StatusCode, String);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        (self.0, Html(format!(r#"<div class="pipulate-error">{}</div>"#, crate::html::escape(&self.1)))).into_response()
    }
}

impl From<RuntimeError> for HandlerError {
    fn from(err: RuntimeError) -> Self {
        let status = match &err {
            RuntimeError::PipelineNotFound(_) | RuntimeError::StepNotFound(_) | RuntimeError::WorkflowNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            RuntimeError::ValidationError(_) | RuntimeError::PipelineConflict { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        HandlerError(status, err.to_string())
    }
}

fn workflow_or_404(
    state: &AppState,
    app: &str,
) -> Result<Arc<dyn pipulate_engine::Workflow>, HandlerError> {
    state
        .workflows
        .get(app)
        .ok_or_else(|| HandlerError(StatusCode::NOT_FOUND, format!("unknown workflow {app}")))
}

fn to_response(fragment: RenderedFragment) -> Response {
    if fragment.refresh {
        let mut response = Html(String::new()).into_response();
        response
            .headers_mut()
            .insert("HX-Refresh", HeaderValue::from_static("true"));
        return response;
    }
    Html(fragment.html).into_response()
}

async fn landing(State(state): State<AppState>, Path(app): Path<String>) -> Result<Response, HandlerError> {
    workflow_or_404(&state, &app)?;
    let existing_keys = state.runtime.list_pipeline_keys(&app);
    let datalist_options: String = existing_keys
        .iter()
        .map(|key| format!(r#"<option value="{}"></option>"#, crate::html::escape(key)))
        .collect();
    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{app}</title></head>
<body>
<div id="pipulate-container">
<form hx-post="/{app}/init" hx-target="#pipulate-container" hx-swap="outerHTML">
<label>Resume or start a pipeline</label>
<input type="text" name="pipeline_id" list="pipeline-keys" placeholder="leave blank for a new one" />
<datalist id="pipeline-keys">{datalist_options}</datalist>
<button type="submit">Go</button>
</form>
</div>
</body>
</html>"#,
        app = crate::html::escape(&app),
    );
    Ok(Html(body).into_response())
}

async fn init(
    State(state): State<AppState>,
    Path(app): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, HandlerError> {
    let workflow = workflow_or_404(&state, &app)?;
    let submitted = form.get("pipeline_id").map(String::as_str).unwrap_or("");
    if submitted.is_empty() {
        return Ok(to_response(RenderedFragment::refresh()));
    }
    let render = state.runtime.init(workflow.as_ref(), submitted)?;
    // `init` resolves the submitted key against the workflow's prefix, so the
    // id the fragment must carry going forward is the one it rebuilt around,
    // not the (possibly bare) value the client posted.
    let resolved_pipeline_id = match &render.fragment {
        Fragment::FullRebuild { pipeline_id } => pipeline_id.as_str(),
        _ => submitted,
    };
    Ok(to_response(
        state.adapter.render(&app, resolved_pipeline_id, workflow.as_ref(), &render),
    ))
}

async fn revert(
    State(state): State<AppState>,
    Path(app): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, HandlerError> {
    let workflow = workflow_or_404(&state, &app)?;
    let pipeline_id = form
        .get("pipeline_id")
        .ok_or_else(|| HandlerError(StatusCode::BAD_REQUEST, "missing pipeline_id".to_string()))?;
    let step_id = form
        .get("step_id")
        .ok_or_else(|| HandlerError(StatusCode::BAD_REQUEST, "missing step_id".to_string()))?;
    let render = state.runtime.revert(workflow.as_ref(), pipeline_id, step_id)?;
    Ok(to_response(state.adapter.render(&app, pipeline_id, workflow.as_ref(), &render)))
}

async fn finalize_status(
    State(state): State<AppState>,
    Path(app): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, HandlerError> {
    let workflow = workflow_or_404(&state, &app)?;
    let pipeline_id = query
        .get("pipeline_id")
        .ok_or_else(|| HandlerError(StatusCode::BAD_REQUEST, "missing pipeline_id".to_string()))?;
    let render = state.runtime.finalize_status(workflow.as_ref(), pipeline_id)?;
    Ok(to_response(state.adapter.render(&app, pipeline_id, workflow.as_ref(), &render)))
}

async fn finalize(
    State(state): State<AppState>,
    Path(app): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, HandlerError> {
    let workflow = workflow_or_404(&state, &app)?;
    let pipeline_id = form
        .get("pipeline_id")
        .ok_or_else(|| HandlerError(StatusCode::BAD_REQUEST, "missing pipeline_id".to_string()))?;
    let render = state.runtime.finalize(workflow.as_ref(), pipeline_id)?;
    Ok(to_response(state.adapter.render(&app, pipeline_id, workflow.as_ref(), &render)))
}

async fn unfinalize(
    State(state): State<AppState>,
    Path(app): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, HandlerError> {
    let workflow = workflow_or_404(&state, &app)?;
    let pipeline_id = form
        .get("pipeline_id")
        .ok_or_else(|| HandlerError(StatusCode::BAD_REQUEST, "missing pipeline_id".to_string()))?;
    let render = state.runtime.unfinalize(workflow.as_ref(), pipeline_id)?;
    Ok(to_response(state.adapter.render(&app, pipeline_id, workflow.as_ref(), &render)))
}

async fn step_get(
    State(state): State<AppState>,
    Path((app, step)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, HandlerError> {
    let workflow = workflow_or_404(&state, &app)?;
    let pipeline_id = query
        .get("pipeline_id")
        .ok_or_else(|| HandlerError(StatusCode::BAD_REQUEST, "missing pipeline_id".to_string()))?;
    let render = state.runtime.render_step(workflow.as_ref(), pipeline_id, &step)?;
    Ok(to_response(state.adapter.render(&app, pipeline_id, workflow.as_ref(), &render)))
}

/// The runtime's `submit_step` route is conventionally `<step>_submit`;
/// axum can't partial-match a path segment, so the suffix is stripped here.
async fn step_post(
    State(state): State<AppState>,
    Path((app, step)): Path<(String, String)>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, HandlerError> {
    let workflow = workflow_or_404(&state, &app)?;
    let step_id = step.strip_suffix("_submit").unwrap_or(&step);
    let pipeline_id = form
        .get("pipeline_id")
        .ok_or_else(|| HandlerError(StatusCode::BAD_REQUEST, "missing pipeline_id".to_string()))?;
    let render = state.runtime.submit_step(workflow.as_ref(), pipeline_id, step_id, &form)?;
    Ok(to_response(state.adapter.render(&app, pipeline_id, workflow.as_ref(), &render)))
}
