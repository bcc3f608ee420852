// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure `StepRender` -> HTML translation, shared by every `HostAdapter`.
//!
//! This is where the chain-reaction invariant actually gets written to the
//! wire: every Completed/Locked fragment embeds an `hx-get`/`hx-trigger=load`
//! loader for the next step, and every Form fragment embeds an empty,
//! trigger-less placeholder for it. Neither adapter implementation is
//! allowed to duplicate this logic - they call [`render_fragment`] and
//! compose the result into a page.

use crate::html::escape;
use pipulate_engine::{Fragment, StepRender, Trigger, Workflow};

/// The HTML produced for one `StepRender`, plus the trigger it carried (kept
/// alongside the markup so adapters/tests can assert chain-reaction
/// properties without re-parsing HTML).
#[derive(Debug, Clone)]
pub struct RenderedFragment {
    pub html: String,
    pub trigger: Option<Trigger>,
    /// Set when the host should instruct the client to reload the whole
    /// page rather than swap a fragment - used for the empty-init-key case
    /// (§4.3.1 step 1) and nothing else today.
    pub refresh: bool,
}

impl RenderedFragment {
    pub fn refresh() -> Self {
        Self {
            html: String::new(),
            trigger: None,
            refresh: true,
        }
    }
}

fn route_for_step(app_name: &str, step_id: &str, pipeline_id: &str) -> String {
    let pipeline_id = escape(pipeline_id);
    if step_id == "finalize" {
        format!("/{app_name}/finalize?pipeline_id={pipeline_id}")
    } else {
        format!("/{app_name}/{step_id}?pipeline_id={pipeline_id}")
    }
}

/// Every loader carries `pipeline_id` on the querystring - without it axum's
/// extractor on the next GET has nothing to resolve the pipeline from, and
/// the chain reaction 400s on its very next hop.
fn loader_div(app_name: &str, pipeline_id: &str, trigger: Option<&Trigger>) -> String {
    match trigger {
        Some(t) => {
            let target = t.target_step.as_str();
            let route = route_for_step(app_name, target, pipeline_id);
            format!(
                r#"<div id="{target}" hx-get="{route}" hx-trigger="load" hx-target="#{target}" hx-swap="outerHTML"></div>"#
            )
        }
        None => String::new(),
    }
}

/// Hidden field every form needs so its POST resolves to the same pipeline
/// the fragment was rendered for.
fn pipeline_id_field(pipeline_id: &str) -> String {
    format!(r#"<input type="hidden" name="pipeline_id" value="{}" />"#, escape(pipeline_id))
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `pipeline_id` is threaded through explicitly (rather than read off the
/// fragment) because most fragment variants don't carry one - only
/// `FullRebuild` does. Every loader and form needs it on the wire regardless
/// of which fragment produced them.
pub fn render_fragment(app_name: &str, pipeline_id: &str, workflow: &dyn Workflow, render: &StepRender) -> RenderedFragment {
    let html = match &render.fragment {
        Fragment::Form {
            step_id,
            label,
            suggested_value,
        } => {
            let done = workflow
                .steps()
                .get(step_id.as_str())
                .map(|d| d.done.as_str())
                .unwrap_or("value");
            let suggested = suggested_value.as_deref().unwrap_or("");
            let placeholder = match workflow.steps().next_after(step_id.as_str()) {
                Some(next) => format!(r#"<div id="{}"></div>"#, next.id.as_str()),
                None => String::new(),
            };
            format!(
                r#"<div id="{step_id}" class="pipulate-step">
<form hx-post="/{app_name}/{step_id}_submit" hx-target="#{step_id}" hx-swap="outerHTML">
{pipeline_id_field}
<label>{label}</label>
<input type="text" name="{done}" value="{value}" />
<button type="submit">Next</button>
</form>
</div>
{placeholder}"#,
                step_id = step_id.as_str(),
                pipeline_id_field = pipeline_id_field(pipeline_id),
                label = escape(label),
                done = escape(done),
                value = escape(suggested),
            )
        }
        Fragment::Completed { step_id, value, label } => {
            format!(
                r#"<div id="{step_id}" class="pipulate-step pipulate-completed">
<span>{label}: {value}</span>
<form hx-post="/{app_name}/revert" hx-target="#pipulate-container" hx-swap="outerHTML">
{pipeline_id_field}
<input type="hidden" name="step_id" value="{step_id}" />
<button type="submit">Revert</button>
</form>
</div>
{loader}"#,
                step_id = step_id.as_str(),
                pipeline_id_field = pipeline_id_field(pipeline_id),
                label = escape(label),
                value = escape(&value_text(value)),
                loader = loader_div(app_name, pipeline_id, render.trigger.as_ref()),
            )
        }
        Fragment::Locked { step_id, value, label } => {
            format!(
                r#"<div id="{step_id}" class="pipulate-step pipulate-locked">
<span>{label}: {value}</span>
</div>
{loader}"#,
                step_id = step_id.as_str(),
                label = escape(label),
                value = escape(&value_text(value)),
                loader = loader_div(app_name, pipeline_id, render.trigger.as_ref()),
            )
        }
        Fragment::Placeholder { step_id } => {
            format!(r#"<div id="{}"></div>"#, step_id.as_str())
        }
        Fragment::Error { message } => {
            format!(r#"<div class="pipulate-error">{}</div>"#, escape(message))
        }
        Fragment::FinalizeControl => format!(
            r#"<div id="finalize" class="pipulate-step">
<form hx-post="/{app_name}/finalize" hx-target="#finalize" hx-swap="outerHTML">
{pipeline_id_field}
<button type="submit">Finalize</button>
</form>
</div>"#,
            pipeline_id_field = pipeline_id_field(pipeline_id),
        ),
        Fragment::UnlockControl => format!(
            r#"<div id="finalize" class="pipulate-step pipulate-locked">
<form hx-post="/{app_name}/unfinalize" hx-target="#pipulate-container" hx-swap="outerHTML">
{pipeline_id_field}
<button type="submit">Unlock</button>
</form>
</div>"#,
            pipeline_id_field = pipeline_id_field(pipeline_id),
        ),
        Fragment::FullRebuild { pipeline_id } => format!(
            r#"<div id="pipulate-container" data-pipeline-id="{}">
{}
</div>"#,
            escape(pipeline_id),
            loader_div(app_name, pipeline_id, render.trigger.as_ref()),
        ),
    };

    RenderedFragment {
        html,
        trigger: render.trigger.clone(),
        refresh: false,
    }
}
