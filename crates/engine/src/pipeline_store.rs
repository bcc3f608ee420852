// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed accessors over `KeyedStore` for per-pipeline workflow state.
//!
//! `KeyedStore` only knows about JSON values; everything here is the
//! boundary where a raw `serde_json::Value` becomes a `PipelineState`, and
//! where a `pipeline_id` composite key is built and parsed.

use crate::error::RuntimeError;
use crate::step_registry::StepRegistry;
use pipulate_core::{Clock, IdGen, PipelineState, ShortId};
use pipulate_storage::KeyedStore;
use std::sync::Arc;

const PIPELINE_PREFIX: &str = "pipeline:";
/// Hard-coded single profile. Multi-profile/multi-user is an explicit
/// non-goal; the `<profile>` segment is kept in the key format for
/// compatibility with the original composite-key shape.
const DEFAULT_PROFILE: &str = "default";

/// Typed view of a `KeyedStore` holding `PipelineState` records under the
/// `pipeline:` namespace.
pub struct PipelineStore {
    store: Arc<KeyedStore>,
    clock: Arc<dyn Clock>,
    id_gen: Arc<dyn PipelineIdGen>,
}

/// Object-safe wrapper so `PipelineStore` can hold a trait object `IdGen`
/// without the associated-type machinery `IdGen` itself doesn't need.
pub trait PipelineIdGen: Send + Sync {
    fn next_user_part(&self) -> String;
}

impl<T: IdGen> PipelineIdGen for T {
    fn next_user_part(&self) -> String {
        self.next().short(8).to_string()
    }
}

impl PipelineStore {
    pub fn new(store: Arc<KeyedStore>, clock: Arc<dyn Clock>, id_gen: Arc<dyn PipelineIdGen>) -> Self {
        Self {
            store,
            clock,
            id_gen,
        }
    }

    fn key_for(pipeline_id: &str) -> String {
        format!("{PIPELINE_PREFIX}{pipeline_id}")
    }

    /// Build `(full_key, prefix, user_part)` for a brand new pipeline under
    /// `app_name`.
    pub fn generate_pipeline_key(&self, app_name: &str) -> (String, String, String) {
        let prefix = format!("{DEFAULT_PROFILE}-{app_name}-");
        let user_part = self.id_gen.next_user_part();
        (format!("{prefix}{user_part}"), prefix, user_part)
    }

    /// Split a full `pipeline_id` into `(profile, plugin, user_part)`.
    pub fn parse_pipeline_key(full: &str) -> Result<(String, String, String), RuntimeError> {
        let mut parts = full.splitn(3, '-');
        let profile = parts.next();
        let plugin = parts.next();
        let user_part = parts.next();
        match (profile, plugin, user_part) {
            (Some(p), Some(pl), Some(u)) if !p.is_empty() && !pl.is_empty() && !u.is_empty() => {
                Ok((p.to_string(), pl.to_string(), u.to_string()))
            }
            _ => Err(RuntimeError::ValidationError(format!(
                "pipeline key '{full}' is not of the form <profile>-<plugin>-<user_part>"
            ))),
        }
    }

    pub fn read(&self, pipeline_id: &str) -> Option<PipelineState> {
        let value = self.store.get(&Self::key_for(pipeline_id))?;
        serde_json::from_value(value).ok()
    }

    pub fn write(&self, state: &mut PipelineState) -> Result<(), RuntimeError> {
        state.updated = self.clock.now();
        let value = serde_json::to_value(&*state)?;
        self.store
            .set(&Self::key_for(&state.pipeline_id), value)
            .map_err(RuntimeError::StorageUnavailable)
    }

    /// Create a fresh `PipelineState` keyed by `pipeline_id` iff one is not
    /// already present. If a pipeline exists under a different `app_name`,
    /// that's a `PipelineConflict` (the key was reused across workflows).
    pub fn initialize_if_missing(
        &self,
        pipeline_id: &str,
        app_name: &str,
    ) -> Result<(PipelineState, bool), RuntimeError> {
        if let Some(existing) = self.read(pipeline_id) {
            if existing.app_name != app_name {
                return Err(RuntimeError::PipelineConflict {
                    key: pipeline_id.to_string(),
                    existing_app: existing.app_name,
                    requested_app: app_name.to_string(),
                });
            }
            return Ok((existing, false));
        }

        let mut state = PipelineState::new(pipeline_id, app_name, self.clock.now());
        self.write(&mut state)?;
        Ok((state, true))
    }

    /// List every pipeline key belonging to `app_name`, for the landing
    /// page's resume datalist.
    pub fn list_keys(&self, app_name: &str) -> Vec<String> {
        let prefix = format!("{PIPELINE_PREFIX}{DEFAULT_PROFILE}-{app_name}-");
        self.store
            .iter_prefix(&prefix)
            .into_iter()
            .map(|(key, _)| key.trim_start_matches(PIPELINE_PREFIX).to_string())
            .collect()
    }

    pub fn get_step_data(&self, pipeline_id: &str, step_id: &str) -> Option<serde_json::Value> {
        let state = self.read(pipeline_id)?;
        state.steps.get(step_id).map(|s| serde_json::Value::Object(s.clone()))
    }

    /// Set `state[step_id][done_field] = value`, clear a matching
    /// `_revert_target`, and persist.
    pub fn set_step_data(
        &self,
        pipeline_id: &str,
        step_id: &str,
        done_field: &str,
        value: serde_json::Value,
    ) -> Result<PipelineState, RuntimeError> {
        let mut state = self
            .read(pipeline_id)
            .ok_or_else(|| RuntimeError::PipelineNotFound(pipeline_id.to_string()))?;

        let entry = state.steps.entry(step_id.to_string()).or_default();
        entry.insert(done_field.to_string(), value);

        if state.revert_target.as_deref() == Some(step_id) {
            state.revert_target = None;
        }

        self.write(&mut state)?;
        Ok(state)
    }

    /// Delete `state[s.id]` for every step at or after `step_id` (exclusive
    /// of `finalize` - finalize is unset separately by unfinalize).
    pub fn clear_steps_from(
        &self,
        pipeline_id: &str,
        step_id: &str,
        steps: &StepRegistry,
    ) -> Result<PipelineState, RuntimeError> {
        let mut state = self
            .read(pipeline_id)
            .ok_or_else(|| RuntimeError::PipelineNotFound(pipeline_id.to_string()))?;

        let pos = steps
            .position(step_id)
            .ok_or_else(|| RuntimeError::StepNotFound(step_id.to_string()))?;

        for step in steps.steps().iter().skip(pos) {
            if step.is_finalize() {
                continue;
            }
            state.steps.remove(step.id.as_str());
        }

        self.write(&mut state)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipulate_core::SystemClock;
    use pipulate_core::id::SequentialIdGen;
    use tempfile::tempdir;

    fn make_store() -> PipelineStore {
        let dir = tempdir().expect("tempdir");
        let keyed = Arc::new(KeyedStore::open(dir.path()).expect("open"));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let id_gen: Arc<dyn PipelineIdGen> = Arc::new(SequentialIdGen::new("hello"));
        PipelineStore::new(keyed, clock, id_gen)
    }

    #[test]
    fn parse_pipeline_key_round_trips_generated_key() {
        let store = make_store();
        let (full, _, user_part) = store.generate_pipeline_key("hello");
        let (profile, plugin, parsed_user_part) =
            PipelineStore::parse_pipeline_key(&full).expect("parse");
        assert_eq!(profile, "default");
        assert_eq!(plugin, "hello");
        assert_eq!(parsed_user_part, user_part);
    }

    #[test]
    fn initialize_if_missing_is_idempotent() {
        let store = make_store();
        let (state1, created1) = store.initialize_if_missing("default-hello-01", "hello").expect("init1");
        let (state2, created2) = store.initialize_if_missing("default-hello-01", "hello").expect("init2");
        assert!(created1);
        assert!(!created2);
        assert_eq!(state1.pipeline_id, state2.pipeline_id);
    }

    #[test]
    fn initialize_if_missing_rejects_app_name_conflict() {
        let store = make_store();
        store.initialize_if_missing("default-hello-01", "hello").expect("init");
        let err = store.initialize_if_missing("default-hello-01", "other").unwrap_err();
        assert!(matches!(err, RuntimeError::PipelineConflict { .. }));
    }

    #[test]
    fn set_step_data_clears_matching_revert_target() {
        let store = make_store();
        store.initialize_if_missing("default-hello-01", "hello").expect("init");
        let mut state = store.read("default-hello-01").expect("read");
        state.revert_target = Some("step_01".to_string());
        store.write(&mut state).expect("write");

        store
            .set_step_data("default-hello-01", "step_01", "name", serde_json::json!("Ada"))
            .expect("set");
        let state = store.read("default-hello-01").expect("read");
        assert!(state.revert_target.is_none());
        assert!(state.step_done("step_01", "name"));
    }
}
