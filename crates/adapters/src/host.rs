// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Host Adapter seam: anything that can turn a [`StepRender`] into a
//! response surface implements this. Mirrors the adapter-trait-plus-backends
//! idiom used elsewhere for session/agent backends - one trait, a real
//! implementation, and a fake for tests that never opens a socket.

use pipulate_engine::{StepRender, Workflow};

use crate::render::RenderedFragment;

pub trait HostAdapter: Send + Sync {
    /// Turn a runtime render result into a fragment the host can return to
    /// the caller (an HTTP response body, or a recorded value in tests).
    /// `pipeline_id` is threaded through explicitly so every loader/form the
    /// fragment embeds carries it on the wire.
    fn render(
        &self,
        app_name: &str,
        pipeline_id: &str,
        workflow: &dyn Workflow,
        step_render: &StepRender,
    ) -> RenderedFragment;
}
