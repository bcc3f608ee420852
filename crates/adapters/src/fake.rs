// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `FakeHostAdapter`: records every fragment/trigger emitted, for
//! asserting chain-reaction properties against the real runtime without
//! booting a socket. Mirrors the fake-backend half of the
//! adapter-trait-plus-backends idiom used by [`crate::host::HostAdapter`].

use parking_lot::Mutex;
use pipulate_engine::{StepRender, Workflow};

use crate::host::HostAdapter;
use crate::render::{render_fragment, RenderedFragment};

#[derive(Default)]
pub struct FakeHostAdapter {
    recorded: Mutex<Vec<RenderedFragment>>,
}

impl FakeHostAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fragment rendered so far, in emission order.
    pub fn recorded(&self) -> Vec<RenderedFragment> {
        self.recorded.lock().clone()
    }

    pub fn last(&self) -> Option<RenderedFragment> {
        self.recorded.lock().last().cloned()
    }
}

impl HostAdapter for FakeHostAdapter {
    fn render(
        &self,
        app_name: &str,
        pipeline_id: &str,
        workflow: &dyn Workflow,
        step_render: &StepRender,
    ) -> RenderedFragment {
        let rendered = render_fragment(app_name, pipeline_id, workflow, step_render);
        self.recorded.lock().push(rendered.clone());
        rendered
    }
}
