// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! The Host Adapter layer: turns `WorkflowRuntime` render results into HTTP
//! responses. `axum_adapter` is the production implementation; `fake` is a
//! socket-free stand-in for tests.

pub mod axum_adapter;
mod html;
pub mod host;
pub mod render;

pub use axum_adapter::{build_router, AppState, AxumHostAdapter};
pub use host::HostAdapter;
pub use render::{render_fragment, RenderedFragment};

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHostAdapter;
