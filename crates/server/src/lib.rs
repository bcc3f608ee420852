// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Process wiring for the Pipulate HTTP server: loads `PipulateConfig`,
//! opens every durable store, builds the axum router, and runs the
//! periodic backup sweep. The binary entrypoint is a thin layer on top of
//! [`app::build`].

pub mod app;
pub mod backup_task;
pub mod paths;

pub use app::Application;
