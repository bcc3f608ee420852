//! Behavioral specifications for Pipulate.
//!
//! Workflow and conversation specs drive the real axum router / storage
//! types in-process (`tower::ServiceExt::oneshot`, no subprocess). CLI
//! specs are black-box: they invoke the `pipulate` binary and check
//! stdout/stderr/exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/workflow/s1_two_step_completion.rs"]
mod workflow_s1_two_step_completion;
#[path = "specs/workflow/s2_revert_clears_downstream.rs"]
mod workflow_s2_revert_clears_downstream;
#[path = "specs/workflow/s3_finalize_blocks_mutation.rs"]
mod workflow_s3_finalize_blocks_mutation;

#[path = "specs/conversation/s4_survives_restart.rs"]
mod conversation_s4_survives_restart;
#[path = "specs/conversation/s5_dedup.rs"]
mod conversation_s5_dedup;

#[path = "specs/backup/s6_son_father_grandfather.rs"]
mod backup_s6_son_father_grandfather;
#[path = "specs/backup/s7_restore_preserves_newer.rs"]
mod backup_s7_restore_preserves_newer;

#[path = "specs/cli/help.rs"]
mod cli_help;
#[path = "specs/cli/keychain.rs"]
mod cli_keychain;
#[path = "specs/cli/reboot.rs"]
mod cli_reboot;
