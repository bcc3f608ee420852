// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pipulate reboot`: signal a running server process to shut down cleanly,
//! so a test harness can restart against fresh state.

use crate::error::CliError;
use crate::paths;

pub fn run() -> Result<(), CliError> {
    let pid_path = paths::pid_file_path();
    let pid_text = std::fs::read_to_string(&pid_path).map_err(|_| CliError::ServerNotRunning(pid_path.clone()))?;
    let pid: u32 = pid_text
        .trim()
        .parse()
        .map_err(|_| CliError::ServerNotRunning(pid_path.clone()))?;

    let status = std::process::Command::new("kill")
        .arg("-TERM")
        .arg(pid.to_string())
        .status()
        .map_err(|source| CliError::SignalFailed { pid, source })?;

    if !status.success() {
        return Err(CliError::SignalFailed {
            pid,
            source: std::io::Error::other(format!("kill exited with {status}")),
        });
    }

    println!("sent SIGTERM to pipulate-server (pid {pid})");
    Ok(())
}
