// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use pipulate_core::PipulateConfig;
use pipulate_server::{app, backup_task, paths};
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const BACKUP_SWEEP_PERIOD: Duration = Duration::from_secs(300);

fn print_help() {
    println!("pipulate-server - the Pipulate workflow HTTP server");
    println!();
    println!("USAGE:");
    println!("    pipulate-server [--version | --help]");
    println!();
    println!("ENVIRONMENT:");
    println!("    PIPULATE_STATE_DIR     override the state directory (default: <home>/.pipulate)");
    println!("    PIPULATE_BIND          override the listen address (default: {DEFAULT_BIND})");
    println!("    PIPULATE_BACKUP_ROOT, PIPULATE_MAX_MESSAGES, PIPULATE_SESSION_ID,");
    println!("    PIPULATE_PRESERVE_REFILL  see PipulateConfig (§6)");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }
    if args.iter().any(|a| a == "--version") {
        println!("pipulate-server {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PipulateConfig::load(&paths::config_file_path())?;
    std::fs::create_dir_all(paths::state_dir())?;

    let application = app::build(&config, &paths::keyed_store_dir(), &paths::conversation_db_path())?;

    write_pid_file()?;

    let backup_handle = backup_task::spawn(
        application.backup_manager,
        application.conversation_backup,
        paths::state_dir().join("app.db"),
        paths::state_dir().join("keychain.db"),
        BACKUP_SWEEP_PERIOD,
    );

    let bind = std::env::var("PIPULATE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "pipulate-server listening");

    axum::serve(listener, application.router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    backup_handle.abort();
    let _ = application.keyed_store.checkpoint();
    remove_pid_file();

    Ok(())
}

fn write_pid_file() -> anyhow::Result<()> {
    std::fs::write(paths::pid_file_path(), std::process::id().to_string())?;
    Ok(())
}

fn remove_pid_file() {
    let _ = std::fs::remove_file(paths::pid_file_path());
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
