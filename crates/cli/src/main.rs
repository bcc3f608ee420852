// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod commands;
mod error;
mod paths;

use clap::{Parser, Subcommand};

/// `pipulate`: the tool invocation surface §6 requires - reboot the server
/// and append to the AI keychain.
#[derive(Parser)]
#[command(name = "pipulate", about = "Pipulate workflow engine CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Signal a running pipulate-server process to shut down.
    Reboot,
    /// Durable AI-keychain operations.
    Keychain {
        #[command(subcommand)]
        action: KeychainCommand,
    },
}

#[derive(Subcommand)]
enum KeychainCommand {
    /// Upsert a key/value fact.
    Set { key: String, value: String },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Reboot => commands::reboot::run().map_err(anyhow::Error::from),
        Commands::Keychain {
            action: KeychainCommand::Set { key, value },
        } => commands::keychain::set(&key, &value).map_err(anyhow::Error::from),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
