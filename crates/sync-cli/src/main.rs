// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sync`: CLI for the cloud-drive sync daemon. Talks to `syncd` over its
//! Unix socket; never touches the WAL or materialized state directly.

mod client;
mod color;
mod commands;
mod output;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "sync", version, about = "Cloud-drive sync client", styles = color::styles())]
struct Cli {
    /// Output format
    #[arg(long, value_enum, global = true, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a sync run
    Run {
        /// Clear tracked state first and force a full re-listing
        #[arg(long)]
        resync: bool,
        /// Stream progress until the run finishes
        #[arg(long)]
        watch: bool,
    },
    /// Show the current sync status
    Status,
    /// List items that exhausted their retry budget
    FailedFiles,
    /// Attach to the live event stream of whatever run is in progress
    Watch,
    /// Manage the daemon process
    Daemon {
        #[command(subcommand)]
        command: commands::daemon::DaemonCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { resync, watch } => commands::run::handle(resync, watch, cli.output).await,
        Command::Status => commands::status::handle(cli.output).await,
        Command::FailedFiles => commands::failed_files::handle(cli.output).await,
        Command::Watch => commands::watch::handle(cli.output).await,
        Command::Daemon { command } => commands::daemon::handle(command).await,
    }
}
