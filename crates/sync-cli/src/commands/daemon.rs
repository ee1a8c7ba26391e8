// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sync daemon` - daemon lifecycle commands

use crate::client::DaemonClient;
use anyhow::{anyhow, Result};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background if it isn't already running
    Start,
    /// Ask the running daemon to exit
    Stop,
}

pub async fn handle(command: DaemonCommand) -> Result<()> {
    match command {
        DaemonCommand::Start => start().await,
        DaemonCommand::Stop => stop().await,
    }
}

async fn start() -> Result<()> {
    if DaemonClient::connect().await.is_ok() {
        println!("Daemon already running");
        return Ok(());
    }

    DaemonClient::connect_or_start().await.map_err(|e| anyhow!("{}", e))?;
    println!("Daemon started");
    Ok(())
}

async fn stop() -> Result<()> {
    let mut client = match DaemonClient::connect().await {
        Ok(c) => c,
        Err(_) => {
            println!("Daemon not running");
            return Ok(());
        }
    };

    client.shutdown().await.map_err(|e| anyhow!("{}", e))?;
    println!("Daemon stopped");
    Ok(())
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
