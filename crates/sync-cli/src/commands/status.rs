// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sync status` - point-in-time snapshot of the sync store

use crate::client::DaemonClient;
use crate::output::{print_status, OutputFormat};
use anyhow::Result;

pub async fn handle(format: OutputFormat) -> Result<()> {
    let mut client = match DaemonClient::connect().await {
        Ok(c) => c,
        Err(_) => {
            println!("Daemon is not running");
            return Ok(());
        }
    };

    let snapshot = client.status().await?;
    print_status(&snapshot, format)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
