// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sync failed-files` - list items that exhausted their retry budget

use crate::client::DaemonClient;
use crate::output::{print_failed_files, OutputFormat};
use anyhow::Result;

pub async fn handle(format: OutputFormat) -> Result<()> {
    let mut client = match DaemonClient::connect().await {
        Ok(c) => c,
        Err(_) => {
            println!("Daemon is not running");
            return Ok(());
        }
    };

    let entries = client.failed_files().await?;
    print_failed_files(&entries, format)
}

#[cfg(test)]
#[path = "failed_files_tests.rs"]
mod tests;
