// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sync watch` - attach to the live `SyncEvent` stream

use crate::client::DaemonClient;
use crate::output::{print_event_line, OutputFormat};
use anyhow::{anyhow, Result};

pub async fn handle(format: OutputFormat) -> Result<()> {
    let client = DaemonClient::connect().await.map_err(|e| anyhow!("{}", e))?;

    client
        .watch(move |event| match format {
            OutputFormat::Json => {
                if let Ok(line) = serde_json::to_string(&event) {
                    println!("{line}");
                }
                !matches!(
                    event,
                    sync_wire::SyncEvent::Completed { .. } | sync_wire::SyncEvent::Failed { .. }
                )
            }
            OutputFormat::Text => print_event_line(&event),
        })
        .await
        .map_err(|e| anyhow!("{}", e))
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
