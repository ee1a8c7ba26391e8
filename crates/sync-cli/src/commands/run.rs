// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sync run` - trigger a sync run

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use anyhow::{anyhow, Result};

pub async fn handle(resync: bool, watch: bool, format: OutputFormat) -> Result<()> {
    let mut client = DaemonClient::connect_or_start().await.map_err(|e| anyhow!("{}", e))?;
    let run_id = client.run(resync).await.map_err(|e| anyhow!("{}", e))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "run_id": run_id }))?);
        }
        OutputFormat::Text => println!("Sync run started: {}", crate::color::header(&run_id)),
    }

    if watch {
        super::watch::handle(format).await?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
