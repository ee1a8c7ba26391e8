// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering for status snapshots, failed-file listings, and the
//! `SyncEvent` stream, in text or JSON.

use clap::ValueEnum;
use sync_wire::{FailedFileEntry, SyncEvent, SyncStatusSnapshot};

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format a byte count the way a human would scan it in a terminal.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Format a timestamp as relative time (e.g. "5s ago", "2m ago").
pub fn format_time_ago(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "never".to_string();
    }
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let elapsed_secs = now_ms.saturating_sub(epoch_ms) / 1000;
    format!("{} ago", format_duration(elapsed_secs))
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

pub fn print_status(snapshot: &SyncStatusSnapshot, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(snapshot)?),
        OutputFormat::Text => {
            println!(
                "Last sync: {}",
                snapshot.last_sync_at_ms.map(format_time_ago).unwrap_or_else(|| "never".to_string())
            );
            println!(
                "Items: {} ({})",
                snapshot.total_items,
                crate::color::muted(&format_bytes(snapshot.total_size_bytes))
            );
            println!("Pending: {}", snapshot.pending_count);
            if snapshot.failed_count > 0 {
                println!(
                    "{}",
                    crate::color::header(&format!("Failed: {}", snapshot.failed_count))
                );
                println!("  Run `sync failed-files` for details");
            } else {
                println!("Failed: 0");
            }
        }
    }
    Ok(())
}

pub fn print_failed_files(entries: &[FailedFileEntry], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No failed files.");
                return Ok(());
            }
            for entry in entries {
                println!(
                    "{}  {} (attempt {}, {})",
                    crate::color::header(&entry.remote_path),
                    entry.error_message,
                    entry.attempt,
                    format_time_ago(entry.failed_at_ms),
                );
            }
        }
    }
    Ok(())
}

/// Render one line per `SyncEvent` for `sync watch`'s text mode. Returns
/// `true` while the run is still in progress, `false` once it reaches a
/// terminal event (`Completed`/`Failed`).
pub fn print_event_line(event: &SyncEvent) -> bool {
    match event {
        SyncEvent::Started { run_id, .. } => {
            println!("{} run {}", crate::color::header("started"), run_id);
            true
        }
        SyncEvent::DiscoveringFiles { files_found } => {
            println!("discovering files... {files_found} found so far");
            true
        }
        SyncEvent::FileQueued { remote_path, .. } => {
            println!("  queued    {remote_path}");
            true
        }
        SyncEvent::FileDownloading { remote_path, .. } => {
            println!("  ↓ {remote_path}");
            true
        }
        SyncEvent::FileCompleted { remote_path, .. } => {
            println!("  ✓ {remote_path}");
            true
        }
        SyncEvent::FileFailed { remote_path, error, .. } => {
            println!("  ✗ {remote_path}: {error}");
            true
        }
        SyncEvent::Progress { files_processed, total_files, bytes_downloaded } => {
            println!(
                "progress: {files_processed}/{total_files} files, {}",
                format_bytes(*bytes_downloaded)
            );
            true
        }
        SyncEvent::Completed { files_processed, bytes_downloaded, failed_files, duration_ms } => {
            println!(
                "{} {} files ({}) in {}, {} failed",
                crate::color::header("completed"),
                files_processed,
                format_bytes(*bytes_downloaded),
                format_duration(duration_ms / 1000),
                failed_files,
            );
            false
        }
        SyncEvent::Failed { error } => {
            println!("{} {error}", crate::color::header("failed"));
            false
        }
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
