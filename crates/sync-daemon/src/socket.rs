// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix socket accept loop and per-connection request dispatch.

use crate::lifecycle::{trigger_run, DaemonState};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use sync_core::Clock;
use sync_engine::RemoteDriver;
use sync_wire::{read_request, write_event, write_response, FailedFileEntry, ProtocolError, Request, Response, SyncStatusSnapshot};
use tokio::net::{UnixListener, UnixStream};
use tracing::{error, info, warn};

/// Accept connections until told to stop, spawning one task per
/// connection so a slow `Watch` subscriber never blocks new clients.
pub async fn serve<D, C, N>(listener: UnixListener, daemon: Arc<DaemonState<D, C, N>>)
where
    D: RemoteDriver + 'static,
    C: Clock + 'static,
    N: sync_adapters::NotifyAdapter + 'static,
{
    loop {
        if daemon.shutting_down.load(Ordering::SeqCst) {
            return;
        }
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let daemon = Arc::clone(&daemon);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, daemon).await {
                        warn!("connection handler error: {e}");
                    }
                });
            }
            Err(e) => {
                error!("failed to accept connection: {e}");
            }
        }
    }
}

async fn handle_connection<D, C, N>(
    mut stream: UnixStream,
    daemon: Arc<DaemonState<D, C, N>>,
) -> Result<(), ProtocolError>
where
    D: RemoteDriver,
    C: Clock,
    N: sync_adapters::NotifyAdapter,
{
    loop {
        let request = match read_request(&mut stream).await {
            Ok(request) => request,
            Err(ProtocolError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => {
                warn!("failed to read request: {e}");
                return Ok(());
            }
        };

        match request {
            Request::Run { is_resync } => {
                let response = match trigger_run(&daemon, is_resync).await {
                    Ok(run_id) => Response::RunStarted { run_id: run_id.to_string() },
                    Err(message) => Response::Error { message },
                };
                write_response(&mut stream, &response).await?;
            }
            Request::Cancel => {
                daemon.cancel.store(true, Ordering::SeqCst);
                write_response(&mut stream, &Response::Ok).await?;
            }
            Request::Status => {
                let snapshot = status_snapshot(&daemon);
                write_response(&mut stream, &Response::Status(snapshot)).await?;
            }
            Request::FailedFiles => {
                let entries = failed_files(&daemon);
                write_response(&mut stream, &Response::FailedFiles(entries)).await?;
            }
            Request::Watch => {
                write_response(&mut stream, &Response::Ok).await?;
                return watch(&mut stream, &daemon).await;
            }
            Request::Shutdown => {
                write_response(&mut stream, &Response::Ok).await?;
                daemon.shutting_down.store(true, Ordering::SeqCst);
                info!("shutdown requested over ipc");
                return Ok(());
            }
        }
    }
}

/// Stream `SyncEvent`s to a `Watch` subscriber until it disconnects.
/// Events dropped due to broadcast lag are simply skipped — a watcher
/// is a live tail, not a durable log.
async fn watch<D, C, N>(stream: &mut UnixStream, daemon: &Arc<DaemonState<D, C, N>>) -> Result<(), ProtocolError>
where
    D: RemoteDriver,
    C: Clock,
    N: sync_adapters::NotifyAdapter,
{
    let mut rx = daemon.events_tx.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => write_event(stream, &event).await?,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "watch subscriber lagged, dropping skipped events");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

fn status_snapshot<D, C, N>(daemon: &DaemonState<D, C, N>) -> SyncStatusSnapshot
where
    D: RemoteDriver,
    C: Clock,
    N: sync_adapters::NotifyAdapter,
{
    let state = daemon.state.lock();
    let mut total_items = 0u64;
    let mut total_size_bytes = 0u64;
    let mut pending_count = 0u64;
    let mut failed_count = 0u64;

    for item in state.items.values() {
        total_items += 1;
        total_size_bytes += item.size_bytes;
        match &item.sync_state {
            sync_core::SyncState::Pending | sync_core::SyncState::Downloading { .. } => pending_count += 1,
            sync_core::SyncState::Error { .. } => failed_count += 1,
            sync_core::SyncState::Complete { .. } => {}
        }
    }

    let last_sync_at_ms = state
        .runs
        .values()
        .filter_map(|run| match &run.status {
            sync_core::RunStatus::Completed { completed_at_ms } => Some(*completed_at_ms),
            _ => None,
        })
        .max();

    SyncStatusSnapshot { last_sync_at_ms, total_items, total_size_bytes, pending_count, failed_count }
}

fn failed_files<D, C, N>(daemon: &DaemonState<D, C, N>) -> Vec<FailedFileEntry>
where
    D: RemoteDriver,
    C: Clock,
    N: sync_adapters::NotifyAdapter,
{
    let state = daemon.state.lock();
    state
        .items
        .values()
        .filter_map(|item| match &item.sync_state {
            sync_core::SyncState::Error { message, failed_at_ms, attempt } => Some(FailedFileEntry {
                remote_id: item.remote_id.clone(),
                remote_path: item.remote_path.clone(),
                error_message: message.clone(),
                failed_at_ms: *failed_at_ms,
                attempt: *attempt,
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
