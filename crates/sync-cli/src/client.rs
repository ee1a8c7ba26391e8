// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin IPC client over the daemon's Unix socket: one request/response
//! round trip per call, plus the long-lived streaming mode used by
//! `sync watch`.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use sync_wire::{read_event, read_response, write_request, ProtocolError, Request, Response};
use sync_wire::{FailedFileEntry, SyncEvent, SyncStatusSnapshot};
use tokio::net::UnixStream;
use tokio::time::sleep;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("daemon is not running")]
    NotRunning,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("daemon returned an error: {0}")]
    Daemon(String),
    #[error("unexpected response from daemon: {0:?}")]
    Unexpected(Response),
}

impl ClientError {
    pub fn is_not_running(&self) -> bool {
        matches!(self, ClientError::NotRunning)
    }
}

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    fn socket_path() -> Result<PathBuf, ClientError> {
        let state_dir = sync_core::Config::state_dir().map_err(|_| ClientError::NotRunning)?;
        Ok(state_dir.join("daemon.sock"))
    }

    /// Connect to an already-running daemon.
    pub async fn connect() -> Result<Self, ClientError> {
        let path = Self::socket_path()?;
        let stream = UnixStream::connect(&path).await.map_err(|_| ClientError::NotRunning)?;
        Ok(Self { stream })
    }

    /// Connect, spawning `syncd` in the background first if nothing is
    /// listening yet. Polls the socket for up to two seconds.
    pub async fn connect_or_start() -> Result<Self, ClientError> {
        if let Ok(client) = Self::connect().await {
            return Ok(client);
        }
        spawn_daemon()?;
        for _ in 0..20 {
            sleep(Duration::from_millis(100)).await;
            if let Ok(client) = Self::connect().await {
                return Ok(client);
            }
        }
        Err(ClientError::NotRunning)
    }

    async fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        write_request(&mut self.stream, request).await?;
        match read_response(&mut self.stream).await? {
            Response::Error { message } => Err(ClientError::Daemon(message)),
            response => Ok(response),
        }
    }

    pub async fn run(&mut self, is_resync: bool) -> Result<String, ClientError> {
        match self.send(&Request::Run { is_resync }).await? {
            Response::RunStarted { run_id } => Ok(run_id),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    pub async fn cancel(&mut self) -> Result<(), ClientError> {
        match self.send(&Request::Cancel).await? {
            Response::Ok => Ok(()),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    pub async fn status(&mut self) -> Result<SyncStatusSnapshot, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status(snapshot) => Ok(snapshot),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    pub async fn failed_files(&mut self) -> Result<Vec<FailedFileEntry>, ClientError> {
        match self.send(&Request::FailedFiles).await? {
            Response::FailedFiles(entries) => Ok(entries),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    pub async fn shutdown(&mut self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::Ok => Ok(()),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    /// Switch the connection to streaming mode. `on_event` is called for
    /// each event; return `false` to stop watching before the daemon
    /// closes the connection.
    pub async fn watch(
        mut self,
        mut on_event: impl FnMut(SyncEvent) -> bool,
    ) -> Result<(), ClientError> {
        write_request(&mut self.stream, &Request::Watch).await?;
        match read_response(&mut self.stream).await? {
            Response::Ok => {}
            other => return Err(ClientError::Unexpected(other)),
        }

        loop {
            let event = match read_event(&mut self.stream).await {
                Ok(event) => event,
                Err(ProtocolError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(())
                }
                Err(e) => return Err(e.into()),
            };
            if !on_event(event) {
                return Ok(());
            }
        }
    }
}

fn spawn_daemon() -> Result<(), ClientError> {
    Command::new(find_syncd_binary())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

/// Prefer a `syncd` binary next to the running `sync` binary (dev builds,
/// installed bundles) before falling back to `PATH`.
fn find_syncd_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("syncd");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("syncd")
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
