// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests a CLI client sends to the daemon over the IPC socket.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum Request {
    /// Start a sync run. `is_resync` clears tracked state first, forcing
    /// a full re-listing rather than an incremental one.
    Run { is_resync: bool },
    /// Cancel whatever run is currently in progress, if any.
    Cancel,
    /// A `getSyncStatus()`-style snapshot.
    Status,
    /// A `getFailedFiles()`-style listing.
    FailedFiles,
    /// Attach to the live `SyncEvent` stream. The daemon replies `Ok`
    /// then switches the connection to event framing until the client
    /// disconnects — no further `Request`s are read on this connection.
    Watch,
    /// Ask the daemon to exit after finishing any in-flight run.
    Shutdown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
