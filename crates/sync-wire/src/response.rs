// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responses the daemon sends back over the IPC socket.

use crate::status::{FailedFileEntry, SyncStatusSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum Response {
    Ok,
    /// A run was accepted; carries the new run's id.
    RunStarted { run_id: String },
    Status(SyncStatusSnapshot),
    FailedFiles(Vec<FailedFileEntry>),
    Error { message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
