// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crate-wide error taxonomy shared by every sync component.

use thiserror::Error;

/// Top-level error returned by sync operations that can cross component
/// boundaries (reconciliation, download, materialization).
///
/// `RetryPolicy::is_transient` classifies variants of this type; see
/// [`crate::retry`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote driver error: {0}")]
    Driver(#[from] DriverError),

    #[error(transparent)]
    PathGuard(#[from] PathGuardError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("operation cancelled")]
    Cancelled,
}

/// Errors surfaced by a [`crate::config::Config`] load.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("io error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors from the remote driver boundary (§6.1). Carries a `transient`
/// flag set by the driver implementation so `RetryPolicy` does not need
/// to special-case every possible transport (HTTP status codes, DNS
/// failures, etc.) — the driver is in the best position to know whether
/// a given failure is worth retrying.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
    pub transient: bool,
}

impl DriverError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { message: message.into(), transient: true }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self { message: message.into(), transient: false }
    }
}

/// Errors from [`crate::path_guard`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathGuardError {
    #[error("empty path segment in remote path {0:?}")]
    EmptySegment(String),

    #[error("path traversal segment in remote path {0:?}")]
    Traversal(String),

    #[error("path contains NUL byte: {0:?}")]
    NulByte(String),

    #[error("resolved path {0} escapes sync root {1}")]
    Escapes(std::path::PathBuf, std::path::PathBuf),

    #[error("symlink ancestor {0} redirects outside sync root")]
    SymlinkEscape(std::path::PathBuf),
}
