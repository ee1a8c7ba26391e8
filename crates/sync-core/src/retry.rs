// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transient/permanent error classification and backoff scheduling,
//! using an attempt-counter + exponential-backoff-with-jitter scheme
//! common to drive-sync engines.

use crate::error::{DriverError, SyncError};
use std::time::Duration;

/// Maximum number of retry attempts for a transient failure before an
/// item is marked permanently failed.
pub const MAX_RETRY_ATTEMPTS: u32 = 5;

const BASE_DELAY_MS: u64 = 250;
const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` if `error` should be retried rather than surfaced as a
/// permanent item failure.
pub fn is_transient(error: &SyncError) -> bool {
    match error {
        SyncError::Driver(DriverError { transient, .. }) => *transient,
        SyncError::Io(io_err) => matches!(
            io_err.kind(),
            std::io::ErrorKind::Interrupted
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::WouldBlock
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
        ),
        SyncError::ChecksumMismatch { .. } => true,
        SyncError::PathGuard(_) | SyncError::Cancelled => false,
    }
}

/// Compute the delay before retry attempt number `attempt` (1-indexed).
///
/// Exponential backoff with full jitter: `rand(0, min(MAX, BASE * 2^attempt))`.
/// Jitter is derived from a caller-supplied seed rather than a global RNG so
/// the computation stays deterministic under test.
pub fn backoff_delay(attempt: u32, jitter_seed: u64) -> Duration {
    let exp = BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    let capped = exp.min(MAX_DELAY_MS);
    let jitter = jitter_seed % (capped + 1);
    Duration::from_millis(jitter)
}

/// Whether `attempt` (the attempt about to be made, 1-indexed) is still
/// within the retry budget.
pub fn attempts_remaining(attempt: u32) -> bool {
    attempt <= MAX_RETRY_ATTEMPTS
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
