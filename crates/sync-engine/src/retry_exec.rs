// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wraps a driver call with the transient/backoff policy from
//! [`sync_core::retry`], bounded by the attempt budget configured on
//! [`sync_core::Config`].

use std::future::Future;
use std::time::Duration;
use sync_core::{retry, DriverError, SyncError};

/// Run `op`, retrying a transient [`DriverError`] up to `max_attempts`
/// times (the first call counts as attempt 1). The wait before each
/// retry is `base_delay` plus [`retry::backoff_delay`]'s own jittered
/// exponential term, so a deployment-configured floor always applies on
/// top of the jitter. A permanent error, or a transient one past the
/// budget, is returned immediately.
pub async fn with_retry<T, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    jitter_seed: u64,
    mut op: F,
) -> Result<T, DriverError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DriverError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let classify =
                    SyncError::Driver(DriverError { message: err.message.clone(), transient: err.transient });
                if attempt >= max_attempts.max(1) || !retry::is_transient(&classify) {
                    return Err(err);
                }
                let jittered = retry::backoff_delay(attempt, jitter_seed.wrapping_add(attempt as u64));
                tokio::time::sleep(base_delay + jittered).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_exec_tests.rs"]
mod tests;
