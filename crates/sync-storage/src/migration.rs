// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema version migration for on-disk snapshots.
//!
//! There is only one schema version so far. This module exists so a
//! future version bump has a home without reshaping [`crate::snapshot`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("snapshot version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

pub fn check_version(found: u32, supported: u32) -> Result<(), MigrationError> {
    if found > supported {
        return Err(MigrationError::UnsupportedVersion { found, supported });
    }
    Ok(())
}
