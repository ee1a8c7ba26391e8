// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration, loaded from TOML with env override, following
//! the workspace's `state_dir()`/`Config::load()` convention.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Engine-wide configuration: sync root/remote root pairing, concurrency
/// limits, retry bounds, and poll interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Local directory materialized files are written under.
    pub sync_root: PathBuf,
    /// Remote root to sync from (driver-specific interpretation, e.g. a
    /// folder id or an empty string for "everything").
    #[serde(default)]
    pub remote_root: String,
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,
    #[serde(default)]
    pub delete_propagation: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Fire a desktop notification when a run completes (ambient UX,
    /// off by default for headless/daemon use).
    #[serde(default)]
    pub notify_on_completion: bool,
    /// Max attempts (including the first) for a retry-governed driver
    /// call before it's treated as permanently failed.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Base delay for the first retry; subsequent attempts back off
    /// exponentially from this, per [`crate::retry::backoff_delay`].
    #[serde(default = "default_retry_base_delay_secs")]
    pub retry_base_delay_secs: u64,
    /// Target file extension (no leading dot) per source MIME type, for
    /// materializing `Exported` items. A source MIME with no entry here
    /// falls back to the remote item's own extension, if any.
    #[serde(default)]
    pub export_formats: HashMap<String, String>,
}

fn default_max_concurrent_downloads() -> usize {
    4
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_secs() -> u64 {
    5
}

impl Config {
    /// Load configuration from `path`, falling back to built-in defaults
    /// for any field the file omits. `sync_root`/`remote_root` still must
    /// be present — there is no sensible default for what to sync.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Default state directory for daemon/WAL/snapshot files:
    /// `$XDG_STATE_HOME/sync` or `~/.local/state/sync`.
    pub fn state_dir() -> Result<PathBuf, ConfigError> {
        if let Some(xdg) = std::env::var_os("XDG_STATE_HOME") {
            return Ok(PathBuf::from(xdg).join("sync"));
        }
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|d| d.join("sync"))
            .ok_or(ConfigError::NoStateDir)
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct ConfigBuilder => Config {
        into { sync_root: PathBuf = PathBuf::from("/tmp/sync") }
        into { remote_root: String = "" }
        set { max_concurrent_downloads: usize = 4 }
        set { delete_propagation: bool = false }
        set { poll_interval_secs: u64 = 60 }
        set { notify_on_completion: bool = false }
        set { retry_attempts: u32 = 3 }
        set { retry_base_delay_secs: u64 = 5 }
        set { export_formats: HashMap<String, String> = HashMap::new() }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
