// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracks how far the Reconciler has consumed a remote driver's delta
//! feed for one scope.
//!
//! A cursor must only be advanced after the page it describes has been
//! fully applied to [`MetaStore`](crate) — advancing first and applying
//! second would lose updates on crash between the two. Cursors are also
//! monotonic per scope: an update must never move backward.

use serde::{Deserialize, Serialize};

/// Opaque per-scope delta token as returned by the remote driver. Treated
/// as an uninterpreted string — only the driver knows how to compare or
/// advance it; `ChangeCursor` only records "this is the last token we
/// fully applied."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCursor {
    pub scope: String,
    pub token: String,
    pub updated_at_ms: u64,
}

impl ChangeCursor {
    pub fn new(scope: impl Into<String>, token: impl Into<String>, updated_at_ms: u64) -> Self {
        Self { scope: scope.into(), token: token.into(), updated_at_ms }
    }

    /// Replace the token. `updated_at_ms` must not move backward: returns
    /// `false` (no-op) if `now_ms` is older than the cursor's last update,
    /// which a caller should treat as a bug in the driver rather than
    /// silently reordering history.
    pub fn advance(&mut self, token: impl Into<String>, now_ms: u64) -> bool {
        if now_ms < self.updated_at_ms {
            return false;
        }
        self.token = token.into();
        self.updated_at_ms = now_ms;
        true
    }
}

#[cfg(test)]
#[path = "change_cursor_tests.rs"]
mod tests;
