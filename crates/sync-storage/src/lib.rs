// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sync-storage: the event-sourced durability layer. A [`Wal`] is the
//! source of truth; [`MaterializedState`] is a cache rebuilt from it on
//! startup and kept current by [`MaterializedState::apply_event`] as
//! each [`StorageEvent`] lands. [`Checkpointer`]/[`load_snapshot`] let
//! startup skip most of the WAL by replaying only what's newer than the
//! last snapshot.

mod checkpoint;
mod event;
mod migration;
mod snapshot;
mod state;
mod wal;

pub use checkpoint::{CheckpointResult, Checkpointer};
pub use event::StorageEvent;
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry, WalError};

pub use checkpoint::load_snapshot;

#[cfg(test)]
pub(crate) use migration::MigrationError;
