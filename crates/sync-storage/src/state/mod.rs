// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay.

mod helpers;

use crate::event::StorageEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sync_core::{ChangeCursor, Item, ItemId, RunId, SyncRun};

/// Current view of every tracked item, run, and delta cursor, derived
/// entirely from replaying [`StorageEvent`]s in order.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub items: HashMap<ItemId, Item>,
    pub runs: HashMap<RunId, SyncRun>,
    /// Delta cursor per scope (e.g. a remote folder id, or "" for the
    /// whole remote root).
    pub cursors: HashMap<String, ChangeCursor>,
}

impl MaterializedState {
    /// Get an item by ID or unique prefix (a short id a user typed at a
    /// CLI prompt, missing the type tag).
    pub fn get_item(&self, id: &str) -> Option<&Item> {
        helpers::find_by_prefix(&self.items, id)
    }

    pub fn get_run(&self, id: &str) -> Option<&SyncRun> {
        helpers::find_by_prefix(&self.runs, id)
    }

    pub fn cursor(&self, scope: &str) -> Option<&ChangeCursor> {
        self.cursors.get(scope)
    }

    /// Apply an event to derive state changes.
    ///
    /// State is never mutated directly outside of this function: every
    /// change to `items`/`runs`/`cursors` is the result of replaying an
    /// event, whether that event was just produced or is being replayed
    /// from the WAL after a crash. Every handler here MUST be
    /// idempotent — applying the same event twice must leave the state
    /// identical to applying it once, since recovery replays events that
    /// may already have been applied before a crash.
    pub fn apply_event(&mut self, event: &StorageEvent) {
        match event {
            StorageEvent::ItemUpserted { item } => {
                self.items.insert(item.id.clone(), item.clone());
            }
            StorageEvent::ItemStateChanged { id, state, updated_at_ms } => {
                if let Some(item) = self.items.get_mut(id) {
                    item.sync_state = state.clone();
                    item.updated_at_ms = *updated_at_ms;
                }
            }
            StorageEvent::ItemDeleted { id } => {
                self.items.remove(id);
            }
            StorageEvent::RunCreated { run } => {
                self.runs.entry(run.id.clone()).or_insert_with(|| run.clone());
            }
            StorageEvent::RunProgressed { id, progress } => {
                if let Some(run) = self.runs.get_mut(id) {
                    run.progress = *progress;
                }
            }
            StorageEvent::RunFinished { id, status } => {
                if let Some(run) = self.runs.get_mut(id) {
                    if !run.status.is_terminal() {
                        run.status = status.clone();
                    }
                }
            }
            StorageEvent::CursorAdvanced { cursor } => {
                let slot = self
                    .cursors
                    .entry(cursor.scope.clone())
                    .or_insert_with(|| cursor.clone());
                if cursor.updated_at_ms >= slot.updated_at_ms {
                    *slot = cursor.clone();
                }
            }
            StorageEvent::Shutdown => {}
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
