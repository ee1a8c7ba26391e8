// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of [`StorageEvent`]s.
//!
//! Every event MetaStore applies first lands here, synchronously
//! appended and periodically flushed. Recovery replays whatever the
//! last [`crate::snapshot::Snapshot`] didn't cover by reading the tail
//! of this file. A WAL is never a hard source of truth on its own: it
//! is trusted only up to the first line that fails to parse. Everything
//! from that point to EOF is treated the same as a clean end-of-file —
//! never a reason to refuse to start — and is quarantined into a
//! rotating `.bak` file so an operator can inspect what was lost.

use crate::event::StorageEvent;
use serde::{Deserialize, Serialize};
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Flush threshold: once this many entries are buffered unflushed, the
/// caller should stop batching and call [`Wal::flush`].
const FLUSH_THRESHOLD: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum WalError {
    #[error("wal io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wal encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One persisted WAL record: a sequence number and the event it carries.
/// Sequence numbers are assigned by [`Wal::append`] and are strictly
/// increasing, with no gaps, starting at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: StorageEvent,
}

/// An append-only, newline-delimited JSON log of [`StorageEvent`]s.
pub struct Wal {
    path: PathBuf,
    write_seq: u64,
    processed_seq: u64,
    /// Entries with `seq > processed_seq` that [`Wal::next_unprocessed`]
    /// has not yet handed out. Populated at [`Wal::open`] from whatever
    /// the file held beyond the caller's processed-seq floor, and grown
    /// by every subsequent [`Wal::append`] — independent of whether
    /// those entries have been flushed to disk yet.
    pending: std::collections::VecDeque<WalEntry>,
    /// Entries appended since the last [`Wal::flush`].
    unflushed: Vec<WalEntry>,
}

impl Wal {
    /// Open (creating if necessary) the WAL at `path`. `processed_seq_floor`
    /// is typically the `seq` recorded in the last loaded snapshot: entries
    /// at or below it are assumed already applied and are excluded from
    /// [`Wal::next_unprocessed`] (though they remain visible to
    /// [`Wal::entries_after`]).
    pub fn open(path: &Path, processed_seq_floor: u64) -> Result<Self, WalError> {
        if !path.exists() {
            std::fs::File::create(path)?;
            return Ok(Self {
                path: path.to_path_buf(),
                write_seq: 0,
                processed_seq: processed_seq_floor,
                pending: std::collections::VecDeque::new(),
                unflushed: Vec::new(),
            });
        }

        let raw = std::fs::read(path)?;
        let (entries, corrupted) = parse_entries(&raw);
        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0);

        if corrupted {
            rotate_bak(path, &raw)?;
            rewrite_clean(path, &entries)?;
        }

        let pending = entries
            .into_iter()
            .filter(|e| e.seq > processed_seq_floor)
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            write_seq,
            processed_seq: processed_seq_floor,
            pending,
            unflushed: Vec::new(),
        })
    }

    /// Append `event`, assigning it the next sequence number. Buffered in
    /// memory until [`Wal::flush`] — callers that need durability before
    /// acknowledging a caller must flush explicitly.
    pub fn append(&mut self, event: &StorageEvent) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        self.write_seq = seq;
        let entry = WalEntry { seq, event: event.clone() };
        self.pending.push_back(entry.clone());
        self.unflushed.push(entry);
        Ok(seq)
    }

    /// Write buffered entries to disk and fsync.
    pub fn flush(&mut self) -> Result<(), WalError> {
        if self.unflushed.is_empty() {
            return Ok(());
        }
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        for entry in &self.unflushed {
            writeln!(file, "{}", serde_json::to_string(entry)?)?;
        }
        file.sync_all()?;
        self.unflushed.clear();
        Ok(())
    }

    /// Whether enough entries are buffered that the caller should flush.
    pub fn needs_flush(&self) -> bool {
        self.unflushed.len() >= FLUSH_THRESHOLD
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Record that everything up to and including `seq` has been applied
    /// to the materialized state. Monotonic: a smaller `seq` is ignored.
    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    /// Pop the next entry past `processed_seq` that hasn't been handed
    /// out yet, in seq order. Returns `None` when the in-memory queue is
    /// drained — this is not necessarily end-of-file, since entries
    /// written to the file by something other than this `Wal` handle
    /// (or corruption) are never added to the queue.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        Ok(self.pending.pop_front())
    }

    /// Read every valid entry in the file with `seq > after_seq`, in
    /// order, stopping at the first line that fails to parse.
    pub fn entries_after(&self, after_seq: u64) -> Result<Vec<WalEntry>, WalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read(&self.path)?;
        let (entries, _corrupted) = parse_entries(&raw);
        Ok(entries.into_iter().filter(|e| e.seq > after_seq).collect())
    }

    /// Rewrite the file to drop every entry with `seq < seq`, keeping the
    /// rest. Used after a snapshot checkpoint to bound WAL growth.
    pub fn truncate_before(&mut self, seq: u64) -> Result<(), WalError> {
        let raw = std::fs::read(&self.path)?;
        let (entries, _corrupted) = parse_entries(&raw);
        let kept: Vec<_> = entries.into_iter().filter(|e| e.seq >= seq).collect();
        rewrite_clean(&self.path, &kept)
    }
}

/// Parse newline-delimited JSON entries, stopping at the first line that
/// isn't valid UTF-8 or doesn't deserialize. Returns the entries
/// successfully parsed and whether parsing stopped early (vs. hitting a
/// clean EOF).
fn parse_entries(raw: &[u8]) -> (Vec<WalEntry>, bool) {
    let mut entries = Vec::new();
    for line in raw.split(|&b| b == b'\n') {
        if line.is_empty() {
            continue;
        }
        let Ok(text) = std::str::from_utf8(line) else {
            return (entries, true);
        };
        let Ok(entry) = serde_json::from_str::<WalEntry>(text) else {
            return (entries, true);
        };
        entries.push(entry);
    }
    (entries, false)
}

/// Quarantine the current (corrupt) file contents, keeping at most 3
/// rotations: `.bak` is the most recent, `.bak.3` the oldest.
fn rotate_bak(path: &Path, original_bytes: &[u8]) -> std::io::Result<()> {
    let target = crate::snapshot::rotate_bak_path(path);
    std::fs::write(target, original_bytes)
}

fn rewrite_clean(path: &Path, entries: &[WalEntry]) -> Result<(), WalError> {
    let mut file = std::fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
    for entry in entries {
        writeln!(file, "{}", serde_json::to_string(entry)?)?;
    }
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
