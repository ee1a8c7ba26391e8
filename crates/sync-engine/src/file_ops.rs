// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name sanitization, path assembly, conflict suffixing, and the atomic
//! temp-then-rename materialization protocol every downloaded file goes
//! through before it is visible at its final path.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use sync_core::path_guard;
use sync_core::{ItemKind, PathGuardError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileOpsError {
    #[error(transparent)]
    PathGuard(#[from] PathGuardError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// Re-exported so callers don't need to reach into `sync_core` directly
/// for the two functions every materialization starts with.
pub fn sanitize(remote_path: &str) -> Result<Vec<String>, PathGuardError> {
    path_guard::sanitize(remote_path)
}

pub fn local_path_of(sync_root: &Path, remote_path: &str) -> Result<PathBuf, PathGuardError> {
    path_guard::local_path_of(sync_root, remote_path)
}

/// If `path` exists, return the first `base (N).ext` that does not,
/// trying N = 1, 2, … . `base` is the final segment sans its last
/// extension; `ext` is that last extension (possibly empty). A path that
/// does not yet exist is returned unchanged.
pub fn resolve_conflict(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str());

    for n in 1u32.. {
        let candidate_name = match ext {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        let candidate = parent.join(candidate_name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("u32 exhausted while resolving a naming conflict")
}

/// Max attempts for the write-then-verify step: the first write plus one
/// retry if the checksum comes back wrong.
const MAX_MATERIALIZE_ATTEMPTS: u32 = 2;

/// Materialize `data` at `dest`, verifying `expected_checksum` (if any)
/// before the write becomes visible.
///
/// Writes to a randomly-named temp sibling in `dest`'s parent directory
/// — never a name derived from `dest`, so a pre-placed symlink at the
/// predictable temp path can't be used to redirect the write — fsyncs
/// it, verifies the checksum, and only then renames into place. On a
/// checksum mismatch the whole write is retried once more before giving
/// up; any other I/O failure, or a second consecutive mismatch, leaves
/// `dest` untouched (whatever was there before, or nothing) and the temp
/// file removed.
///
/// Returns the sha256 hex digest actually written, so callers can record
/// it even when `expected_checksum` was `None`.
pub fn materialize(
    dest: &Path,
    data: &[u8],
    expected_checksum: Option<&str>,
) -> Result<String, FileOpsError> {
    materialize_from(dest, || data, expected_checksum)
}

/// Same as [`materialize`], but re-invokes `data_source` for each attempt
/// instead of reusing one fixed buffer. Production callers only ever
/// have one buffer in hand (`materialize` closes over it), but tests use
/// this to simulate a mismatch that clears up on the retried attempt.
fn materialize_from<'a>(
    dest: &Path,
    mut data_source: impl FnMut() -> &'a [u8],
    expected_checksum: Option<&str>,
) -> Result<String, FileOpsError> {
    let parent = dest.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "destination has no parent")
    })?;
    fs::create_dir_all(parent)?;

    let mut last_err = None;
    for attempt in 1..=MAX_MATERIALIZE_ATTEMPTS {
        let temp_path = parent.join(format!(".{}.download.tmp", nanoid::nanoid!(16)));
        match write_temp_and_verify(&temp_path, data_source(), expected_checksum) {
            Ok(digest) => {
                fs::rename(&temp_path, dest)?;
                return Ok(digest);
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                let retryable = matches!(e, FileOpsError::ChecksumMismatch { .. });
                last_err = Some(e);
                if !retryable || attempt == MAX_MATERIALIZE_ATTEMPTS {
                    break;
                }
                tracing::warn!(attempt, "checksum mismatch, retrying materialization once");
            }
        }
    }

    Err(last_err.expect("loop always runs at least once"))
}

fn write_temp_and_verify(
    temp_path: &Path,
    data: &[u8],
    expected_checksum: Option<&str>,
) -> Result<String, FileOpsError> {
    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    let digest = hex_sha256(data);
    if let Some(expected) = expected_checksum {
        if !expected.eq_ignore_ascii_case(&digest) {
            return Err(FileOpsError::ChecksumMismatch {
                expected: expected.to_string(),
                actual: digest,
            });
        }
    }
    Ok(digest)
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Ensure a directory exists at `path`. Folders are materialized before
/// files so a file's parent is always already there.
pub fn ensure_directory(path: &Path) -> Result<(), FileOpsError> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Remove whatever is at `path` regardless of `kind`, best-effort — used
/// when the Reconciler sees a removal signal and delete-propagation is
/// enabled.
pub fn remove(path: &Path, kind: ItemKind) -> Result<(), FileOpsError> {
    match kind {
        ItemKind::Folder => match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        },
        // Exported items are materialized as a plain file under a
        // converted extension; a shortcut is never materialized at all,
        // so removing one is always a no-op.
        ItemKind::File | ItemKind::Exported => match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        },
        ItemKind::Shortcut => Ok(()),
    }
}

#[cfg(test)]
#[path = "file_ops_tests.rs"]
mod tests;
