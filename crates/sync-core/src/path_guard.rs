// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote-path sanitation and local-path containment checks.
//!
//! Every path that reaches [`FileOps`](crate) has passed through here
//! first. A remote listing is untrusted input: a malicious or buggy
//! remote driver could hand back `../../etc/passwd` or a path that walks
//! through a symlink planted inside the sync root. Neither should ever
//! result in a write outside the configured sync root.

use crate::error::PathGuardError;
use std::path::{Component, Path, PathBuf};

/// Split a remote path into sanitized segments, rejecting anything that
/// could be used to escape the sync root.
///
/// Mirrors the "trim the leading slash before joining" defense used by
/// comparable drive-sync tools, but goes further: every segment is
/// checked individually so `a/../../b` is rejected even though the net
/// effect of naive joining might look harmless.
pub fn sanitize(remote_path: &str) -> Result<Vec<String>, PathGuardError> {
    if remote_path.contains('\0') {
        return Err(PathGuardError::NulByte(remote_path.to_string()));
    }

    let trimmed = remote_path.trim_start_matches('/');
    let mut segments = Vec::new();
    for raw in trimmed.split('/') {
        if raw.is_empty() || raw == "." {
            // Leading/trailing/doubled slashes collapse away silently;
            // an explicit "." component does too.
            if raw.is_empty() && segments.is_empty() && trimmed.is_empty() {
                return Err(PathGuardError::EmptySegment(remote_path.to_string()));
            }
            continue;
        }
        if raw == ".." {
            return Err(PathGuardError::Traversal(remote_path.to_string()));
        }
        segments.push(truncate_segment(raw));
    }

    if segments.is_empty() {
        return Err(PathGuardError::EmptySegment(remote_path.to_string()));
    }

    Ok(segments)
}

/// Maximum byte length for a single sanitized path segment, matching the
/// filename limit most local filesystems enforce.
const MAX_SEGMENT_BYTES: usize = 255;

/// Truncate `segment` to at most [`MAX_SEGMENT_BYTES`] bytes without
/// splitting a UTF-8 codepoint.
///
/// A naive `&segment[..255]` can panic or silently corrupt a multi-byte
/// character straddling the cut point; this walks codepoint boundaries
/// instead of byte offsets.
fn truncate_segment(segment: &str) -> String {
    if segment.len() <= MAX_SEGMENT_BYTES {
        return segment.to_string();
    }
    let mut end = 0;
    for (idx, ch) in segment.char_indices() {
        if idx + ch.len_utf8() > MAX_SEGMENT_BYTES {
            break;
        }
        end = idx + ch.len_utf8();
    }
    segment[..end].to_string()
}

/// Join sanitized segments onto `sync_root` and confirm the result is
/// still contained within it.
///
/// This does not touch the filesystem beyond the ancestor-symlink check
/// in [`assert_contained`]; callers materialize into the returned path.
pub fn local_path_of(sync_root: &Path, remote_path: &str) -> Result<PathBuf, PathGuardError> {
    let segments = sanitize(remote_path)?;
    let mut candidate = sync_root.to_path_buf();
    for segment in &segments {
        candidate.push(segment);
    }
    assert_contained(sync_root, &candidate)?;
    Ok(candidate)
}

/// Confirm `candidate` is contained within `sync_root`, including through
/// symlinks.
///
/// Neither path needs to exist yet: we canonicalize the longest existing
/// ancestor of `candidate` and confirm *that* is still inside
/// `sync_root` (also canonicalized). A symlink planted anywhere in the
/// existing ancestor chain that points outside the root is caught here,
/// before any directory is created or file written.
pub fn assert_contained(sync_root: &Path, candidate: &Path) -> Result<(), PathGuardError> {
    // Lexical check first: reject `Component::ParentDir` outright, even
    // though `sanitize` already should have stripped these — defense in
    // depth for any path constructed by a different caller.
    for component in candidate.components() {
        if matches!(component, Component::ParentDir) {
            return Err(PathGuardError::Traversal(candidate.display().to_string()));
        }
    }

    let root_real = sync_root
        .canonicalize()
        .map_err(|_| PathGuardError::Escapes(candidate.to_path_buf(), sync_root.to_path_buf()))?;

    let existing_ancestor = longest_existing_ancestor(candidate);
    if let Some(ancestor) = existing_ancestor {
        let ancestor_real = ancestor
            .canonicalize()
            .map_err(|_| PathGuardError::SymlinkEscape(ancestor.clone()))?;
        if !ancestor_real.starts_with(&root_real) {
            return Err(PathGuardError::SymlinkEscape(ancestor));
        }
    }

    // Lexical containment of the full (possibly not-yet-existing) path,
    // relative to the canonical root, catches the remaining case: no
    // ancestor exists yet but the path still resolves outside the root
    // once joined (shouldn't happen given `local_path_of`'s construction,
    // but a defensive check costs nothing).
    let lexical = root_real.join(candidate.strip_prefix(sync_root).unwrap_or(candidate));
    if !lexical.starts_with(&root_real) {
        return Err(PathGuardError::Escapes(candidate.to_path_buf(), sync_root.to_path_buf()));
    }

    Ok(())
}

fn longest_existing_ancestor(path: &Path) -> Option<PathBuf> {
    let mut current = path;
    loop {
        if current.exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => return None,
        }
    }
}

#[cfg(test)]
#[path = "path_guard_tests.rs"]
mod tests;
