// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helper functions for state lookups.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Get a value by exact ID or unique prefix.
///
/// Lets a short id a user typed (missing the random suffix, or even the
/// type tag) still resolve, as long as exactly one key matches.
pub(crate) fn find_by_prefix<'a, K, V>(map: &'a HashMap<K, V>, id: &str) -> Option<&'a V>
where
    K: Eq + Hash + Borrow<str>,
{
    if let Some(val) = map.get(id) {
        return Some(val);
    }
    let matches: Vec<_> = map.iter().filter(|(k, _)| k.borrow().contains(id)).collect();
    if matches.len() == 1 {
        Some(matches[0].1)
    } else {
        None
    }
}
