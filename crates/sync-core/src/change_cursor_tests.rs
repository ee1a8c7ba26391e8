// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn advance_updates_token_and_timestamp() {
    let mut cursor = ChangeCursor::new("root", "tok-1", 100);
    assert!(cursor.advance("tok-2", 200));
    assert_eq!(cursor.token, "tok-2");
    assert_eq!(cursor.updated_at_ms, 200);
}

#[test]
fn advance_rejects_going_backward() {
    let mut cursor = ChangeCursor::new("root", "tok-1", 500);
    assert!(!cursor.advance("tok-stale", 100));
    assert_eq!(cursor.token, "tok-1");
    assert_eq!(cursor.updated_at_ms, 500);
}

#[test]
fn advance_allows_same_timestamp() {
    let mut cursor = ChangeCursor::new("root", "tok-1", 500);
    assert!(cursor.advance("tok-2", 500));
}
