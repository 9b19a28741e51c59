// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn dead_tag() {
    assert!(Tag::new("dead").is_dead());
    assert!(!Tag::new("scam").is_dead());
}

#[test]
fn display_is_raw_value() {
    assert_eq!(Tag::new("dead").to_string(), "dead");
}
