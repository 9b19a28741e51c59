// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn numeric_mapping_is_stable() {
    assert_eq!(Status::Online.as_i64(), 1);
    assert_eq!(Status::Offline.as_i64(), 0);
}

#[test]
fn display() {
    assert_eq!(Status::Online.to_string(), "online");
    assert_eq!(Status::Offline.to_string(), "offline");
}

#[test]
fn serde_roundtrip_lowercase() {
    assert_eq!(serde_json::to_string(&Status::Online).unwrap(), "\"online\"");
    let s: Status = serde_json::from_str("\"offline\"").unwrap();
    assert_eq!(s, Status::Offline);
}
