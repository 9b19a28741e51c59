// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probe status.

use serde::{Deserialize, Serialize};

/// Reachability of a single URL, as observed by the last emitted probe.
///
/// The integer mapping (Online=1, Offline=0) is stable; gauges are set
/// directly from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Offline = 0,
    Online = 1,
}

impl Status {
    /// Numeric value for metric emission.
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn is_online(self) -> bool {
        matches!(self, Status::Online)
    }
}

crate::simple_display! {
    Status {
        Offline => "offline",
        Online => "online",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
