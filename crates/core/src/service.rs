// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service identifier.

crate::string_id! {
    /// Unique identifier for a monitored service.
    ///
    /// Derived from the catalog filename (extension stripped), so valid IDs
    /// match `^[a-z0-9-]+$`.
    pub struct ServiceId;
}

impl ServiceId {
    /// Whether the identifier matches the catalog naming pattern.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
