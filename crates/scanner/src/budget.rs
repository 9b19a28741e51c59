// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global connection budget.
//!
//! A weighted gate bounding concurrent outbound dials process-wide,
//! independent of how many workers exist. Passed to every worker as an
//! explicit dependency; there is no module-level singleton.

use crate::error::ProbeError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Bounds the number of dials in flight. Cheap to clone.
#[derive(Clone)]
pub struct ConnBudget {
    sem: Arc<Semaphore>,
    capacity: usize,
}

impl ConnBudget {
    pub fn new(capacity: usize) -> Self {
        Self { sem: Arc::new(Semaphore::new(capacity)), capacity }
    }

    /// Acquire one unit, or fail with [`ProbeError::Cancelled`] if `token`
    /// fires first. The unit is released when the permit drops, on any
    /// exit path.
    pub async fn acquire(&self, token: &CancellationToken) -> Result<OwnedSemaphorePermit, ProbeError> {
        tokio::select! {
            _ = token.cancelled() => Err(ProbeError::Cancelled),
            permit = Arc::clone(&self.sem).acquire_owned() => {
                // The semaphore is never closed while a budget handle exists.
                permit.map_err(|_| ProbeError::Cancelled)
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Units currently free; equals `capacity` when no dial is in flight.
    pub fn available(&self) -> usize {
        self.sem.available_permits()
    }
}

impl std::fmt::Debug for ConnBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnBudget")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}

#[cfg(test)]
#[path = "budget_tests.rs"]
mod tests;
