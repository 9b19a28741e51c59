// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner errors.

use std::time::Duration;
use thiserror::Error;

/// Fatal errors surfaced by [`crate::Scanner::start`].
///
/// Probe failures never appear here; they ride status events. Cancellation
/// is not an error either — a cancelled scanner drains and returns `Ok`.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Catalog(#[from] ow_catalog::CatalogError),

    #[error("catalog watcher stopped unexpectedly")]
    WatcherStopped,

    #[error("catalog watcher panicked")]
    WatcherPanicked,
}

/// Why a single probe attempt failed.
///
/// Carried on status events as text; drives the worker's retry machine.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The supervising context was cancelled while waiting or dialing.
    #[error("probe cancelled")]
    Cancelled,

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),
}
