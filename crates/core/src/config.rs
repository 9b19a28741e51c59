// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner and worker configuration.

use std::time::Duration;

/// Timing knobs for a single URL probe worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Cadence between successful probes.
    pub ping_interval: Duration,
    /// Per-dial deadline.
    pub ping_timeout: Duration,
    /// Back-off after the retry window closes with a durable Offline.
    pub ping_pause_interval: Duration,
    /// Delay between in-window retries.
    pub ping_retry_interval: Duration,
    /// Consecutive failures before a durable Offline is emitted.
    pub ping_retry_attempts: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(60),
            ping_timeout: Duration::from_secs(50),
            ping_pause_interval: Duration::from_secs(300),
            ping_retry_interval: Duration::from_secs(10),
            ping_retry_attempts: 3,
        }
    }
}

/// Scanner-level configuration.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Cap on concurrent outbound dials, process-wide.
    pub worker_tcp_connections_max: usize,
    /// Configuration passed to every worker.
    pub worker: WorkerConfig,
}

impl ScannerConfig {
    /// Default cap on concurrent outbound dials.
    pub const DEFAULT_CONNECTIONS_MAX: usize = 256;

    pub fn new() -> Self {
        Self {
            worker_tcp_connections_max: Self::DEFAULT_CONNECTIONS_MAX,
            worker: WorkerConfig::default(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
