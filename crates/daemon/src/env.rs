// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.
//!
//! Flags win over environment; unparseable values fall back to defaults.

use ow_core::{parse_duration, ScannerConfig};
use std::time::Duration;

/// Scanner configuration with `OW_*` overrides applied on top of the
/// defaults.
pub fn scanner_config() -> ScannerConfig {
    let mut config = ScannerConfig::new();
    if let Some(max) = env_usize("OW_TCP_CONNECTIONS_MAX") {
        config.worker_tcp_connections_max = max;
    }
    if let Some(d) = env_duration("OW_PING_INTERVAL") {
        config.worker.ping_interval = d;
    }
    if let Some(d) = env_duration("OW_PING_TIMEOUT") {
        config.worker.ping_timeout = d;
    }
    if let Some(d) = env_duration("OW_PING_RETRY_INTERVAL") {
        config.worker.ping_retry_interval = d;
    }
    if let Some(d) = env_duration("OW_PING_PAUSE_INTERVAL") {
        config.worker.ping_pause_interval = d;
    }
    if let Some(attempts) = env_u32("OW_PING_RETRY_ATTEMPTS") {
        config.worker.ping_retry_attempts = attempts;
    }
    config
}

/// SOCKS5 proxy address for outbound probes, e.g. `127.0.0.1:9050`.
pub fn socks_proxy() -> Option<String> {
    std::env::var("OW_SOCKS_PROXY").ok().filter(|s| !s.is_empty())
}

/// Listen address for the HTTP status facade.
pub fn listen_addr() -> Option<String> {
    std::env::var("OW_LISTEN_ADDR").ok().filter(|s| !s.is_empty())
}

/// Log filter directive (same syntax as `RUST_LOG`).
pub fn log_filter() -> Option<String> {
    std::env::var("OW_LOG").ok().filter(|s| !s.is_empty())
}

/// Cadence of the catalog git-sync loop (default 5m).
pub fn sync_interval() -> Duration {
    env_duration("OW_SYNC_INTERVAL").unwrap_or(Duration::from_secs(300))
}

/// How long shutdown waits for the scanner to drain (default 5s).
pub fn drain_timeout() -> Duration {
    env_duration("OW_DRAIN_TIMEOUT").unwrap_or(Duration::from_secs(5))
}

fn env_duration(key: &str) -> Option<Duration> {
    std::env::var(key).ok().and_then(|s| parse_duration(&s).ok())
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
