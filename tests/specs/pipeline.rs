// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scanner → metrics → cache chain, composed the way the daemon wires
//! it: metrics observes every event and forwards downstream; channel close
//! propagates so the whole chain drains when the scanner returns.

use super::helpers::{fast_config, TempCatalog, EVENT_WAIT};
use ow_core::ServiceId;
use ow_scanner::test_support::FakeDialer;
use ow_scanner::{Cache, Metrics, Scanner};
use prometheus::Registry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread")]
async fn chained_readers_populate_gauge_and_cache_then_drain() {
    let tmp = TempCatalog::new();
    tmp.write_service("acme", &["http://x.onion"]);

    let registry = Registry::new();
    let metrics = Metrics::new().unwrap();
    metrics.register(&registry).unwrap();
    let cache = Arc::new(Cache::new());

    let (scan_tx, scan_rx) = mpsc::channel(512);
    let (cache_tx, cache_rx) = mpsc::channel(512);

    let token = CancellationToken::new();
    let scanner = Scanner::new(fast_config(), FakeDialer::always_online());
    let scanner_task = {
        let path = tmp.path().to_path_buf();
        let token = token.clone();
        tokio::spawn(async move { scanner.start(path, scan_tx, token).await })
    };
    let metrics_task = tokio::spawn(async move {
        metrics.read_events(scan_rx, Some(cache_tx), CancellationToken::new()).await
    });
    let cache_task = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.read_events(cache_rx, CancellationToken::new()).await })
    };

    // Wait until the chain has carried a sample all the way into the cache.
    let deadline = tokio::time::Instant::now() + EVENT_WAIT;
    loop {
        if cache
            .get_online_addresses(&ServiceId::new("acme"))
            .is_some_and(|online| !online.is_empty())
        {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "sample never reached the cache");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let directory = tmp.path().display().to_string();
    let gauge = registry
        .gather()
        .into_iter()
        .find(|f| f.get_name() == "ow_scan_status")
        .expect("gauge family registered");
    let metric = gauge
        .get_metric()
        .iter()
        .find(|m| {
            m.get_label().iter().any(|l| l.get_name() == "url" && l.get_value() == "http://x.onion")
                && m.get_label()
                    .iter()
                    .any(|l| l.get_name() == "directory" && l.get_value() == directory)
        })
        .expect("sample mirrored into the gauge");
    assert_eq!(metric.get_gauge().get_value() as i64, 1);

    // Cancelling the scanner closes the outward channel; close propagates
    // through the metrics forward into the cache reader.
    token.cancel();
    tokio::time::timeout(EVENT_WAIT, scanner_task).await.unwrap().unwrap().unwrap();
    tokio::time::timeout(EVENT_WAIT, metrics_task).await.unwrap().unwrap();
    tokio::time::timeout(EVENT_WAIT, cache_task).await.unwrap().unwrap();
}
