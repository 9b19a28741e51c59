// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The concrete end-to-end scenarios: lifecycle bracketing, retry
//! discipline, reload, dead-tagging, and shutdown drain.

use super::helpers::*;
use ow_core::{Event, ServiceId, Status};
use ow_scanner::test_support::{FakeDialer, ProbeOutcome};

#[tokio::test(flavor = "multi_thread")]
async fn happy_path_lifecycle_then_periodic_online() {
    let tmp = TempCatalog::new();
    tmp.write_service("acme", &["http://x.onion"]);
    let mut h = Harness::start(tmp, FakeDialer::always_online()).await;

    h.expect(process_started("acme")).await;
    h.expect(worker_started("acme", "http://x.onion")).await;

    for _ in 0..3 {
        let event = h.expect(scan_for("acme")).await;
        match event {
            Event::Scan { status, error, .. } => {
                assert_eq!(status, Status::Online);
                assert!(error.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    h.wait_for_cache(|cache| {
        cache.get_online_addresses(&ServiceId::new("acme")).is_some_and(|online| {
            online == vec!["http://x.onion".to_string()]
        })
    })
    .await;

    h.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn flap_under_threshold_emits_only_the_success() {
    let tmp = TempCatalog::new();
    tmp.write_service("acme", &["http://x.onion"]);
    let dialer = FakeDialer::scripted(
        [ProbeOutcome::Offline, ProbeOutcome::Offline, ProbeOutcome::Online],
        ProbeOutcome::Online,
    );
    let mut h = Harness::start(tmp, dialer.clone()).await;

    let event = h.expect(scan_for("acme")).await;
    match event {
        Event::Scan { status, .. } => assert_eq!(status, Status::Online),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(dialer.dials() >= 3, "both failures were probed before the success");

    h.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn durable_offline_after_the_retry_window() {
    let tmp = TempCatalog::new();
    tmp.write_service("acme", &["http://x.onion"]);
    let dialer = FakeDialer::always_offline();
    let mut h = Harness::start(tmp, dialer.clone()).await;

    let event = h.expect(scan_for("acme")).await;
    match event {
        Event::Scan { status, error, .. } => {
            assert_eq!(status, Status::Offline);
            assert!(error.is_some(), "durable offline carries the probe error");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(dialer.dials() >= 3, "retry window ran to its three attempts first");

    h.wait_for_cache(|cache| {
        cache
            .get_online_addresses(&ServiceId::new("acme"))
            .is_some_and(|online| online.is_empty())
    })
    .await;

    h.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn reload_removing_a_url_stops_its_worker_and_cache_entry() {
    let tmp = TempCatalog::new();
    tmp.write_service("acme", &["http://x.onion", "http://y.onion"]);
    let mut h = Harness::start(tmp, FakeDialer::always_online()).await;

    h.expect(|e| matches!(e, Event::Scan { url, .. } if url == "http://y.onion")).await;

    h.tmp.write_service("acme", &["http://x.onion"]);
    h.expect(worker_stopped("acme", "http://y.onion")).await;

    h.wait_for_cache(|cache| {
        cache
            .get_addresses(&ServiceId::new("acme"))
            .is_some_and(|addresses| !addresses.contains_key("http://y.onion"))
    })
    .await;

    let seen = h.shutdown().await;
    let y_stops = seen.iter().filter(|e| worker_stopped("acme", "http://y.onion")(e)).count();
    assert_eq!(y_stops, 1, "the removed worker stops exactly once");
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn tagging_dead_stops_the_process_and_clears_the_cache() {
    let tmp = TempCatalog::new();
    tmp.write_service("acme", &["http://x.onion", "http://y.onion"]);
    let mut h = Harness::start(tmp, FakeDialer::always_online()).await;

    h.expect(|e| matches!(e, Event::Scan { url, .. } if url == "http://x.onion")).await;
    h.expect(|e| matches!(e, Event::Scan { url, .. } if url == "http://y.onion")).await;

    h.tmp.tag("acme", "dead");
    h.expect(process_stopped("acme")).await;

    h.wait_for_cache(|cache| cache.get_addresses(&ServiceId::new("acme")).is_none()).await;

    let seen = h.shutdown().await;
    let worker_stops =
        seen.iter().filter(|e| matches!(e, Event::WorkerStopped { .. })).count();
    assert_eq!(worker_stops, 2, "each running worker stopped exactly once");
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_drain_accounts_for_all_processes_and_workers() {
    let tmp = TempCatalog::new();
    tmp.write_service("alpha", &["http://a1.onion", "http://a2.onion", "http://a3.onion"]);
    tmp.write_service("beta", &["http://b1.onion", "http://b2.onion", "http://b3.onion"]);
    let mut h = Harness::start(tmp, FakeDialer::always_online()).await;

    for _ in 0..6 {
        h.expect(|e| matches!(e, Event::WorkerStarted { .. })).await;
    }

    let seen = h.shutdown().await;
    let process_starts =
        seen.iter().filter(|e| matches!(e, Event::ProcessStarted { .. })).count();
    let process_stops =
        seen.iter().filter(|e| matches!(e, Event::ProcessStopped { .. })).count();
    let worker_starts =
        seen.iter().filter(|e| matches!(e, Event::WorkerStarted { .. })).count();
    let worker_stops =
        seen.iter().filter(|e| matches!(e, Event::WorkerStopped { .. })).count();

    assert_eq!(process_starts, 2);
    assert_eq!(process_stops, 2, "every started process emits one stop before close");
    assert_eq!(worker_starts, 6);
    assert_eq!(worker_stops, 6, "every started worker emits one stop before close");
}

#[tokio::test(flavor = "multi_thread")]
async fn terminal_worker_status_carries_the_cancellation_error() {
    let tmp = TempCatalog::new();
    tmp.write_service("acme", &["http://x.onion"]);
    let mut h = Harness::start(tmp, FakeDialer::always_online()).await;

    h.expect(scan_for("acme")).await;
    let seen = h.shutdown().await;

    // The drain publishes one final Offline sample per worker, marked as
    // cancelled, before the worker's stop event.
    let terminal = seen.iter().rev().find(|e| matches!(e, Event::Scan { .. }));
    match terminal {
        Some(Event::Scan { status, error, .. }) => {
            assert_eq!(*status, Status::Offline);
            assert_eq!(error.as_deref(), Some("probe cancelled"));
        }
        other => panic!("expected a terminal scan event, got {other:?}"),
    }
}
