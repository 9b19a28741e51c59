// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ow_core::{ServiceId, Status};

fn scan(service: &str, url: &str, status: Status) -> Event {
    Event::Scan {
        service_id: ServiceId::new(service),
        url: url.to_string(),
        status,
        directory: "/srv/catalog".to_string(),
        error: None,
    }
}

#[tokio::test]
async fn scan_events_set_the_gauge() {
    let metrics = Metrics::new().unwrap();
    let (tx, rx) = mpsc::channel(8);
    tx.send(scan("acme", "http://x.onion", Status::Online)).await.unwrap();
    tx.send(scan("acme", "http://y.onion", Status::Offline)).await.unwrap();
    drop(tx);

    metrics.read_events(rx, None, CancellationToken::new()).await;

    let online = metrics
        .gauge()
        .get_metric_with_label_values(&["acme", "http://x.onion", "/srv/catalog"])
        .unwrap();
    assert_eq!(online.get(), 1);
    let offline = metrics
        .gauge()
        .get_metric_with_label_values(&["acme", "http://y.onion", "/srv/catalog"])
        .unwrap();
    assert_eq!(offline.get(), 0);
}

#[tokio::test]
async fn events_are_forwarded_down_the_chain() {
    let metrics = Metrics::new().unwrap();
    let (tx, rx) = mpsc::channel(8);
    let (fwd_tx, mut fwd_rx) = mpsc::channel(8);

    let lifecycle = Event::ProcessStarted { service_id: ServiceId::new("acme") };
    tx.send(lifecycle.clone()).await.unwrap();
    tx.send(scan("acme", "http://x.onion", Status::Online)).await.unwrap();
    drop(tx);

    metrics.read_events(rx, Some(fwd_tx), CancellationToken::new()).await;

    assert_eq!(fwd_rx.recv().await, Some(lifecycle));
    assert!(matches!(fwd_rx.recv().await, Some(Event::Scan { .. })));
    // The forward sender dropped when read_events returned.
    assert_eq!(fwd_rx.recv().await, None);
}

#[tokio::test]
async fn registers_with_a_registry() {
    let metrics = Metrics::new().unwrap();
    let registry = Registry::new();
    metrics.register(&registry).unwrap();

    let (tx, rx) = mpsc::channel(8);
    tx.send(scan("acme", "http://x.onion", Status::Online)).await.unwrap();
    drop(tx);
    metrics.read_events(rx, None, CancellationToken::new()).await;

    let families = registry.gather();
    assert!(families.iter().any(|f| f.get_name() == "ow_scan_status"));
}
