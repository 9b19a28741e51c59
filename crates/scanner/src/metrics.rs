// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metrics fan-out.
//!
//! An optional downstream that mirrors scan events into a gauge labelled
//! `(service_id, url, directory)` and forwards every event to a further
//! downstream, so readers can be chained: scanner → metrics → cache.

use ow_core::Event;
use prometheus::{IntGaugeVec, Opts, Registry};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Mirrors scan events into a labelled gauge.
pub struct Metrics {
    gauge: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let gauge = IntGaugeVec::new(
            Opts::new("ow_scan_status", "Last observed status per service URL."),
            &["service_id", "url", "directory"],
        )?;
        Ok(Self { gauge })
    }

    /// Expose the gauge through `registry`.
    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.gauge.clone()))
    }

    /// Consume events until the channel closes or `token` fires, setting
    /// the gauge from every scan event. When `forward` is given, all events
    /// are passed through; its sender drops on return, so channel-close
    /// propagates down the chain.
    pub async fn read_events(
        &self,
        mut rx: mpsc::Receiver<Event>,
        forward: Option<mpsc::Sender<Event>>,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                event = rx.recv() => {
                    let Some(event) = event else { return };
                    if let Event::Scan { service_id, url, status, directory, .. } = &event {
                        self.gauge
                            .with_label_values(&[service_id.as_str(), url, directory])
                            .set(status.as_i64());
                    }
                    if let Some(forward) = &forward {
                        if forward.send(event).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn gauge(&self) -> &IntGaugeVec {
        &self.gauge
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
