// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Derived status cache.
//!
//! A reference downstream that folds scanner events into two maps: the
//! authoritative status per known address, and a reverse address→service
//! index for URL lookups. One writer (the event reader task), any number of
//! readers.

use ow_core::{Event, ServiceId, Status};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Inner {
    /// `addresses[service_id][address]` = last emitted status.
    addresses: HashMap<ServiceId, HashMap<String, Status>>,
    /// `services[address]` = owning service.
    services: HashMap<String, ServiceId>,
}

/// Live view of the scanner's event stream.
#[derive(Default)]
pub struct Cache {
    inner: RwLock<Inner>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume events until the channel closes (scanner fully drained) or
    /// `token` fires.
    pub async fn read_events(&self, mut rx: mpsc::Receiver<Event>, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                event = rx.recv() => {
                    let Some(event) = event else { return };
                    self.apply(&event);
                }
            }
        }
    }

    fn apply(&self, event: &Event) {
        match event {
            Event::Scan { service_id, url, status, .. } => {
                let mut inner = self.inner.write();
                inner
                    .addresses
                    .entry(service_id.clone())
                    .or_default()
                    .insert(url.clone(), *status);
                inner.services.insert(url.clone(), service_id.clone());
            }
            Event::WorkerStopped { service_id, url, .. } => {
                let mut inner = self.inner.write();
                if let Some(addresses) = inner.addresses.get_mut(service_id) {
                    addresses.remove(url);
                }
                inner.services.remove(url);
            }
            Event::ProcessStopped { service_id, .. } => {
                self.inner.write().addresses.remove(service_id);
            }
            Event::WorkerStarted { .. } | Event::ProcessStarted { .. } => {}
        }
    }

    /// Status per known address of `service_id`; `None` when the service is
    /// unknown (never scanned, or retired by its process stop).
    pub fn get_addresses(&self, service_id: &ServiceId) -> Option<HashMap<String, Status>> {
        self.inner.read().addresses.get(service_id).cloned()
    }

    /// Addresses of `service_id` currently observed online, sorted.
    pub fn get_online_addresses(&self, service_id: &ServiceId) -> Option<Vec<String>> {
        let inner = self.inner.read();
        let addresses = inner.addresses.get(service_id)?;
        let mut online: Vec<String> = addresses
            .iter()
            .filter(|(_, status)| status.is_online())
            .map(|(url, _)| url.clone())
            .collect();
        online.sort();
        Some(online)
    }

    /// The service owning `url`, while any worker for it is alive.
    pub fn get_service_id(&self, url: &str) -> Option<ServiceId> {
        self.inner.read().services.get(url).cloned()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
