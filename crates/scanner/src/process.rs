// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-service process: supervises one worker per declared URL.
//!
//! The worker map is owned by the process task alone; workers communicate
//! exclusively over the channel. Reloads diff the declared URL set against
//! the running set so surviving workers keep their retry counters and
//! cadence phase.

use crate::budget::ConnBudget;
use crate::dialer::Dialer;
use crate::msg::{ProcMsg, WorkerMsg};
use crate::url;
use crate::worker::Worker;
use futures_util::FutureExt;
use ow_catalog::Catalog;
use ow_core::{ServiceId, WorkerConfig};
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Capacity of the channel workers emit on.
const WORKERS_CH_CAPACITY: usize = 256;

/// Scanner-side handle on a running process.
pub(crate) struct ProcessHandle {
    token: CancellationToken,
    reload_tx: mpsc::Sender<()>,
}

impl ProcessHandle {
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Ask the process to reconcile against the current descriptor. A
    /// reload already pending covers this one; reload is idempotent.
    pub(crate) fn reload(&self) {
        let _ = self.reload_tx.try_send(());
    }
}

struct WorkerHandle {
    token: CancellationToken,
    /// Distinguishes this worker from an earlier one for the same URL whose
    /// stop event may still be in flight after a remove/re-add reload.
    gen: u64,
}

/// The process task's private view of its workers.
struct WorkerSet {
    map: HashMap<String, WorkerHandle>,
    tx: mpsc::Sender<WorkerMsg>,
    /// Started workers that have not yet emitted their stop event. Tracked
    /// apart from the map: a worker retired by a reload leaves the map at
    /// once but still owes its stop event before drain may finish.
    live: usize,
    next_gen: u64,
}

pub(crate) struct Process {
    service_id: ServiceId,
    catalog: Arc<Catalog>,
    config: WorkerConfig,
    budget: ConnBudget,
    dialer: Arc<dyn Dialer>,
    token: CancellationToken,
    reload_rx: mpsc::Receiver<()>,
}

impl Process {
    /// Create a process and its scanner-side handle. The token is a child
    /// of `parent`, so cancelling the scanner cancels every process.
    pub(crate) fn new(
        service_id: ServiceId,
        catalog: Arc<Catalog>,
        config: WorkerConfig,
        budget: ConnBudget,
        dialer: Arc<dyn Dialer>,
        parent: &CancellationToken,
    ) -> (Self, ProcessHandle) {
        let token = parent.child_token();
        let (reload_tx, reload_rx) = mpsc::channel(1);
        let process =
            Self { service_id, catalog, config, budget, dialer, token: token.clone(), reload_rx };
        (process, ProcessHandle { token, reload_tx })
    }

    /// Supervise until cancelled, then drain: cancel all workers and keep
    /// forwarding events until one `Stopped` per started worker has been
    /// seen.
    pub(crate) async fn run(mut self, out: mpsc::Sender<ProcMsg>) {
        let (worker_tx, mut worker_rx) = mpsc::channel(WORKERS_CH_CAPACITY);
        let mut set = WorkerSet { map: HashMap::new(), tx: worker_tx, live: 0, next_gen: 0 };

        // Initial load is a reload from the empty set.
        self.reconcile(&mut set).await;

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                Some(()) = self.reload_rx.recv() => {
                    self.reconcile(&mut set).await;
                }
                Some(msg) = worker_rx.recv() => {
                    if self.forward(msg, Some(&mut set.map), &out).await {
                        set.live = set.live.saturating_sub(1);
                    }
                }
            }
        }

        for handle in set.map.values() {
            handle.token.cancel();
        }
        while set.live > 0 {
            let Some(msg) = worker_rx.recv().await else { break };
            if self.forward(msg, None, &out).await {
                set.live = set.live.saturating_sub(1);
            }
        }
    }

    /// Diff the declared URL set against running workers.
    async fn reconcile(&self, set: &mut WorkerSet) {
        let target = self.load_target();
        let target_set: HashSet<&str> = target.iter().map(String::as_str).collect();

        let obsolete: Vec<String> = set
            .map
            .keys()
            .filter(|url| !target_set.contains(url.as_str()))
            .cloned()
            .collect();
        for url in obsolete {
            if let Some(handle) = set.map.remove(&url) {
                debug!(service_id = %self.service_id, url = %url, "stopping worker");
                handle.token.cancel();
            }
        }

        for url in target {
            if set.map.contains_key(&url) {
                continue;
            }
            self.start_worker(url, set).await;
        }
    }

    /// Normalized, deduplicated URL set from the descriptor. Read failures
    /// are logged and treated as "no URLs"; a later reload may succeed.
    fn load_target(&self) -> Vec<String> {
        let record = match self.catalog.get_service(&self.service_id) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    service_id = %self.service_id,
                    error = %e,
                    "failed to read service, treating as no urls"
                );
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for raw in &record.urls {
            match url::normalize(raw) {
                Ok(normalized) => {
                    if seen.insert(normalized.clone()) {
                        urls.push(normalized);
                    }
                }
                Err(e) => {
                    warn!(
                        service_id = %self.service_id,
                        url = %raw,
                        error = %e,
                        "skipping url that does not normalize"
                    );
                }
            }
        }
        urls
    }

    async fn start_worker(&self, url: String, set: &mut WorkerSet) {
        let host_port = match url::host_port(&url) {
            Ok(host_port) => host_port,
            Err(e) => {
                warn!(
                    service_id = %self.service_id,
                    url = %url,
                    error = %e,
                    "skipping url with no dialable host"
                );
                return;
            }
        };

        debug!(service_id = %self.service_id, url = %url, "starting worker");
        let token = self.token.child_token();
        let gen = set.next_gen;
        set.next_gen += 1;
        let worker = Worker::new(
            url.clone(),
            host_port,
            self.config.clone(),
            self.budget.clone(),
            self.dialer.clone(),
            token.clone(),
        );

        let _ = set
            .tx
            .send(WorkerMsg::Started { service_id: self.service_id.clone(), url: url.clone() })
            .await;

        let tx = set.tx.clone();
        let service_id = self.service_id.clone();
        let stopped_url = url.clone();
        tokio::spawn(async move {
            let result = AssertUnwindSafe(worker.run(tx.clone())).catch_unwind().await;
            let error = result.err().map(|_| "worker panicked".to_string());
            let _ = tx
                .send(WorkerMsg::Stopped { service_id, url: stopped_url, error, gen })
                .await;
        });

        set.map.insert(url, WorkerHandle { token, gen });
        set.live += 1;
    }

    /// Annotate a worker message with the service ID and pass it upward.
    /// A `Stopped` also retires its worker from the map, unless the URL has
    /// already been handed to a newer generation. Returns whether the
    /// message was a stop, for live accounting.
    async fn forward(
        &self,
        msg: WorkerMsg,
        map: Option<&mut HashMap<String, WorkerHandle>>,
        out: &mpsc::Sender<ProcMsg>,
    ) -> bool {
        let mut stopped = false;
        let msg = match msg {
            WorkerMsg::Status { url, status, error } => ProcMsg::Status {
                service_id: self.service_id.clone(),
                url,
                status,
                error,
            },
            WorkerMsg::Started { service_id, url } => ProcMsg::WorkerStarted { service_id, url },
            WorkerMsg::Stopped { service_id, url, error, gen } => {
                stopped = true;
                if let Some(map) = map {
                    if map.get(&url).is_some_and(|handle| handle.gen == gen) {
                        map.remove(&url);
                    }
                }
                ProcMsg::WorkerStopped { service_id, url, error }
            }
        };
        let _ = out.send(msg).await;
        stopped
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
