// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level supervisor: one process per non-dead service.
//!
//! The scanner owns the process map and the outward event channel. Catalog
//! change events arrive from the watcher; status flows up from processes
//! and is reshaped into public events. On cancellation the scanner drains:
//! it cancels the watcher and every process, keeps publishing until each
//! started process has emitted its stop event, then closes the outward
//! channel by returning.

use crate::budget::ConnBudget;
use crate::dialer::Dialer;
use crate::error::ScanError;
use crate::msg::ProcMsg;
use crate::process::{Process, ProcessHandle};
use futures_util::FutureExt;
use ow_catalog::{Catalog, CatalogEvent, CatalogWatcher};
use ow_core::{Event, ScannerConfig, ServiceId, Tag};
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Capacity of the channel processes emit on.
const PROCS_CH_CAPACITY: usize = 512;

/// Capacity of the watcher event channel.
const WATCHER_CH_CAPACITY: usize = 64;

/// Supervises reachability scanning of a whole catalog.
pub struct Scanner {
    config: ScannerConfig,
    dialer: Arc<dyn Dialer>,
}

/// Everything `start` threads through its helpers.
struct Run {
    catalog: Arc<Catalog>,
    directory: String,
    budget: ConnBudget,
    proc_tx: mpsc::Sender<ProcMsg>,
    procs_token: CancellationToken,
    procs: HashMap<ServiceId, RunningProcess>,
    /// Started processes that have not yet emitted their stop event. A
    /// process destroyed by a catalog event leaves the map at once but
    /// still owes its stop event before drain may finish.
    live: usize,
    next_gen: u64,
    output: mpsc::Sender<Event>,
}

struct RunningProcess {
    handle: ProcessHandle,
    /// Distinguishes this process from an earlier one for the same service
    /// whose stop event may still be in flight after a remove/re-add.
    gen: u64,
}

impl Scanner {
    pub fn new(config: ScannerConfig, dialer: Arc<dyn Dialer>) -> Self {
        Self { config, dialer }
    }

    /// Run until `token` fires or the watcher fails.
    ///
    /// The output channel closes exactly when this returns; receivers treat
    /// the close as "fully drained". Cancellation is a clean `Ok(())`; only
    /// open-time catalog failures and watcher errors are `Err`.
    pub async fn start(
        &self,
        dir: impl AsRef<Path>,
        output: mpsc::Sender<Event>,
        token: CancellationToken,
    ) -> Result<(), ScanError> {
        let catalog = Arc::new(Catalog::open(dir)?);
        let directory = catalog.dir().display().to_string();
        let budget = ConnBudget::new(self.config.worker_tcp_connections_max);

        info!(directory = %directory, config = ?self.config, "scanner started");

        let (proc_tx, mut proc_rx) = mpsc::channel(PROCS_CH_CAPACITY);
        let mut run = Run {
            catalog: Arc::clone(&catalog),
            directory,
            budget,
            proc_tx,
            // Processes live on their own token tree so the caller's cancel
            // does not tear workers down before drain accounting begins.
            procs_token: CancellationToken::new(),
            procs: HashMap::new(),
            live: 0,
            next_gen: 0,
            output,
        };

        for id in self.initial_services(&catalog)? {
            self.start_process(id, &mut run).await;
        }

        let (watch_tx, mut watch_rx) = mpsc::channel(WATCHER_CH_CAPACITY);
        let watcher_token = token.child_token();
        let watcher = CatalogWatcher::new((*catalog).clone());
        let mut watcher_task = tokio::spawn(watcher.watch(watcher_token.clone(), watch_tx));
        let mut watcher_done = false;

        let mut result = Ok(());
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some(event) = watch_rx.recv() => {
                    self.handle_catalog_event(event, &mut run).await;
                }
                Some(msg) = proc_rx.recv() => {
                    run.retire_if_stopped(&msg);
                    run.emit(msg).await;
                }
                join = &mut watcher_task, if !watcher_done => {
                    watcher_done = true;
                    result = match join {
                        Ok(Ok(())) => Err(ScanError::WatcherStopped),
                        Ok(Err(e)) => Err(ScanError::Catalog(e)),
                        Err(_) => Err(ScanError::WatcherPanicked),
                    };
                    break;
                }
            }
        }

        // Drain: stop the watcher, cancel every process, account for one
        // stop event per still-running process, then let the output sender
        // drop to close the channel.
        watcher_token.cancel();
        if !watcher_done {
            let _ = watcher_task.await;
        }
        run.procs_token.cancel();
        while run.live > 0 {
            let Some(msg) = proc_rx.recv().await else { break };
            run.retire_if_stopped(&msg);
            run.emit(msg).await;
        }

        info!("scanner stopped");
        result
    }

    /// All catalog services minus those tagged dead. A missing dead tag is
    /// an empty set; any other tag read failure at startup is fatal.
    fn initial_services(&self, catalog: &Catalog) -> Result<Vec<ServiceId>, ScanError> {
        let mut ids = catalog.list_services()?;
        let dead: HashSet<ServiceId> = match catalog.list_services_with_tag(&Tag::new(Tag::DEAD)) {
            Ok(dead) => dead.into_iter().collect(),
            Err(e) if e.is_tag_not_found() => HashSet::new(),
            Err(e) => return Err(e.into()),
        };
        ids.retain(|id| !dead.contains(id));
        Ok(ids)
    }

    async fn handle_catalog_event(&self, event: CatalogEvent, run: &mut Run) {
        match event {
            CatalogEvent::ServiceAdded { id } => self.start_process(id, run).await,
            CatalogEvent::ServiceUpdated { id } => {
                if let Some(running) = run.procs.get(&id) {
                    debug!(service_id = %id, "reloading process");
                    running.handle.reload();
                }
            }
            CatalogEvent::ServiceRemoved { id } => run.destroy_process(&id),
            CatalogEvent::ServiceTagged { id, tag } if tag.is_dead() => run.destroy_process(&id),
            CatalogEvent::ServiceUntagged { id, tag } if tag.is_dead() => {
                self.start_process(id, run).await
            }
            // Tags other than `dead` do not affect the running set.
            CatalogEvent::ServiceTagged { .. } | CatalogEvent::ServiceUntagged { .. } => {}
        }
    }

    /// Start a process for `service_id` unless one is already running.
    async fn start_process(&self, service_id: ServiceId, run: &mut Run) {
        if run.procs.contains_key(&service_id) {
            return;
        }
        info!(service_id = %service_id, "starting process");

        let (process, handle) = Process::new(
            service_id.clone(),
            Arc::clone(&run.catalog),
            self.config.worker.clone(),
            run.budget.clone(),
            Arc::clone(&self.dialer),
            &run.procs_token,
        );

        let _ = run.proc_tx.send(ProcMsg::ProcessStarted { service_id: service_id.clone() }).await;

        let gen = run.next_gen;
        run.next_gen += 1;
        let tx = run.proc_tx.clone();
        let stopped_id = service_id.clone();
        tokio::spawn(async move {
            let result = AssertUnwindSafe(process.run(tx.clone())).catch_unwind().await;
            let error = result.err().map(|_| "process panicked".to_string());
            let _ = tx
                .send(ProcMsg::ProcessStopped { service_id: stopped_id, error, gen })
                .await;
        });

        run.procs.insert(service_id, RunningProcess { handle, gen });
        run.live += 1;
    }
}

impl Run {
    /// Cancel the process for `service_id`, if any. The stop event arrives
    /// later through the process channel.
    fn destroy_process(&mut self, service_id: &ServiceId) {
        if let Some(running) = self.procs.remove(service_id) {
            info!(service_id = %service_id, "stopping process");
            running.handle.cancel();
        }
    }

    /// Account for a stop event: drop the map entry unless the service has
    /// already been handed to a newer process generation.
    fn retire_if_stopped(&mut self, msg: &ProcMsg) {
        if let ProcMsg::ProcessStopped { service_id, gen, .. } = msg {
            if self.procs.get(service_id).is_some_and(|running| running.gen == *gen) {
                self.procs.remove(service_id);
            }
            self.live = self.live.saturating_sub(1);
        }
    }

    /// Reshape an internal message into a public event and publish it. Only
    /// the internal status variant changes shape; lifecycle events pass
    /// through so downstreams observe start/stop bracketing.
    async fn emit(&self, msg: ProcMsg) {
        let event = match msg {
            ProcMsg::Status { service_id, url, status, error } => Event::Scan {
                service_id,
                url,
                status,
                directory: self.directory.clone(),
                error,
            },
            ProcMsg::WorkerStarted { service_id, url } => Event::WorkerStarted { service_id, url },
            ProcMsg::WorkerStopped { service_id, url, error } => {
                Event::WorkerStopped { service_id, url, error }
            }
            ProcMsg::ProcessStarted { service_id } => Event::ProcessStarted { service_id },
            ProcMsg::ProcessStopped { service_id, error, .. } => {
                Event::ProcessStopped { service_id, error }
            }
        };
        let _ = self.output.send(event).await;
    }
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
