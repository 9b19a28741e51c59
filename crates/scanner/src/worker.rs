// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-URL probe worker.
//!
//! One worker probes one endpoint on a timer. Offline results are held back
//! until `ping_retry_attempts` consecutive failures to keep transient
//! network noise from flapping downstream badges; a durable Offline is
//! followed by the longer `ping_pause_interval` before the next probe.

use crate::budget::ConnBudget;
use crate::dialer::Dialer;
use crate::error::ProbeError;
use crate::msg::WorkerMsg;
use ow_core::{Status, WorkerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub(crate) struct Worker {
    url: String,
    host_port: String,
    config: WorkerConfig,
    budget: ConnBudget,
    dialer: Arc<dyn Dialer>,
    token: CancellationToken,
}

impl Worker {
    pub(crate) fn new(
        url: String,
        host_port: String,
        config: WorkerConfig,
        budget: ConnBudget,
        dialer: Arc<dyn Dialer>,
        token: CancellationToken,
    ) -> Self {
        Self { url, host_port, config, budget, dialer, token }
    }

    /// Probe until cancelled.
    ///
    /// The event stream ends with exactly one status event after the token
    /// fires (Offline, error = cancelled); the owning process relies on
    /// that terminal emit to reach its own exit condition.
    pub(crate) async fn run(self, events: mpsc::Sender<WorkerMsg>) {
        let mut failed_attempts: u32 = 0;
        let mut sleep_time = Duration::ZERO;

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    let _ = events
                        .send(WorkerMsg::Status {
                            url: self.url.clone(),
                            status: Status::Offline,
                            error: Some(ProbeError::Cancelled.to_string()),
                        })
                        .await;
                    return;
                }
                _ = tokio::time::sleep(sleep_time) => {}
            }
            sleep_time = self.config.ping_interval;

            let result = self.connect().await;

            // A dial cut short by cancellation is not a sample; loop back so
            // the terminal emit above is the authoritative final state.
            if self.token.is_cancelled() {
                continue;
            }

            match result {
                Err(err) => {
                    failed_attempts += 1;
                    if failed_attempts < self.config.ping_retry_attempts {
                        debug!(
                            url = %self.url,
                            attempt = failed_attempts,
                            error = %err,
                            "probe failed, retrying"
                        );
                        sleep_time = self.config.ping_retry_interval;
                        continue;
                    }

                    sleep_time = self.config.ping_pause_interval;
                    failed_attempts = 0;
                    debug!(url = %self.url, error = %err, "offline");
                    let _ = events
                        .send(WorkerMsg::Status {
                            url: self.url.clone(),
                            status: Status::Offline,
                            error: Some(err.to_string()),
                        })
                        .await;
                }
                Ok(()) => {
                    failed_attempts = 0;
                    debug!(url = %self.url, "online");
                    let _ = events
                        .send(WorkerMsg::Status {
                            url: self.url.clone(),
                            status: Status::Online,
                            error: None,
                        })
                        .await;
                }
            }
        }
    }

    /// One probe attempt: acquire a budget unit, dial with the per-attempt
    /// deadline, close immediately. The unit is released on every path.
    async fn connect(&self) -> Result<(), ProbeError> {
        let _permit = self.budget.acquire(&self.token).await?;
        match tokio::time::timeout(self.config.ping_timeout, self.dialer.dial(&self.host_port))
            .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ProbeError::Connect(e)),
            Err(_) => Err(ProbeError::Timeout(self.config.ping_timeout)),
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
