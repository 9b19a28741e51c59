// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public events emitted by the scanner.
//!
//! Serializes with `{"type": "scan:status", ...fields}` format. These are
//! the only variants that cross the scanner boundary; the per-level status
//! messages workers and processes exchange internally never escape the
//! scanner crate.

use crate::service::ServiceId;
use crate::status::Status;
use serde::{Deserialize, Serialize};

/// Events observed on the scanner's outward channel.
///
/// Lifecycle bracketing holds for every run: each `WorkerStarted` is
/// eventually matched by exactly one `WorkerStopped`, each `ProcessStarted`
/// by exactly one `ProcessStopped`, and the channel closes only once every
/// started child has been accounted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A probe sample for one URL of one service.
    #[serde(rename = "scan:status")]
    Scan {
        service_id: ServiceId,
        url: String,
        status: Status,
        /// Catalog directory the scanner was started on.
        directory: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "worker:started")]
    WorkerStarted { service_id: ServiceId, url: String },

    #[serde(rename = "worker:stopped")]
    WorkerStopped {
        service_id: ServiceId,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "process:started")]
    ProcessStarted { service_id: ServiceId },

    #[serde(rename = "process:stopped")]
    ProcessStopped {
        service_id: ServiceId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl Event {
    /// The service this event concerns.
    pub fn service_id(&self) -> &ServiceId {
        match self {
            Event::Scan { service_id, .. }
            | Event::WorkerStarted { service_id, .. }
            | Event::WorkerStopped { service_id, .. }
            | Event::ProcessStarted { service_id }
            | Event::ProcessStopped { service_id, .. } => service_id,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
