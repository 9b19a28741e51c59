// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal messages between supervision levels.
//!
//! `Status` variants stay inside the level that produced them: a worker's
//! `WorkerMsg::Status` becomes a `ProcMsg::Status` with the service ID
//! attached, and only the scanner turns that into a public
//! [`ow_core::Event::Scan`]. Lifecycle variants pass through unchanged so
//! downstreams can observe start/stop bracketing.

use ow_core::{ServiceId, Status};

/// Messages from workers to their owning process.
#[derive(Debug)]
pub(crate) enum WorkerMsg {
    /// Probe sample; never leaves the process unconverted.
    Status { url: String, status: Status, error: Option<String> },

    Started { service_id: ServiceId, url: String },

    Stopped {
        service_id: ServiceId,
        url: String,
        error: Option<String>,
        /// Which worker generation for this URL stopped; guards the owner's
        /// map against stop events from a replaced worker.
        gen: u64,
    },
}

/// Messages from processes to the scanner.
#[derive(Debug)]
pub(crate) enum ProcMsg {
    /// Probe sample with the service attached; reshaped into
    /// [`ow_core::Event::Scan`] at the scanner.
    Status { service_id: ServiceId, url: String, status: Status, error: Option<String> },

    WorkerStarted { service_id: ServiceId, url: String },

    WorkerStopped { service_id: ServiceId, url: String, error: Option<String> },

    ProcessStarted { service_id: ServiceId },

    ProcessStopped {
        service_id: ServiceId,
        error: Option<String>,
        /// Which process generation for this service stopped; guards the
        /// scanner's map against stop events from a replaced process.
        gen: u64,
    },
}
