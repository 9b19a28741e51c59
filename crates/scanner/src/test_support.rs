// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted dialer for tests.

use crate::dialer::Dialer;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What a scripted dial should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Online,
    Offline,
    /// Never resolves; exercises the per-attempt deadline.
    Hang,
}

/// A [`Dialer`] that plays back a script of outcomes, then repeats a
/// default. Tracks call counts and the high-water mark of concurrent dials
/// for budget assertions.
pub struct FakeDialer {
    script: Mutex<VecDeque<ProbeOutcome>>,
    default: ProbeOutcome,
    dials: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeDialer {
    pub fn always_online() -> Arc<Self> {
        Self::scripted([], ProbeOutcome::Online)
    }

    pub fn always_offline() -> Arc<Self> {
        Self::scripted([], ProbeOutcome::Offline)
    }

    pub fn scripted(
        outcomes: impl IntoIterator<Item = ProbeOutcome>,
        default: ProbeOutcome,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            default,
            dials: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Total dial attempts observed.
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Highest number of dials that were in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the dial future is dropped
/// mid-hang by the worker's deadline.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Dialer for FakeDialer {
    async fn dial(&self, _host_port: &str) -> std::io::Result<()> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let outcome = self.script.lock().pop_front().unwrap_or(self.default);
        match outcome {
            ProbeOutcome::Online => Ok(()),
            ProbeOutcome::Offline => Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "scripted offline",
            )),
            ProbeOutcome::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}
