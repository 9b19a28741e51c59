// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harness shared by the integration specs.

use ow_core::{Event, ScannerConfig, WorkerConfig};
use ow_scanner::test_support::FakeDialer;
use ow_scanner::{Cache, ScanError, Scanner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const EVENT_WAIT: Duration = Duration::from_secs(10);

/// Tight probe timings for wall-clock tests.
pub fn fast_config() -> ScannerConfig {
    ScannerConfig {
        worker_tcp_connections_max: 16,
        worker: WorkerConfig {
            ping_interval: Duration::from_millis(50),
            ping_timeout: Duration::from_millis(200),
            ping_pause_interval: Duration::from_millis(200),
            ping_retry_interval: Duration::from_millis(20),
            ping_retry_attempts: 3,
        },
    }
}

pub struct TempCatalog {
    dir: TempDir,
}

impl TempCatalog {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".onionwatch"), "").unwrap();
        std::fs::create_dir(dir.path().join("unsorted")).unwrap();
        std::fs::create_dir(dir.path().join("tagged")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn service_path(&self, id: &str) -> PathBuf {
        self.dir.path().join("unsorted").join(format!("{id}.yaml"))
    }

    pub fn write_service(&self, id: &str, urls: &[&str]) {
        let mut body = format!("name: {id}\nurls:\n");
        for url in urls {
            body.push_str(&format!("  - {url}\n"));
        }
        std::fs::write(self.service_path(id), body).unwrap();
    }

    #[cfg(unix)]
    pub fn tag(&self, id: &str, tag: &str) {
        let tag_dir = self.dir.path().join("tagged").join(tag);
        if !tag_dir.is_dir() {
            std::fs::create_dir(&tag_dir).unwrap();
        }
        let link = tag_dir.join(format!("{id}.yaml"));
        let target = Path::new("../../unsorted").join(format!("{id}.yaml"));
        std::os::unix::fs::symlink(target, link).unwrap();
    }
}

/// A running scanner with a cache fed from the observed event stream.
pub struct Harness {
    pub tmp: TempCatalog,
    pub cache: Arc<Cache>,
    pub token: CancellationToken,
    rx: mpsc::Receiver<Event>,
    cache_tx: mpsc::Sender<Event>,
    task: tokio::task::JoinHandle<Result<(), ScanError>>,
    seen: Vec<Event>,
}

impl Harness {
    pub async fn start(tmp: TempCatalog, dialer: Arc<FakeDialer>) -> Self {
        let (tx, rx) = mpsc::channel(512);
        let token = CancellationToken::new();

        let cache = Arc::new(Cache::new());
        let (cache_tx, cache_rx) = mpsc::channel(512);
        {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache.read_events(cache_rx, CancellationToken::new()).await
            });
        }

        let scanner = Scanner::new(fast_config(), dialer);
        let path = tmp.path().to_path_buf();
        let scan_token = token.clone();
        let task = tokio::spawn(async move { scanner.start(path, tx, scan_token).await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        Self { tmp, cache, token, rx, cache_tx, task, seen: Vec::new() }
    }

    /// Receive events (feeding each into the cache) until one matches.
    pub async fn expect(&mut self, pred: impl Fn(&Event) -> bool) -> Event {
        let deadline = tokio::time::Instant::now() + EVENT_WAIT;
        loop {
            let event = tokio::time::timeout_at(deadline, self.rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("outward channel closed");
            let _ = self.cache_tx.send(event.clone()).await;
            self.seen.push(event.clone());
            if pred(&event) {
                return event;
            }
        }
    }

    /// Poll until the cache satisfies `pred`.
    pub async fn wait_for_cache(&mut self, pred: impl Fn(&Cache) -> bool) {
        let deadline = tokio::time::Instant::now() + EVENT_WAIT;
        loop {
            if pred(&self.cache) {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for cache state"
            );
            // Keep the event stream flowing into the cache while we wait.
            if let Ok(Some(event)) =
                tokio::time::timeout(Duration::from_millis(20), self.rx.recv()).await
            {
                let _ = self.cache_tx.send(event.clone()).await;
                self.seen.push(event);
            }
        }
    }

    /// Cancel, await the scanner, drain the stream to close, and return
    /// everything observed.
    pub async fn shutdown(mut self) -> Vec<Event> {
        self.token.cancel();
        let result = tokio::time::timeout(EVENT_WAIT, self.task)
            .await
            .expect("scanner did not stop in time")
            .unwrap();
        assert!(result.is_ok(), "cancellation is not an error: {result:?}");
        while let Some(event) = self.rx.recv().await {
            let _ = self.cache_tx.send(event.clone()).await;
            self.seen.push(event);
        }
        self.seen
    }
}

pub fn scan_for(id: &'static str) -> impl Fn(&Event) -> bool {
    move |e| matches!(e, Event::Scan { service_id, .. } if *service_id == *id)
}

pub fn worker_started(id: &'static str, url: &'static str) -> impl Fn(&Event) -> bool {
    move |e| {
        matches!(e, Event::WorkerStarted { service_id, url: u }
            if *service_id == *id && u == url)
    }
}

pub fn worker_stopped(id: &'static str, url: &'static str) -> impl Fn(&Event) -> bool {
    move |e| {
        matches!(e, Event::WorkerStopped { service_id, url: u, .. }
            if *service_id == *id && u == url)
    }
}

pub fn process_started(id: &'static str) -> impl Fn(&Event) -> bool {
    move |e| matches!(e, Event::ProcessStarted { service_id } if *service_id == *id)
}

pub fn process_stopped(id: &'static str) -> impl Fn(&Event) -> bool {
    move |e| matches!(e, Event::ProcessStopped { service_id, .. } if *service_id == *id)
}
