// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! owd: hidden-service reachability monitor daemon.
//!
//! Startup order: tracing → config → optional catalog clone → scanner task
//! → metrics fan-out → cache reader → HTTP facade → git-sync loop. Shutdown
//! is signal-driven: cancel the root token, then wait for the scanner to
//! drain (bounded by the drain timeout) before exiting.

use anyhow::Context;
use clap::Parser;
use ow_daemon::{env, gitsync, http};
use ow_scanner::{Cache, Dialer, DirectDialer, Metrics, Scanner, SocksDialer};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Channel capacity between the scanner and its downstream readers.
const EVENTS_CH_CAPACITY: usize = 512;

#[derive(Debug, Parser)]
#[command(name = "owd", about = "Monitors hidden-service mirrors and serves their status")]
struct Args {
    /// Catalog directory to scan
    #[arg(long)]
    catalog: PathBuf,

    /// Listen address for the HTTP status facade (falls back to
    /// OW_LISTEN_ADDR, then 127.0.0.1:8080)
    #[arg(long)]
    listen: Option<String>,

    /// SOCKS5 proxy for outbound probes (falls back to OW_SOCKS_PROXY)
    #[arg(long)]
    socks: Option<String>,

    /// Git remote to keep the catalog synced from
    #[arg(long)]
    sync_remote: Option<String>,

    /// Log filter (falls back to OW_LOG, then "info")
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log.clone());
    run(args).await
}

fn init_tracing(filter: Option<String>) {
    let filter = filter.or_else(env::log_filter).unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = env::scanner_config();
    let dialer: Arc<dyn Dialer> = match args.socks.clone().or_else(env::socks_proxy) {
        Some(proxy) => {
            info!(proxy = %proxy, "probing through socks proxy");
            Arc::new(SocksDialer::new(proxy))
        }
        None => {
            warn!("no socks proxy configured, dialing directly");
            Arc::new(DirectDialer)
        }
    };

    if let Some(remote) = &args.sync_remote {
        gitsync::ensure_clone(remote, &args.catalog).await.context("initial catalog clone")?;
    }

    let token = CancellationToken::new();

    let registry = prometheus::Registry::new();
    let metrics = Metrics::new().context("build metrics")?;
    metrics.register(&registry).context("register metrics")?;
    let cache = Arc::new(Cache::new());

    let (scan_tx, scan_rx) = mpsc::channel(EVENTS_CH_CAPACITY);
    let (cache_tx, cache_rx) = mpsc::channel(EVENTS_CH_CAPACITY);

    let scanner = Scanner::new(config, dialer);
    let mut scanner_task = {
        let catalog = args.catalog.clone();
        let token = token.clone();
        tokio::spawn(async move { scanner.start(catalog, scan_tx, token).await })
    };

    // Downstream readers run until channel close so a drain always reaches
    // the cache, even after the root token fires.
    let metrics_task = tokio::spawn(async move {
        metrics.read_events(scan_rx, Some(cache_tx), CancellationToken::new()).await
    });
    let cache_task = {
        let cache = Arc::clone(&cache);
        tokio::spawn(
            async move { cache.read_events(cache_rx, CancellationToken::new()).await },
        )
    };

    let listen = args
        .listen
        .clone()
        .or_else(env::listen_addr)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());
    let listener =
        tokio::net::TcpListener::bind(&listen).await.with_context(|| format!("bind {listen}"))?;
    info!(addr = %listen, "http facade listening");
    let http_task = {
        let app = http::router(Arc::clone(&cache), registry);
        let token = token.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
        })
    };

    let sync_task = args.sync_remote.as_ref().map(|_| {
        tokio::spawn(gitsync::run(args.catalog.clone(), env::sync_interval(), token.clone()))
    });

    let scan_result = tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received, draining");
            token.cancel();
            match tokio::time::timeout(env::drain_timeout(), &mut scanner_task).await {
                Ok(join) => join.context("scanner task")?,
                Err(_) => {
                    warn!("drain timeout expired, scanner still stopping");
                    Ok(())
                }
            }
        }
        join = &mut scanner_task => {
            // The scanner only returns on its own for startup or watcher
            // failures; take the rest of the daemon down with it.
            token.cancel();
            join.context("scanner task")?
        }
    };

    // Give the downstream chain a chance to consume to channel close.
    let _ = tokio::time::timeout(env::drain_timeout(), async {
        let _ = metrics_task.await;
        let _ = cache_task.await;
        let _ = http_task.await;
        if let Some(task) = sync_task {
            let _ = task.await;
        }
    })
    .await;

    scan_result.context("scanner failed")?;
    info!("daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
