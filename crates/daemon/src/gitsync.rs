// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog git-sync loop.
//!
//! Keeps the on-disk catalog replenished from a git remote by shelling out
//! to `git`. Pull failures are logged and retried on the next tick, never
//! fatal; the scanner keeps running on the last good checkout.

use anyhow::ensure;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Clone `remote` into `dir` unless a checkout is already there.
pub async fn ensure_clone(remote: &str, dir: &Path) -> anyhow::Result<()> {
    if dir.join(".git").is_dir() {
        debug!(dir = %dir.display(), "catalog checkout already present");
        return Ok(());
    }
    info!(remote, dir = %dir.display(), "cloning catalog");
    let output = Command::new("git")
        .args(["clone", "--depth", "1", "--single-branch", remote])
        .arg(dir)
        .output()
        .await?;
    ensure!(
        output.status.success(),
        "git clone failed: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(())
}

/// Pull `dir` every `interval` until cancelled. The first pull happens
/// immediately.
pub async fn run(dir: PathBuf, interval: Duration, token: CancellationToken) {
    let mut delay = Duration::ZERO;
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        delay = interval;

        match pull(&dir).await {
            Ok(()) => debug!(dir = %dir.display(), "catalog synced"),
            Err(e) => warn!(dir = %dir.display(), error = %e, "catalog sync failed"),
        }
    }
}

async fn pull(dir: &Path) -> anyhow::Result<()> {
    let output =
        Command::new("git").arg("-C").arg(dir).args(["pull", "--ff-only"]).output().await?;
    ensure!(
        output.status.success(),
        "git pull failed: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(())
}

#[cfg(test)]
#[path = "gitsync_tests.rs"]
mod tests;
