// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem watcher translating notifications into catalog events.
//!
//! Two scopes are watched: `unsorted/` (service descriptors) and `tagged/`
//! (tag directories of symlinks, watched recursively so new tags are
//! covered). Events are not deduplicated or globally ordered; consumers
//! must be idempotent with respect to "already running" and "already
//! stopped" states.

use crate::error::CatalogError;
use crate::repo::{file_stem, Catalog};
use notify::event::ModifyKind;
use notify::{Event as FsEvent, EventKind, RecursiveMode, Watcher as _};
use ow_core::{ServiceId, Tag};
use std::path::Path;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Semantic change events derived from filesystem notifications under the
/// catalog root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    ServiceAdded { id: ServiceId },
    ServiceRemoved { id: ServiceId },
    ServiceUpdated { id: ServiceId },
    ServiceTagged { id: ServiceId, tag: Tag },
    ServiceUntagged { id: ServiceId, tag: Tag },
}

/// Which watched directory a raw notification came from.
#[derive(Debug, Clone, Copy)]
enum Scope {
    Unsorted,
    Tagged,
}

/// Watches a catalog directory and emits [`CatalogEvent`]s.
pub struct CatalogWatcher {
    catalog: Catalog,
}

impl CatalogWatcher {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Watch until cancellation.
    ///
    /// Returns `Ok(())` on cancellation (or when the receiving side goes
    /// away) and `Err` when the notification backend fails; the caller is
    /// expected to treat the latter as fatal and drain.
    pub async fn watch(
        self,
        token: CancellationToken,
        event_tx: mpsc::Sender<CatalogEvent>,
    ) -> Result<(), CatalogError> {
        let (raw_tx, mut raw_rx) = mpsc::channel::<(Scope, notify::Result<FsEvent>)>(64);

        // The notify callbacks run on the backend's own thread, so a
        // blocking bridge into the tokio channel is safe here.
        let tx = raw_tx.clone();
        let mut unsorted = notify::recommended_watcher(move |res: notify::Result<FsEvent>| {
            let _ = tx.blocking_send((Scope::Unsorted, res));
        })?;
        unsorted.watch(&self.catalog.unsorted_dir(), RecursiveMode::NonRecursive)?;

        let tx = raw_tx;
        let mut tagged = notify::recommended_watcher(move |res: notify::Result<FsEvent>| {
            let _ = tx.blocking_send((Scope::Tagged, res));
        })?;
        tagged.watch(&self.catalog.tagged_dir(), RecursiveMode::Recursive)?;

        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                raw = raw_rx.recv() => {
                    let Some((scope, res)) = raw else { return Ok(()) };
                    let fs_event = res?;
                    for event in self.translate(scope, &fs_event)? {
                        debug!(?event, "catalog change");
                        // Racing the send against cancellation keeps a full
                        // channel from wedging shutdown.
                        tokio::select! {
                            _ = token.cancelled() => return Ok(()),
                            sent = event_tx.send(event) => {
                                if sent.is_err() {
                                    return Ok(());
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Map one raw notification to zero or more catalog events.
    fn translate(
        &self,
        scope: Scope,
        fs_event: &FsEvent,
    ) -> Result<Vec<CatalogEvent>, CatalogError> {
        let mut events = Vec::new();
        for path in &fs_event.paths {
            match scope {
                Scope::Unsorted => self.translate_unsorted(&fs_event.kind, path, &mut events),
                Scope::Tagged => self.translate_tagged(&fs_event.kind, path, &mut events)?,
            }
        }
        Ok(events)
    }

    fn translate_unsorted(&self, kind: &EventKind, path: &Path, out: &mut Vec<CatalogEvent>) {
        let Some(id) = path_service_id(path) else { return };
        match kind {
            EventKind::Create(_) => out.push(CatalogEvent::ServiceAdded { id }),
            EventKind::Remove(_) => out.push(CatalogEvent::ServiceRemoved { id }),
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                out.push(CatalogEvent::ServiceUpdated { id })
            }
            _ => {}
        }
    }

    fn translate_tagged(
        &self,
        kind: &EventKind,
        path: &Path,
        out: &mut Vec<CatalogEvent>,
    ) -> Result<(), CatalogError> {
        let tagged_root = self.catalog.tagged_dir();

        // Event on a tag directory itself.
        if path.parent() == Some(tagged_root.as_path()) {
            let Some(tag) = path_tag(path) else { return Ok(()) };
            match kind {
                EventKind::Create(_) => {
                    // A symlink may land between the mkdir notification and
                    // the recursive watch picking the directory up, so
                    // enumerate the new tag immediately and emit a synthetic
                    // event per member. Duplicates are harmless downstream.
                    let ids = match self.catalog.list_services_with_tag(&tag) {
                        Ok(ids) => ids,
                        Err(e) if e.is_tag_not_found() => Vec::new(),
                        Err(e) => return Err(e),
                    };
                    for id in ids {
                        out.push(CatalogEvent::ServiceTagged { id, tag: tag.clone() });
                    }
                }
                // Removing a whole tag directory is not an untagging.
                EventKind::Remove(_) => {
                    debug!(%tag, "tag directory removed");
                }
                _ => {}
            }
            return Ok(());
        }

        // Event on a symlink inside a tag directory.
        let Some(parent) = path.parent() else { return Ok(()) };
        if parent.parent() != Some(tagged_root.as_path()) {
            debug!(path = %path.display(), "ignoring notification outside known scopes");
            return Ok(());
        }
        let (Some(tag), Some(id)) = (path_tag(parent), path_service_id(path)) else {
            return Ok(());
        };
        match kind {
            EventKind::Create(_) => out.push(CatalogEvent::ServiceTagged { id, tag }),
            EventKind::Remove(_) => out.push(CatalogEvent::ServiceUntagged { id, tag }),
            _ => {}
        }
        Ok(())
    }
}

/// Service ID from a descriptor or symlink filename.
fn path_service_id(path: &Path) -> Option<ServiceId> {
    let name = path.file_name()?.to_string_lossy();
    Some(ServiceId::new(file_stem(&name)))
}

/// Tag name from a tag directory path.
fn path_tag(path: &Path) -> Option<Tag> {
    Some(Tag::new(path.file_name()?.to_string_lossy().to_string()))
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
