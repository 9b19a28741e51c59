// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog errors.

use ow_core::{ServiceId, Tag};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from catalog reads and the catalog watcher.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("directory `{0}` is not a service catalog")]
    NotACatalog(PathBuf),

    #[error("service `{0}` does not exist")]
    ServiceNotFound(ServiceId),

    #[error("tag `{0}` does not exist")]
    TagNotFound(Tag),

    #[error("service `{id}` is not a valid descriptor: {source}")]
    InvalidService {
        id: ServiceId,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("filesystem watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Whether this is the missing-tag case, which list consumers treat as
    /// an empty set rather than a failure.
    pub fn is_tag_not_found(&self) -> bool {
        matches!(self, CatalogError::TagNotFound(_))
    }
}
