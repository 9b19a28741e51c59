// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog directory reader.

use crate::error::CatalogError;
use ow_core::{ServiceId, Tag};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Marker file identifying the catalog root.
const CAIRN_NAME: &str = ".onionwatch";

/// On-disk format of service descriptors.
const SERVICE_EXT: &str = "yaml";

/// How far `open` walks up looking for the cairn.
const MAX_DEPTH: usize = 8;

/// A service descriptor as read from `unsorted/<id>.yaml`.
///
/// Only `urls` is consumed by the scanner; the remaining fields exist for
/// the HTTP facade.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Read-only handle on a catalog directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    dir: PathBuf,
}

impl Catalog {
    /// Open `dir` as a catalog, walking up a bounded number of parent
    /// directories to find the cairn file. Fails with
    /// [`CatalogError::NotACatalog`] when no cairn is found.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let start = dir.as_ref().to_path_buf();
        let mut current = start.clone();
        for _ in 0..MAX_DEPTH {
            if !current.is_dir() {
                break;
            }
            if current.join(CAIRN_NAME).is_file() {
                return Ok(Self { dir: current });
            }
            match current.parent() {
                Some(parent) if parent != current => current = parent.to_path_buf(),
                _ => break,
            }
        }
        Err(CatalogError::NotACatalog(start))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn unsorted_dir(&self) -> PathBuf {
        self.dir.join("unsorted")
    }

    pub fn tagged_dir(&self) -> PathBuf {
        self.dir.join("tagged")
    }

    /// Sorted IDs of every service in the catalog.
    pub fn list_services(&self) -> Result<Vec<ServiceId>, CatalogError> {
        let mut ids = read_dir_ids(&self.unsorted_dir())?;
        ids.sort();
        Ok(ids.into_iter().map(ServiceId::new).collect())
    }

    /// Sorted names of every tag directory.
    pub fn list_tags(&self) -> Result<Vec<Tag>, CatalogError> {
        let mut names = read_dir_ids(&self.tagged_dir())?;
        names.sort();
        Ok(names.into_iter().map(Tag::new).collect())
    }

    /// Sorted IDs of services carrying `tag`.
    ///
    /// A missing tag directory is [`CatalogError::TagNotFound`]; callers
    /// that want "missing tag = empty list" check
    /// [`CatalogError::is_tag_not_found`].
    pub fn list_services_with_tag(&self, tag: &Tag) -> Result<Vec<ServiceId>, CatalogError> {
        let dir = self.tagged_dir().join(tag.as_str());
        let mut ids = match read_dir_ids(&dir) {
            Ok(ids) => ids,
            Err(CatalogError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::TagNotFound(tag.clone()));
            }
            Err(e) => return Err(e),
        };
        ids.sort();
        Ok(ids.into_iter().map(ServiceId::new).collect())
    }

    /// Read and parse the descriptor of service `id`.
    pub fn get_service(&self, id: &ServiceId) -> Result<ServiceRecord, CatalogError> {
        let path = self.service_path(id);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::ServiceNotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_yaml::from_str(&data)
            .map_err(|source| CatalogError::InvalidService { id: id.clone(), source })
    }

    /// Path of the descriptor file for service `id`.
    pub fn service_path(&self, id: &ServiceId) -> PathBuf {
        self.unsorted_dir().join(format!("{}.{}", id, SERVICE_EXT))
    }
}

/// File stems of the entries of `dir`.
fn read_dir_ids(dir: &Path) -> Result<Vec<String>, CatalogError> {
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        ids.push(file_stem(&entry.file_name().to_string_lossy()));
    }
    Ok(ids)
}

/// Strip a trailing extension, mirroring how descriptor filenames map to
/// service IDs.
pub(crate) fn file_stem(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
