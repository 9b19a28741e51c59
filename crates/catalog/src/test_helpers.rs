// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for catalog tests: build a real catalog in a tempdir.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub(crate) struct TempCatalog {
    dir: TempDir,
}

impl TempCatalog {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".onionwatch"), "").unwrap();
        std::fs::create_dir(dir.path().join("unsorted")).unwrap();
        std::fs::create_dir(dir.path().join("tagged")).unwrap();
        Self { dir }
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn service_path(&self, id: &str) -> PathBuf {
        self.dir.path().join("unsorted").join(format!("{id}.yaml"))
    }

    pub(crate) fn write_service(&self, id: &str, urls: &[&str]) {
        let mut body = format!("name: {id}\nurls:\n");
        for url in urls {
            body.push_str(&format!("  - {url}\n"));
        }
        std::fs::write(self.service_path(id), body).unwrap();
    }

    pub(crate) fn remove_service(&self, id: &str) {
        std::fs::remove_file(self.service_path(id)).unwrap();
    }

    pub(crate) fn tag(&self, id: &str, tag: &str) {
        let tag_dir = self.dir.path().join("tagged").join(tag);
        if !tag_dir.is_dir() {
            std::fs::create_dir(&tag_dir).unwrap();
        }
        let link = tag_dir.join(format!("{id}.yaml"));
        let target = Path::new("../../unsorted").join(format!("{id}.yaml"));
        #[cfg(unix)]
        std::os::unix::fs::symlink(target, link).unwrap();
        #[cfg(not(unix))]
        std::fs::write(link, target.display().to_string()).unwrap();
    }

    pub(crate) fn untag(&self, id: &str, tag: &str) {
        let link = self.dir.path().join("tagged").join(tag).join(format!("{id}.yaml"));
        std::fs::remove_file(link).unwrap();
    }
}
