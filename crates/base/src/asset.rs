// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use crate::util::{look_for_file, uri2fname};

/// File extensions tried (in this order)
/// when looking up an asset in a [`DirRepository`].
pub const ASSET_FILE_EXTS: [&str; 2] = ["jsonld", "json"];

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No asset is available for '{uri}'")]
    NotFound { uri: String },

    #[error("Failed to read the asset for '{uri}' from '{}': {from}", .file.display())]
    Read {
        uri: String,
        file: PathBuf,
        from: io::Error,
    },
}

/// Loads raw context/vocabulary documents by URI.
///
/// The engine itself never does any I/O;
/// everything external comes in through an implementation of this.
pub trait AssetRepository: Send + Sync {
    /// Loads the raw bytes of the asset identified by `uri`.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if there is no asset for the given URI
    /// - `Error::Read` if the asset exists but could not be read
    fn load(&self, uri: &str) -> Result<Vec<u8>, Error>;
}

/// Serves assets from a local directory.
///
/// The URI `http://example.org/ctx/v1` is looked up as
/// `<root>/http_example_org_ctx_v1.jsonld`,
/// and if that does not exist, as `<root>/http_example_org_ctx_v1.json`.
#[derive(Clone, Debug)]
pub struct DirRepository {
    root: PathBuf,
}

impl DirRepository {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// All the file paths that are tried for the given URI, in order.
    #[must_use]
    pub fn candidate_files(&self, uri: &str) -> Vec<PathBuf> {
        let fname = uri2fname(uri);
        ASSET_FILE_EXTS
            .iter()
            .map(|ext| self.root.join(format!("{fname}.{ext}")))
            .collect()
    }
}

impl AssetRepository for DirRepository {
    fn load(&self, uri: &str) -> Result<Vec<u8>, Error> {
        for file in self.candidate_files(uri) {
            let exists = look_for_file(&file).map_err(|from| Error::Read {
                uri: uri.to_owned(),
                file: file.clone(),
                from,
            })?;
            if exists {
                tracing::debug!("Loading asset '{uri}' from '{}'", file.display());
                return std::fs::read(&file).map_err(|from| Error::Read {
                    uri: uri.to_owned(),
                    file,
                    from,
                });
            }
        }
        Err(Error::NotFound {
            uri: uri.to_owned(),
        })
    }
}

/// Serves assets from memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryRepository {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<U: Into<String>, C: Into<Vec<u8>>>(&mut self, uri: U, content: C) {
        self.assets.insert(uri.into(), content.into());
    }

    #[must_use]
    pub fn with<U: Into<String>, C: Into<Vec<u8>>>(mut self, uri: U, content: C) -> Self {
        self.insert(uri, content);
        self
    }
}

impl AssetRepository for MemoryRepository {
    fn load(&self, uri: &str) -> Result<Vec<u8>, Error> {
        self.assets.get(uri).cloned().ok_or_else(|| Error::NotFound {
            uri: uri.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_repository() {
        let repo = MemoryRepository::new().with("http://example.org/ctx", "{}");
        assert_eq!(repo.load("http://example.org/ctx").unwrap(), b"{}");
        assert!(matches!(
            repo.load("http://example.org/other"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn dir_repository_prefers_jsonld() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("http_example_org_ctx.json"), "plain").unwrap();
        let repo = DirRepository::new(dir.path());
        assert_eq!(repo.load("http://example.org/ctx").unwrap(), b"plain");

        std::fs::write(dir.path().join("http_example_org_ctx.jsonld"), "ld").unwrap();
        assert_eq!(repo.load("http://example.org/ctx").unwrap(), b"ld");
    }

    #[test]
    fn dir_repository_missing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DirRepository::new(dir.path());
        assert!(matches!(
            repo.load("http://example.org/nothing"),
            Err(Error::NotFound { .. })
        ));
    }
}
