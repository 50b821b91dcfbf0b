//! Access to the on-disk contents of resolved packages

use crate::error::{AuditError, Result};
use crate::types::Locator;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only view of the files of one package
#[async_trait]
pub trait PackageFiles: Send + Sync {
    /// Read a UTF-8 file relative to the package root
    async fn read_file(&self, relative_path: &str) -> Result<String>;
}

/// Produces a file view for a resolved package
#[async_trait]
pub trait PackageFetcher: Send + Sync {
    type Files: PackageFiles;

    async fn fetch(&self, locator: &Locator) -> Result<Self::Files>;
}

/// Package files backed by a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct DirectoryFiles {
    root: PathBuf,
}

impl DirectoryFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl PackageFiles for DirectoryFiles {
    async fn read_file(&self, relative_path: &str) -> Result<String> {
        let path = self.root.join(relative_path);
        debug!("Reading {}", path.display());

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AuditError::FileNotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
