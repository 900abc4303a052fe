//! Attachment blob stores.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use boac_core::storage::{AttachmentStore, RepositoryError, Result};

/// Stores attachments as files under a root directory. The path recorded on
/// a note is the storage key, relative to the root.
#[derive(Debug, Clone)]
pub struct FsAttachmentStore {
    root: PathBuf,
}

impl FsAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a key below the root. Keys that could escape it are rejected.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(RepositoryError::InvalidData(format!(
                "Invalid attachment path: {key}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(err: std::io::Error) -> RepositoryError {
    RepositoryError::QueryFailed(err.to_string())
}

#[async_trait]
impl AttachmentStore for FsAttachmentStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(&path, bytes).await.map_err(io_error)?;
        tracing::debug!(path = %path.display(), "Stored attachment");
        Ok(key.to_string())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(path)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(err)),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = self.resolve(path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed attachment");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(err)),
        }
    }
}

/// Keeps attachments in memory; used by handler tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttachmentStore {
    blobs: std::sync::Arc<tokio::sync::RwLock<std::collections::HashMap<String, Vec<u8>>>>,
}

#[cfg(test)]
#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        self.blobs.write().await.insert(key.to_string(), bytes);
        Ok(key.to_string())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(path).cloned())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.blobs.write().await.remove(path);
        Ok(())
    }
}
