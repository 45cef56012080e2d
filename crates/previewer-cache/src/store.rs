//! Blob files under the cache root directory

use crate::error::{CacheError, Result};
use crate::types::{is_blob_name, AccessMode};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

const STAGING_PREFIX: &str = ".tmp-";

/// Flat directory of blobs named by cache key
#[derive(Debug)]
pub(crate) struct BlobStore {
    root: PathBuf,
    staging_seq: AtomicU64,
}

impl BlobStore {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self {
            root,
            staging_seq: AtomicU64::new(0),
        }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Resolve a blob name to its path, rejecting anything that is not a plain file name
    pub(crate) fn path(&self, name: &str) -> Result<PathBuf> {
        if !is_blob_name(name) {
            return Err(CacheError::InvalidKey(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    /// Create an empty blob unless one already exists.
    ///
    /// Returns `true` when a new file was created.
    pub(crate) async fn create(&self, name: &str) -> Result<bool> {
        let path = self.path(name)?;
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => {
                debug!(path = ?path, "Created blob file");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob; a blob that is already gone counts as deleted
    pub(crate) async fn remove(&self, name: &str) -> Result<()> {
        let path = self.path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = ?path, "Removed blob file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?path, "Blob file already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) async fn open(&self, name: &str, mode: AccessMode) -> Result<File> {
        let path = self.path(name)?;
        debug!(path = ?path, mode = ?mode, "Opening blob file");
        let file = match mode {
            AccessMode::Read => File::open(&path).await?,
            AccessMode::Append => OpenOptions::new().append(true).open(&path).await?,
        };
        Ok(file)
    }

    pub(crate) async fn exists(&self, name: &str) -> bool {
        let Ok(path) = self.path(name) else {
            return false;
        };
        fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// Write `data` to a hidden staging file next to the blobs
    pub(crate) async fn stage(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let seq = self.staging_seq.fetch_add(1, Ordering::Relaxed);
        let staged = self
            .root
            .join(format!("{}{}-{}", STAGING_PREFIX, name, seq));

        let write = async {
            let mut file = File::create(&staged).await?;
            file.write_all(data).await?;
            file.sync_all().await
        };
        if let Err(e) = write.await {
            self.discard(&staged).await;
            return Err(e.into());
        }

        debug!(path = ?staged, size = data.len(), "Staged blob");
        Ok(staged)
    }

    /// Atomically move a staged file into place as blob `name`
    pub(crate) async fn commit(&self, staged: &Path, name: &str) -> Result<()> {
        let path = self.path(name)?;
        if let Err(e) = fs::rename(staged, &path).await {
            self.discard(staged).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn discard(&self, staged: &Path) {
        if let Err(e) = fs::remove_file(staged).await {
            debug!(path = ?staged, error = %e, "Failed to discard staged blob");
        }
    }

    /// Delete the whole root directory; a missing root is not an error
    pub(crate) async fn remove_all(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Names of the regular, non-hidden files in the root, in enumeration order
    pub(crate) async fn scan(&self) -> Result<Vec<String>> {
        let reconcile = |e: std::io::Error| CacheError::Reconcile(Box::new(e));

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await.map_err(reconcile)?;
        while let Some(entry) = entries.next_entry().await.map_err(reconcile)? {
            if !entry.file_type().await.map_err(reconcile)?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if is_blob_name(&name) => names.push(name),
                Ok(_) => {}
                Err(name) => debug!(name = ?name, "Skipping non UTF-8 file name"),
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_skips_existing_file() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        std::fs::write(dir.path().join("abc"), b"payload").unwrap();

        assert!(!store.create("abc").await.unwrap());
        assert_eq!(std::fs::read(dir.path().join("abc")).unwrap(), b"payload");

        assert!(store.create("def").await.unwrap());
        assert!(store.exists("def").await);
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_ok() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        store.remove("never-created").await.unwrap();
    }

    #[tokio::test]
    async fn test_path_rejects_traversal() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        assert!(matches!(
            store.path("../outside"),
            Err(CacheError::InvalidKey(_))
        ));
        assert!(!store.exists("../outside").await);
    }

    #[tokio::test]
    async fn test_stage_and_commit() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let staged = store.stage("abc", b"encoded").await.unwrap();
        assert!(staged
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap()
            .starts_with(STAGING_PREFIX));

        store.commit(&staged, "abc").await.unwrap();
        assert!(!staged.exists());
        assert_eq!(std::fs::read(dir.path().join("abc")).unwrap(), b"encoded");
    }

    #[tokio::test]
    async fn test_scan_skips_hidden_files_and_directories() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        std::fs::write(dir.path().join("visible"), b"").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(store.scan().await.unwrap(), vec!["visible".to_string()]);
    }

    #[tokio::test]
    async fn test_scan_missing_root_is_reconcile_error() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("missing"));

        assert!(matches!(store.scan().await, Err(CacheError::Reconcile(_))));
    }

    #[tokio::test]
    async fn test_remove_all() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("cache");
        let store = BlobStore::new(root.clone());
        store.ensure_root().await.unwrap();
        store.create("abc").await.unwrap();

        store.remove_all().await.unwrap();
        assert!(!root.exists());

        // Second call on a missing root is fine
        store.remove_all().await.unwrap();
    }
}
