//! Local filesystem adapter.
//!
//! Provides access to real filesystem paths under a root directory.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::adapter::{Adapter, AdapterCore};
use crate::error::FsResult;
use crate::model::{Directory, File};

/// Local filesystem adapter.
///
/// All operations are relative to the root. For example, if the root is
/// `/home/amy/project`, then `read_file("src/main.rs")` reads
/// `/home/amy/project/src/main.rs`.
///
/// Listings are sorted by name.
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    core: AdapterCore,
}

/// Returns true for io errors that mean "nothing usable at this path".
fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

impl LocalAdapter {
    /// Create a local adapter rooted at the given path.
    ///
    /// The root is canonicalized at construction time to handle symlinks
    /// (e.g. macOS `/tmp` → `/private/tmp`). A root that does not exist yet
    /// is kept as given.
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = dunce::canonicalize(&root).unwrap_or(root);
        Self {
            core: AdapterCore::new(prefix, root.to_string_lossy().into_owned()),
        }
    }

    /// Stat an absolute path, following symlinks. `Ok(None)` when missing.
    async fn stat(&self, full_path: &str) -> FsResult<Option<std::fs::Metadata>> {
        match fs::metadata(full_path).await {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(self.core.runtime(full_path, e)),
        }
    }

    /// Read a directory's children with their metadata.
    async fn read_children(&self, path: &str) -> FsResult<Vec<(String, std::fs::Metadata)>> {
        let dir = self.get_directory(path).await?;
        let mut dir_entries = fs::read_dir(&dir.path)
            .await
            .map_err(|e| self.core.runtime(&dir.path, e))?;

        let mut children = Vec::new();
        while let Some(entry) = dir_entries
            .next_entry()
            .await
            .map_err(|e| self.core.runtime(&dir.path, e))?
        {
            let child = entry.path().to_string_lossy().into_owned();
            match fs::metadata(&child).await {
                Ok(meta) => children.push((child, meta)),
                // Dangling symlink: nothing to report.
                Err(e) if is_missing(&e) => {
                    tracing::debug!(path = %child, "skipping dangling entry");
                }
                Err(e) => return Err(self.core.runtime(&child, e)),
            }
        }

        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children)
    }

    async fn ensure_parent(&self, full_path: &str) -> FsResult<()> {
        if let Some(parent) = std::path::Path::new(full_path).parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.core.runtime(full_path, e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Adapter for LocalAdapter {
    fn prefix(&self) -> &str {
        self.core.prefix()
    }

    fn root_path(&self) -> &str {
        self.core.root_path()
    }

    async fn get_file(&self, path: &str) -> FsResult<File> {
        let full_path = self.core.resolve(path)?;
        match self.stat(&full_path).await? {
            Some(meta) if meta.is_file() => {
                Ok(self.core.file(&full_path, meta.len(), meta.modified().ok()))
            }
            _ => Err(self.core.file_not_found(&full_path)),
        }
    }

    async fn get_directory(&self, path: &str) -> FsResult<Directory> {
        let full_path = self.core.resolve(path)?;
        match self.stat(&full_path).await? {
            Some(meta) if meta.is_dir() => Ok(self.core.directory(&full_path, meta.modified().ok())),
            _ => Err(self.core.directory_not_found(&full_path)),
        }
    }

    async fn list_files(&self, path: &str) -> FsResult<Vec<File>> {
        Ok(self
            .read_children(path)
            .await?
            .into_iter()
            .filter(|(_, meta)| meta.is_file())
            .map(|(child, meta)| self.core.file(&child, meta.len(), meta.modified().ok()))
            .collect())
    }

    async fn list_directories(&self, path: &str) -> FsResult<Vec<Directory>> {
        Ok(self
            .read_children(path)
            .await?
            .into_iter()
            .filter(|(_, meta)| meta.is_dir())
            .map(|(child, meta)| self.core.directory(&child, meta.modified().ok()))
            .collect())
    }

    async fn create_file(&self, path: &str) -> FsResult<File> {
        let full_path = self.core.resolve(path)?;
        if self.stat(&full_path).await?.is_some() {
            return Err(self.core.file_already_exists(&full_path));
        }
        self.ensure_parent(&full_path).await?;

        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => self.core.file_already_exists(&full_path),
                _ => self.core.runtime(&full_path, e),
            })?;

        self.get_file(path).await
    }

    async fn create_directory(&self, path: &str) -> FsResult<()> {
        let full_path = self.core.resolve(path)?;
        fs::create_dir_all(&full_path)
            .await
            .map_err(|e| self.core.runtime(&full_path, e))
    }

    async fn delete_file(&self, path: &str) -> FsResult<()> {
        let file = self.get_file(path).await?;
        fs::remove_file(&file.path)
            .await
            .map_err(|e| self.core.runtime(&file.path, e))
    }

    async fn delete_directory(&self, path: &str, recursive: bool) -> FsResult<()> {
        let dir = self.get_directory(path).await?;
        if dir.path == self.core.resolve("")? {
            return Err(self.core.runtime(&dir.path, "cannot remove the adapter root"));
        }
        let result = if recursive {
            fs::remove_dir_all(&dir.path).await
        } else {
            fs::remove_dir(&dir.path).await
        };
        result.map_err(|e| self.core.runtime(&dir.path, e))
    }

    async fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        let file = self.get_file(path).await?;
        fs::read(&file.path)
            .await
            .map_err(|e| self.core.runtime(&file.path, e))
    }

    async fn write_file(&self, path: &str, contents: &[u8], overwrite: bool) -> FsResult<()> {
        let full_path = self.core.resolve(path)?;
        if !overwrite && self.stat(&full_path).await?.is_some() {
            return Err(self.core.file_already_exists(&full_path));
        }
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, contents)
            .await
            .map_err(|e| self.core.runtime(&full_path, e))
    }

    async fn append_file(&self, path: &str, contents: &[u8]) -> FsResult<()> {
        let file = self.get_file(path).await?;

        let mut handle = fs::OpenOptions::new()
            .append(true)
            .open(&file.path)
            .await
            .map_err(|e| self.core.runtime(&file.path, e))?;

        handle
            .write_all(contents)
            .await
            .map_err(|e| self.core.runtime(&file.path, e))?;
        handle
            .flush()
            .await
            .map_err(|e| self.core.runtime(&file.path, e))
    }
}
