//! In-memory adapter.
//!
//! Used for scratch space and testing. All data is ephemeral.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::adapter::{Adapter, AdapterCore};
use crate::error::FsResult;
use crate::model::{Directory, File};
use crate::path;

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, mtime: SystemTime },
    Directory { mtime: SystemTime },
}

/// Error raised for operations the in-memory store refuses.
#[derive(Debug, thiserror::Error)]
enum MemoryError {
    #[error("directory not empty")]
    DirectoryNotEmpty,
    #[error("cannot remove the root directory")]
    RemoveRoot,
    #[error("a file exists at '{0}'")]
    FileInTheWay(String),
}

/// In-memory adapter.
///
/// Entries are keyed by their absolute path under the root. Thread-safe via
/// an internal `RwLock`; all data is lost on [`dispose`](Adapter::dispose)
/// or drop. Listings are sorted by name.
#[derive(Debug)]
pub struct MemoryAdapter {
    core: AdapterCore,
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryAdapter {
    /// Create an empty in-memory adapter rooted at `/`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_root(prefix, "/")
    }

    /// Create an empty in-memory adapter with the given root.
    pub fn with_root(prefix: impl Into<String>, root: impl Into<String>) -> Self {
        let core = AdapterCore::new(prefix, root);
        let root = path::prepend_root_path(core.root_path(), "");
        let mut entries = BTreeMap::new();
        // Root directory always exists
        entries.insert(
            root,
            Entry::Directory {
                mtime: SystemTime::now(),
            },
        );
        Self {
            core,
            entries: RwLock::new(entries),
        }
    }

    fn root_key(&self) -> String {
        path::prepend_root_path(self.core.root_path(), "")
    }

    /// Direct children of `dir`, in key order.
    fn children(entries: &BTreeMap<String, Entry>, dir: &str) -> Vec<(String, Entry)> {
        entries
            .iter()
            .filter(|(key, _)| key.as_str() != dir && path::parent(key).as_deref() == Some(dir))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Create every missing ancestor of `full_path`, up to the root.
    fn ensure_parents(&self, entries: &mut BTreeMap<String, Entry>, full_path: &str) -> FsResult<()> {
        let root = self.root_key();
        let mut missing = Vec::new();
        let mut current = path::parent(full_path);
        while let Some(dir) = current {
            match entries.get(&dir) {
                Some(Entry::Directory { .. }) => break,
                Some(Entry::File { .. }) => {
                    return Err(self.core.runtime(full_path, MemoryError::FileInTheWay(dir)));
                }
                None => {
                    let at_root = dir == root;
                    current = path::parent(&dir);
                    missing.push(dir);
                    if at_root {
                        break;
                    }
                }
            }
        }

        let now = SystemTime::now();
        for dir in missing {
            entries.insert(dir, Entry::Directory { mtime: now });
        }
        Ok(())
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    fn prefix(&self) -> &str {
        self.core.prefix()
    }

    fn root_path(&self) -> &str {
        self.core.root_path()
    }

    async fn dispose(&self) -> FsResult<()> {
        let root = self.root_key();
        self.entries.write().retain(|key, _| *key == root);
        tracing::debug!(prefix = self.core.prefix(), "memory adapter cleared");
        Ok(())
    }

    async fn get_file(&self, path: &str) -> FsResult<File> {
        let full_path = self.core.resolve(path)?;
        let entries = self.entries.read();
        match entries.get(&full_path) {
            Some(Entry::File { data, mtime }) => {
                Ok(self.core.file(&full_path, data.len() as u64, Some(*mtime)))
            }
            _ => Err(self.core.file_not_found(&full_path)),
        }
    }

    async fn get_directory(&self, path: &str) -> FsResult<Directory> {
        let full_path = self.core.resolve(path)?;
        let entries = self.entries.read();
        match entries.get(&full_path) {
            Some(Entry::Directory { mtime }) => Ok(self.core.directory(&full_path, Some(*mtime))),
            _ => Err(self.core.directory_not_found(&full_path)),
        }
    }

    async fn list_files(&self, path: &str) -> FsResult<Vec<File>> {
        let dir = self.get_directory(path).await?;
        let entries = self.entries.read();
        Ok(Self::children(&entries, &dir.path)
            .into_iter()
            .filter_map(|(key, entry)| match entry {
                Entry::File { data, mtime } => {
                    Some(self.core.file(&key, data.len() as u64, Some(mtime)))
                }
                Entry::Directory { .. } => None,
            })
            .collect())
    }

    async fn list_directories(&self, path: &str) -> FsResult<Vec<Directory>> {
        let dir = self.get_directory(path).await?;
        let entries = self.entries.read();
        Ok(Self::children(&entries, &dir.path)
            .into_iter()
            .filter_map(|(key, entry)| match entry {
                Entry::Directory { mtime } => Some(self.core.directory(&key, Some(mtime))),
                Entry::File { .. } => None,
            })
            .collect())
    }

    async fn create_file(&self, path: &str) -> FsResult<File> {
        let full_path = self.core.resolve(path)?;
        let mut entries = self.entries.write();
        if entries.contains_key(&full_path) {
            return Err(self.core.file_already_exists(&full_path));
        }
        self.ensure_parents(&mut entries, &full_path)?;

        let mtime = SystemTime::now();
        entries.insert(
            full_path.clone(),
            Entry::File {
                data: Vec::new(),
                mtime,
            },
        );
        Ok(self.core.file(&full_path, 0, Some(mtime)))
    }

    async fn create_directory(&self, path: &str) -> FsResult<()> {
        let full_path = self.core.resolve(path)?;
        let mut entries = self.entries.write();

        // Check if something already exists
        match entries.get(&full_path) {
            Some(Entry::Directory { .. }) => return Ok(()),
            Some(Entry::File { .. }) => {
                return Err(self
                    .core
                    .runtime(&full_path, MemoryError::FileInTheWay(full_path.clone())));
            }
            None => {}
        }

        self.ensure_parents(&mut entries, &full_path)?;
        entries.insert(
            full_path,
            Entry::Directory {
                mtime: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> FsResult<()> {
        let file = self.get_file(path).await?;
        self.entries.write().remove(&file.path);
        Ok(())
    }

    async fn delete_directory(&self, path: &str, recursive: bool) -> FsResult<()> {
        let dir = self.get_directory(path).await?;
        if dir.path == self.root_key() {
            return Err(self.core.runtime(&dir.path, MemoryError::RemoveRoot));
        }

        let mut entries = self.entries.write();
        let sep = path::detect_separator(&dir.path).as_char();
        let nested = format!("{}{}", dir.path, sep);
        let descendants: Vec<String> = entries
            .keys()
            .filter(|key| key.starts_with(&nested))
            .cloned()
            .collect();

        if !descendants.is_empty() && !recursive {
            return Err(self.core.runtime(&dir.path, MemoryError::DirectoryNotEmpty));
        }

        for key in descendants {
            entries.remove(&key);
        }
        entries.remove(&dir.path);
        Ok(())
    }

    async fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        let full_path = self.core.resolve(path)?;
        let entries = self.entries.read();
        match entries.get(&full_path) {
            Some(Entry::File { data, .. }) => Ok(data.clone()),
            _ => Err(self.core.file_not_found(&full_path)),
        }
    }

    async fn write_file(&self, path: &str, contents: &[u8], overwrite: bool) -> FsResult<()> {
        let full_path = self.core.resolve(path)?;
        let mut entries = self.entries.write();

        match entries.get(&full_path) {
            Some(_) if !overwrite => return Err(self.core.file_already_exists(&full_path)),
            Some(Entry::Directory { .. }) => {
                return Err(self
                    .core
                    .runtime(&full_path, MemoryError::FileInTheWay(full_path.clone())));
            }
            _ => {}
        }

        self.ensure_parents(&mut entries, &full_path)?;
        entries.insert(
            full_path,
            Entry::File {
                data: contents.to_vec(),
                mtime: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn append_file(&self, path: &str, contents: &[u8]) -> FsResult<()> {
        let full_path = self.core.resolve(path)?;
        let mut entries = self.entries.write();
        match entries.get_mut(&full_path) {
            Some(Entry::File { data, mtime }) => {
                data.extend_from_slice(contents);
                *mtime = SystemTime::now();
                Ok(())
            }
            _ => Err(self.core.file_not_found(&full_path)),
        }
    }
}
