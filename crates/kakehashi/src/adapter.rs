//! Adapter contract.
//!
//! Every storage backend implements [`Adapter`]. Paths handed to an adapter
//! are relative to its root; [`AdapterCore`] holds the prefix and root and
//! builds the root-prepended paths, descriptors and errors every adapter
//! shares.
//!
//! Adapters must translate every native failure into one [`FsError`] kind
//! and must run their existence checks before mutating anything.

use async_trait::async_trait;
use std::time::SystemTime;

use crate::error::{BoxError, FsError, FsResult};
use crate::model::{Directory, File};
use crate::path;

/// Capability contract implemented by every storage backend.
///
/// Implementations own their transport session and are shared behind
/// `Arc<dyn Adapter>`, so all methods take `&self`.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Registry key of this adapter.
    fn prefix(&self) -> &str;

    /// Absolute root that relative paths resolve against.
    fn root_path(&self) -> &str;

    // ========================================================================
    // Session
    // ========================================================================

    /// Establish the transport session. No-op when already connected.
    ///
    /// Adapters without a session keep this default.
    async fn connect(&self) -> FsResult<()> {
        Ok(())
    }

    /// Release the transport session.
    ///
    /// Operations after `dispose` are undefined for the caller.
    async fn dispose(&self) -> FsResult<()> {
        Ok(())
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Stat a file. A directory at `path` is reported as `FileNotFound`.
    async fn get_file(&self, path: &str) -> FsResult<File>;

    /// Stat a directory. A file at `path` is reported as `DirectoryNotFound`.
    async fn get_directory(&self, path: &str) -> FsResult<Directory>;

    /// List the files directly inside a directory.
    ///
    /// Validates `path` with [`get_directory`](Adapter::get_directory) first.
    async fn list_files(&self, path: &str) -> FsResult<Vec<File>>;

    /// List the directories directly inside a directory.
    ///
    /// Validates `path` with [`get_directory`](Adapter::get_directory) first.
    async fn list_directories(&self, path: &str) -> FsResult<Vec<Directory>>;

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Create an empty file. Fails with `FileAlreadyExists` if anything is
    /// already at `path`.
    async fn create_file(&self, path: &str) -> FsResult<File>;

    /// Create a directory and any missing parents.
    async fn create_directory(&self, path: &str) -> FsResult<()>;

    /// Delete a file after verifying it exists.
    async fn delete_file(&self, path: &str) -> FsResult<()>;

    /// Delete a directory after verifying it exists.
    async fn delete_directory(&self, path: &str, recursive: bool) -> FsResult<()>;

    /// Read a whole file after verifying it exists.
    async fn read_file(&self, path: &str) -> FsResult<Vec<u8>>;

    /// Write a whole file, replacing existing content.
    ///
    /// Without `overwrite`, an existing entry fails with `FileAlreadyExists`
    /// before anything is written.
    async fn write_file(&self, path: &str, contents: &[u8], overwrite: bool) -> FsResult<()>;

    /// Append to a file after verifying it exists.
    async fn append_file(&self, path: &str, contents: &[u8]) -> FsResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a file exists. Not-found kinds map to `false`.
    async fn file_exists(&self, path: &str) -> FsResult<bool> {
        exists(self.get_file(path).await)
    }

    /// Check if a directory exists. Not-found kinds map to `false`.
    async fn directory_exists(&self, path: &str) -> FsResult<bool> {
        exists(self.get_directory(path).await)
    }

    /// Read a whole file as UTF-8.
    async fn read_text_file(&self, path: &str) -> FsResult<String> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes).map_err(|e| {
            FsError::runtime(
                path::prepend_root_path(self.root_path(), path),
                self.prefix(),
                e,
            )
        })
    }

    /// Write a whole file from text.
    async fn write_text_file(&self, path: &str, contents: &str, overwrite: bool) -> FsResult<()> {
        self.write_file(path, contents.as_bytes(), overwrite).await
    }

    /// Append text to a file.
    async fn append_text_file(&self, path: &str, contents: &str) -> FsResult<()> {
        self.append_file(path, contents.as_bytes()).await
    }
}

fn exists<T>(result: FsResult<T>) -> FsResult<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Prefix, root and the helpers every adapter shares.
#[derive(Debug, Clone)]
pub struct AdapterCore {
    prefix: String,
    root_path: String,
}

impl AdapterCore {
    /// Create the shared state for an adapter.
    pub fn new(prefix: impl Into<String>, root_path: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            root_path: root_path.into(),
        }
    }

    /// Registry key.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Root path.
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Resolve a root-relative path to an absolute backend path.
    ///
    /// Fails with `InvalidPath` when `..` segments climb above the root.
    pub fn resolve(&self, path: &str) -> FsResult<String> {
        path::resolve_within_root(&self.root_path, path)
    }

    /// Virtual path for an absolute backend path.
    pub fn virtual_path(&self, absolute: &str) -> String {
        match path::relative_to_root(&self.root_path, absolute) {
            Some(relative) => path::to_virtual_path(&self.prefix, &relative),
            None => path::to_virtual_path(&self.prefix, absolute),
        }
    }

    /// Build a [`File`] descriptor.
    pub fn file(&self, absolute: &str, size: u64, last_modified: Option<SystemTime>) -> File {
        File {
            prefix: self.prefix.clone(),
            name: path::file_name(absolute).to_string(),
            path: absolute.to_string(),
            virtual_path: self.virtual_path(absolute),
            size,
            last_modified,
        }
    }

    /// Build a [`Directory`] descriptor.
    pub fn directory(&self, absolute: &str, last_modified: Option<SystemTime>) -> Directory {
        Directory {
            prefix: self.prefix.clone(),
            name: path::file_name(absolute).to_string(),
            path: absolute.to_string(),
            virtual_path: self.virtual_path(absolute),
            last_modified,
        }
    }

    pub fn file_not_found(&self, absolute: &str) -> FsError {
        FsError::file_not_found(absolute, &self.prefix)
    }

    pub fn directory_not_found(&self, absolute: &str) -> FsError {
        FsError::directory_not_found(absolute, &self.prefix)
    }

    pub fn file_already_exists(&self, absolute: &str) -> FsError {
        FsError::file_already_exists(absolute, &self.prefix)
    }

    pub fn runtime(&self, absolute: &str, source: impl Into<BoxError>) -> FsError {
        FsError::runtime(absolute, &self.prefix, source)
    }

    pub fn connection(&self, source: impl Into<BoxError>) -> FsError {
        FsError::connection(&self.prefix, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_descriptors() {
        let core = AdapterCore::new("local", "/data");
        let file = core.file("/data/sub/f.txt", 5, None);
        assert_eq!(file.name, "f.txt");
        assert_eq!(file.prefix, "local");
        assert_eq!(file.virtual_path, "local://sub/f.txt");

        let dir = core.directory("/data", None);
        assert_eq!(dir.name, "data");
        assert_eq!(dir.virtual_path, "local://");
    }

    #[test]
    fn test_core_resolve() {
        let core = AdapterCore::new("local", "/data/");
        assert_eq!(core.resolve("sub//f.txt").unwrap(), "/data/sub/f.txt");
        assert_eq!(core.resolve("").unwrap(), "/data");
        assert!(core.resolve("../secret").is_err());
    }
}
