//! Prefix-routed virtual filesystem.
//!
//! Routes virtual-path operations to registered adapters.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::adapter::Adapter;
use crate::error::{FsError, FsResult};
use crate::model::{Directory, File};
use crate::path::{self, DELIMITER};

/// Registration failure.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Another adapter already holds this prefix.
    #[error("prefix '{0}' is already registered")]
    DuplicatePrefix(String),

    /// Prefix is empty or contains the delimiter.
    #[error("invalid prefix '{0}'")]
    InvalidPrefix(String),

    /// Default prefix names no registered adapter.
    #[error("default prefix '{0}' is not registered")]
    UnknownDefault(String),
}

/// Routes filesystem operations to adapters by virtual-path prefix.
///
/// A virtual path `local://sub/f.txt` is split on the first `://`; the
/// adapter registered as `local` receives `sub/f.txt`. Bare paths route to
/// the default adapter when one is designated and fail with
/// [`FsError::InvalidPath`] otherwise.
///
/// The registry is filled through `&mut self` at startup; share the
/// finished `FileSystem` behind an `Arc` to freeze it. Every operation calls
/// the adapter's idempotent `connect` before dispatching, so sessions open
/// lazily on first use.
#[derive(Default)]
pub struct FileSystem {
    adapters: HashMap<String, Arc<dyn Adapter>>,
    default_prefix: Option<String>,
}

impl std::fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystem")
            .field("prefixes", &self.prefixes())
            .field("default_prefix", &self.default_prefix)
            .finish()
    }
}

impl FileSystem {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own prefix.
    pub fn register(&mut self, adapter: impl Adapter + 'static) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(adapter))
    }

    /// Register an adapter (already wrapped in Arc) under its own prefix.
    pub fn register_arc(&mut self, adapter: Arc<dyn Adapter>) -> Result<(), RegistryError> {
        let prefix = adapter.prefix().to_string();
        if prefix.is_empty() || prefix.contains(DELIMITER) {
            return Err(RegistryError::InvalidPrefix(prefix));
        }
        if self.adapters.contains_key(&prefix) {
            return Err(RegistryError::DuplicatePrefix(prefix));
        }

        tracing::info!(
            prefix = %prefix,
            root = adapter.root_path(),
            "registered adapter"
        );
        self.adapters.insert(prefix, adapter);
        Ok(())
    }

    /// Designate the adapter that bare (prefix-less) paths route to.
    pub fn set_default_prefix(&mut self, prefix: impl Into<String>) -> Result<(), RegistryError> {
        let prefix = prefix.into();
        if !self.adapters.contains_key(&prefix) {
            return Err(RegistryError::UnknownDefault(prefix));
        }
        self.default_prefix = Some(prefix);
        Ok(())
    }

    /// Builder form of [`FileSystem::set_default_prefix`].
    pub fn with_default_prefix(mut self, prefix: impl Into<String>) -> Result<Self, RegistryError> {
        self.set_default_prefix(prefix)?;
        Ok(self)
    }

    /// The default prefix, if any.
    pub fn default_prefix(&self) -> Option<&str> {
        self.default_prefix.as_deref()
    }

    /// Look up an adapter by prefix.
    pub fn adapter(&self, prefix: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(prefix).cloned()
    }

    /// All registered prefixes, sorted.
    pub fn prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<_> = self.adapters.keys().map(String::as_str).collect();
        prefixes.sort_unstable();
        prefixes
    }

    /// Find the adapter for a virtual path.
    ///
    /// Returns the adapter and the path relative to its root. Touches no
    /// adapter.
    pub fn route<'a>(&self, virtual_path: &'a str) -> FsResult<(Arc<dyn Adapter>, &'a str)> {
        let (prefix, relative) = path::strip_prefix(virtual_path, self.default_prefix.as_deref())?;
        match self.adapters.get(prefix) {
            Some(adapter) => Ok((Arc::clone(adapter), relative)),
            None => Err(FsError::invalid_path(
                virtual_path,
                format!("no adapter registered for prefix '{}'", prefix),
            )),
        }
    }

    /// Route, then make sure the adapter is connected.
    async fn dispatch<'a>(
        &self,
        op: &'static str,
        virtual_path: &'a str,
    ) -> FsResult<(Arc<dyn Adapter>, &'a str)> {
        let (adapter, relative) = self.route(virtual_path)?;
        tracing::debug!(op, prefix = adapter.prefix(), path = relative, "dispatch");
        adapter.connect().await?;
        Ok((adapter, relative))
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub async fn get_file(&self, virtual_path: &str) -> FsResult<File> {
        let (adapter, relative) = self.dispatch("get_file", virtual_path).await?;
        adapter.get_file(relative).await
    }

    pub async fn get_directory(&self, virtual_path: &str) -> FsResult<Directory> {
        let (adapter, relative) = self.dispatch("get_directory", virtual_path).await?;
        adapter.get_directory(relative).await
    }

    pub async fn list_files(&self, virtual_path: &str) -> FsResult<Vec<File>> {
        let (adapter, relative) = self.dispatch("list_files", virtual_path).await?;
        adapter.list_files(relative).await
    }

    pub async fn list_directories(&self, virtual_path: &str) -> FsResult<Vec<Directory>> {
        let (adapter, relative) = self.dispatch("list_directories", virtual_path).await?;
        adapter.list_directories(relative).await
    }

    pub async fn file_exists(&self, virtual_path: &str) -> FsResult<bool> {
        let (adapter, relative) = self.dispatch("file_exists", virtual_path).await?;
        adapter.file_exists(relative).await
    }

    pub async fn directory_exists(&self, virtual_path: &str) -> FsResult<bool> {
        let (adapter, relative) = self.dispatch("directory_exists", virtual_path).await?;
        adapter.directory_exists(relative).await
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    pub async fn create_file(&self, virtual_path: &str) -> FsResult<File> {
        let (adapter, relative) = self.dispatch("create_file", virtual_path).await?;
        adapter.create_file(relative).await
    }

    pub async fn create_directory(&self, virtual_path: &str) -> FsResult<()> {
        let (adapter, relative) = self.dispatch("create_directory", virtual_path).await?;
        adapter.create_directory(relative).await
    }

    pub async fn delete_file(&self, virtual_path: &str) -> FsResult<()> {
        let (adapter, relative) = self.dispatch("delete_file", virtual_path).await?;
        adapter.delete_file(relative).await
    }

    pub async fn delete_directory(&self, virtual_path: &str, recursive: bool) -> FsResult<()> {
        let (adapter, relative) = self.dispatch("delete_directory", virtual_path).await?;
        adapter.delete_directory(relative, recursive).await
    }

    pub async fn read_file(&self, virtual_path: &str) -> FsResult<Vec<u8>> {
        let (adapter, relative) = self.dispatch("read_file", virtual_path).await?;
        adapter.read_file(relative).await
    }

    pub async fn read_text_file(&self, virtual_path: &str) -> FsResult<String> {
        let (adapter, relative) = self.dispatch("read_text_file", virtual_path).await?;
        adapter.read_text_file(relative).await
    }

    pub async fn write_file(
        &self,
        virtual_path: &str,
        contents: &[u8],
        overwrite: bool,
    ) -> FsResult<()> {
        let (adapter, relative) = self.dispatch("write_file", virtual_path).await?;
        adapter.write_file(relative, contents, overwrite).await
    }

    pub async fn write_text_file(
        &self,
        virtual_path: &str,
        contents: &str,
        overwrite: bool,
    ) -> FsResult<()> {
        let (adapter, relative) = self.dispatch("write_text_file", virtual_path).await?;
        adapter.write_text_file(relative, contents, overwrite).await
    }

    pub async fn append_file(&self, virtual_path: &str, contents: &[u8]) -> FsResult<()> {
        let (adapter, relative) = self.dispatch("append_file", virtual_path).await?;
        adapter.append_file(relative, contents).await
    }

    pub async fn append_text_file(&self, virtual_path: &str, contents: &str) -> FsResult<()> {
        let (adapter, relative) = self.dispatch("append_text_file", virtual_path).await?;
        adapter.append_text_file(relative, contents).await
    }

    // ========================================================================
    // Cross-adapter
    // ========================================================================

    /// Copy a file, possibly between adapters.
    ///
    /// Reads the whole source into memory, then writes it. Not atomic: a
    /// failed write leaves the destination as the adapter left it.
    pub async fn copy_file(&self, source: &str, destination: &str, overwrite: bool) -> FsResult<()> {
        let (from, from_relative) = self.dispatch("copy_file", source).await?;
        let (to, to_relative) = self.dispatch("copy_file", destination).await?;

        let contents = from.read_file(from_relative).await?;
        to.write_file(to_relative, &contents, overwrite).await
    }

    /// Move a file, possibly between adapters.
    ///
    /// Copies, then deletes the source. Not atomic: if the delete fails, the
    /// file exists in both places.
    pub async fn move_file(&self, source: &str, destination: &str, overwrite: bool) -> FsResult<()> {
        let (from, from_relative) = self.dispatch("move_file", source).await?;
        let (to, to_relative) = self.dispatch("move_file", destination).await?;

        // Same file: writing then deleting would lose it.
        if Arc::ptr_eq(&from, &to) {
            let src = from.get_file(from_relative).await?;
            match to.get_file(to_relative).await {
                Ok(dst) if dst.path == src.path => return Ok(()),
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        let contents = from.read_file(from_relative).await?;
        to.write_file(to_relative, &contents, overwrite).await?;
        from.delete_file(from_relative).await
    }

    // ========================================================================
    // Lifetime
    // ========================================================================

    /// Dispose one adapter. It stays registered.
    pub async fn dispose(&self, prefix: &str) -> FsResult<()> {
        let adapter = self.adapter(prefix).ok_or_else(|| {
            FsError::invalid_path(
                format!("{}{}", prefix, DELIMITER),
                format!("no adapter registered for prefix '{}'", prefix),
            )
        })?;
        tracing::info!(prefix, "disposing adapter");
        adapter.dispose().await
    }

    /// Dispose every adapter.
    ///
    /// Keeps going past failures and returns the first one.
    pub async fn dispose_all(&self) -> FsResult<()> {
        let mut first_error = None;
        for prefix in self.prefixes() {
            if let Err(e) = self.dispose(prefix).await {
                tracing::warn!(prefix, error = %e, "dispose failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryAdapter;
    use crate::error::ErrorKind;

    fn table() -> FileSystem {
        let mut fs = FileSystem::new();
        fs.register(MemoryAdapter::with_root("a", "/data")).unwrap();
        fs.register(MemoryAdapter::new("b")).unwrap();
        fs
    }

    #[tokio::test]
    async fn test_routes_by_prefix() {
        let fs = table();
        fs.write_text_file("a://x.txt", "from a", false).await.unwrap();
        fs.write_text_file("b://x.txt", "from b", false).await.unwrap();

        assert_eq!(fs.read_text_file("a://x.txt").await.unwrap(), "from a");
        assert_eq!(fs.read_text_file("b://x.txt").await.unwrap(), "from b");
        assert_eq!(fs.get_file("a://x.txt").await.unwrap().path, "/data/x.txt");
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut fs = table();
        let err = fs.register(MemoryAdapter::new("a")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePrefix(p) if p == "a"));

        let err = fs.register(MemoryAdapter::new("")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPrefix(_)));
        let err = fs.register(MemoryAdapter::new("x://y")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPrefix(_)));
    }

    #[test]
    fn test_prefixes_sorted() {
        let fs = table();
        assert_eq!(fs.prefixes(), vec!["a", "b"]);
        assert!(fs.adapter("a").is_some());
        assert!(fs.adapter("c").is_none());
    }

    #[tokio::test]
    async fn test_bare_path_needs_default() {
        let mut fs = table();
        let err = fs.read_file("x.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);

        assert!(matches!(
            fs.set_default_prefix("zzz"),
            Err(RegistryError::UnknownDefault(_))
        ));
        fs.set_default_prefix("b").unwrap();
        fs.write_file("x.txt", b"bare", false).await.unwrap();
        assert_eq!(fs.read_file("b://x.txt").await.unwrap(), b"bare");

        let fs = table().with_default_prefix("a").unwrap();
        assert_eq!(fs.default_prefix(), Some("a"));
        assert_eq!(fs.get_file("x.txt").await.unwrap_err().kind(), ErrorKind::FileNotFound);
    }

    #[tokio::test]
    async fn test_copy_and_move_across_adapters() {
        let fs = table();
        fs.write_text_file("a://src.txt", "payload", false).await.unwrap();

        fs.copy_file("a://src.txt", "b://copy.txt", false).await.unwrap();
        assert_eq!(fs.read_text_file("b://copy.txt").await.unwrap(), "payload");
        assert!(fs.file_exists("a://src.txt").await.unwrap());

        let err = fs.copy_file("a://src.txt", "b://copy.txt", false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileAlreadyExists);

        fs.move_file("a://src.txt", "b://moved.txt", false).await.unwrap();
        assert!(!fs.file_exists("a://src.txt").await.unwrap());
        assert_eq!(fs.read_text_file("b://moved.txt").await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_move_onto_itself_keeps_file() {
        let fs = table();
        fs.write_text_file("a://same.txt", "keep", false).await.unwrap();

        fs.move_file("a://same.txt", "a://./same.txt", true).await.unwrap();
        assert_eq!(fs.read_text_file("a://same.txt").await.unwrap(), "keep");
    }

    #[tokio::test]
    async fn test_move_within_adapter() {
        let fs = table();
        fs.write_text_file("a://dir/old.txt", "body", false).await.unwrap();

        fs.move_file("a://dir/old.txt", "a://dir/../new.txt", false).await.unwrap();
        assert!(!fs.file_exists("a://dir/old.txt").await.unwrap());
        assert_eq!(fs.read_text_file("a://new.txt").await.unwrap(), "body");

        let err = fs.move_file("a://missing.txt", "a://missing.txt", true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[tokio::test]
    async fn test_dispose() {
        let fs = table();
        fs.write_file("a://x", b"x", false).await.unwrap();

        fs.dispose_all().await.unwrap();
        assert!(!fs.file_exists("a://x").await.unwrap());

        let err = fs.dispose("nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
    }
}
