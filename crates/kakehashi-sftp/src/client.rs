//! The narrow SFTP surface the adapter needs.
//!
//! [`SftpClient`] is implemented by [`crate::RusshClient`] for real servers and
//! by in-memory fakes in tests. Paths are absolute server paths; the adapter
//! has already joined them onto its root.

use std::time::SystemTime;

use async_trait::async_trait;
use kakehashi::EntryKind;

use crate::error::SftpError;

/// Attributes of a remote entry, symlinks already followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SftpAttrs {
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl SftpAttrs {
    pub fn file(size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            modified,
        }
    }

    pub fn directory(modified: Option<SystemTime>) -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            modified,
        }
    }
}

/// One child returned by [`SftpClient::list`].
#[derive(Debug, Clone)]
pub struct SftpEntry {
    /// Bare name, never `.` or `..`.
    pub name: String,
    /// Attributes of the link target when `symlink` is set. A dangling link
    /// has kind [`EntryKind::Other`].
    pub attrs: SftpAttrs,
    /// The entry itself is a symbolic link.
    pub symlink: bool,
}

#[async_trait]
pub trait SftpClient: Send + Sync {
    async fn is_connected(&self) -> bool;

    /// Open the session. Called only when [`Self::is_connected`] is false.
    async fn connect(&self) -> Result<(), SftpError>;

    /// Close the session. A no-op when not connected.
    async fn disconnect(&self) -> Result<(), SftpError>;

    /// `NoSuchFile` when nothing exists at `path`.
    async fn stat(&self, path: &str) -> Result<SftpAttrs, SftpError>;

    async fn list(&self, path: &str) -> Result<Vec<SftpEntry>, SftpError>;

    /// Create one directory; the parent must exist.
    async fn create_dir(&self, path: &str) -> Result<(), SftpError>;

    async fn remove_file(&self, path: &str) -> Result<(), SftpError>;

    /// Remove one empty directory.
    async fn remove_dir(&self, path: &str) -> Result<(), SftpError>;

    async fn read(&self, path: &str) -> Result<Vec<u8>, SftpError>;

    /// Create or truncate `path` and write `data`.
    async fn write(&self, path: &str, data: &[u8]) -> Result<(), SftpError>;

    async fn append(&self, path: &str, data: &[u8]) -> Result<(), SftpError>;

    /// Create an empty file, failing if anything already exists at `path`.
    async fn create_new(&self, path: &str) -> Result<(), SftpError>;
}
