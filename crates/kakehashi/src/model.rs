//! File and directory descriptors.
//!
//! Snapshots of backend metadata at query time. They hold no connection and
//! are owned by the caller once returned.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A regular file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Prefix of the adapter the file lives in.
    pub prefix: String,
    /// Entry name (not full path).
    pub name: String,
    /// Absolute path within the adapter's namespace.
    pub path: String,
    /// `prefix://relative` path that routes back to this file.
    pub virtual_path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the backend reports one.
    pub last_modified: Option<SystemTime>,
}

/// A directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    /// Prefix of the adapter the directory lives in.
    pub prefix: String,
    /// Entry name (not full path).
    pub name: String,
    /// Absolute path within the adapter's namespace.
    pub path: String,
    /// `prefix://relative` path that routes back to this directory.
    pub virtual_path: String,
    /// Last modification time, when the backend reports one.
    pub last_modified: Option<SystemTime>,
}

/// Entry kind reported by a backend listing or stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Anything else (symlink, socket, device).
    Other,
}

impl EntryKind {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}
