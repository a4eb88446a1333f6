//! Filesystem error types.
//!
//! Every adapter translates its native failures into [`FsError`] at its
//! boundary. Callers only ever see these six kinds.

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed native error kept as the cause of connection and runtime failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Filesystem error type.
#[derive(Debug, Error)]
pub enum FsError {
    /// File does not exist, or the path names a directory.
    #[error("file '{path}' not found in adapter '{prefix}'")]
    FileNotFound { path: String, prefix: String },

    /// Directory does not exist, or the path names a file.
    #[error("directory '{path}' not found in adapter '{prefix}'")]
    DirectoryNotFound { path: String, prefix: String },

    /// Write without overwrite targeted an existing path.
    #[error("file '{path}' already exists in adapter '{prefix}'")]
    FileAlreadyExists { path: String, prefix: String },

    /// The adapter could not establish or keep its transport session.
    #[error("adapter '{prefix}' failed to connect: {source}")]
    Connection {
        prefix: String,
        #[source]
        source: BoxError,
    },

    /// Unclassified native failure.
    #[error("adapter '{prefix}' failed on '{path}': {source}")]
    Runtime {
        path: String,
        prefix: String,
        #[source]
        source: BoxError,
    },

    /// Virtual path does not resolve to a registered adapter, or escapes
    /// the adapter root.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Fieldless discriminant of [`FsError`], for callers that branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    FileNotFound,
    DirectoryNotFound,
    FileAlreadyExists,
    Connection,
    Runtime,
    InvalidPath,
}

impl FsError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::FileNotFound {
            path: path.into(),
            prefix: prefix.into(),
        }
    }

    /// Create a DirectoryNotFound error.
    pub fn directory_not_found(path: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::DirectoryNotFound {
            path: path.into(),
            prefix: prefix.into(),
        }
    }

    /// Create a FileAlreadyExists error.
    pub fn file_already_exists(path: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::FileAlreadyExists {
            path: path.into(),
            prefix: prefix.into(),
        }
    }

    /// Create a Connection error wrapping the native cause.
    pub fn connection(prefix: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            prefix: prefix.into(),
            source: source.into(),
        }
    }

    /// Create a Runtime error wrapping the native cause.
    pub fn runtime(
        path: impl Into<String>,
        prefix: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Runtime {
            path: path.into(),
            prefix: prefix.into(),
            source: source.into(),
        }
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::FileNotFound { .. } => ErrorKind::FileNotFound,
            FsError::DirectoryNotFound { .. } => ErrorKind::DirectoryNotFound,
            FsError::FileAlreadyExists { .. } => ErrorKind::FileAlreadyExists,
            FsError::Connection { .. } => ErrorKind::Connection,
            FsError::Runtime { .. } => ErrorKind::Runtime,
            FsError::InvalidPath { .. } => ErrorKind::InvalidPath,
        }
    }

    /// Returns true for either not-found kind.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FsError::FileNotFound { .. } | FsError::DirectoryNotFound { .. }
        )
    }

    /// Prefix of the adapter that raised the error, if any.
    pub fn prefix(&self) -> Option<&str> {
        match self {
            FsError::FileNotFound { prefix, .. }
            | FsError::DirectoryNotFound { prefix, .. }
            | FsError::FileAlreadyExists { prefix, .. }
            | FsError::Connection { prefix, .. }
            | FsError::Runtime { prefix, .. } => Some(prefix),
            FsError::InvalidPath { .. } => None,
        }
    }
}

/// Convert FsError to std::io::Error for compatibility.
impl From<FsError> for std::io::Error {
    fn from(e: FsError) -> Self {
        use std::io::ErrorKind as IoKind;

        let kind = match &e {
            FsError::FileNotFound { .. } | FsError::DirectoryNotFound { .. } => IoKind::NotFound,
            FsError::FileAlreadyExists { .. } => IoKind::AlreadyExists,
            FsError::Connection { .. } => IoKind::NotConnected,
            FsError::InvalidPath { .. } => IoKind::InvalidInput,
            FsError::Runtime { .. } => IoKind::Other,
        };
        std::io::Error::new(kind, e)
    }
}

/// Filesystem result type.
pub type FsResult<T> = Result<T, FsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_display() {
        let err = FsError::file_not_found("/data/a.txt", "local");
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.kind().to_string(), "file_not_found");
        assert_eq!(
            err.to_string(),
            "file '/data/a.txt' not found in adapter 'local'"
        );
        assert!(err.is_not_found());
        assert_eq!(err.prefix(), Some("local"));
    }

    #[test]
    fn test_runtime_keeps_source() {
        let cause = std::io::Error::other("disk on fire");
        let err = FsError::runtime("/x", "local", cause);
        assert_eq!(err.kind(), ErrorKind::Runtime);
        let source = err.source().expect("runtime errors carry a source");
        assert_eq!(source.to_string(), "disk on fire");
    }

    #[test]
    fn test_invalid_path_has_no_prefix() {
        let err = FsError::invalid_path("nowhere://x", "no adapter registered for prefix 'nowhere'");
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        assert!(err.prefix().is_none());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_into_io_error() {
        let io: std::io::Error = FsError::file_already_exists("/a", "mem").into();
        assert_eq!(io.kind(), std::io::ErrorKind::AlreadyExists);
    }
}
