//! Transport-level SFTP errors.
//!
//! These never leave the crate through the adapter: [`crate::SftpAdapter`]
//! translates them into [`kakehashi::FsError`].

#[derive(Debug, Clone, thiserror::Error)]
pub enum SftpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Auth failed: {0}")]
    AuthFailed(String),
    #[error("Channel failed: {0}")]
    ChannelFailed(String),
    #[error("SSH agent error: {0}")]
    AgentFailed(String),
    #[error("No SSH keys available in agent")]
    NoKeysAvailable,
    #[error("Host key mismatch: expected {expected}, server offered {actual}")]
    HostKeyMismatch { expected: String, actual: String },
    #[error("Connect timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Not connected")]
    NotConnected,
    #[error("No such file: {0}")]
    NoSuchFile(String),
    #[error("SFTP error: {0}")]
    Protocol(String),
}

impl SftpError {
    /// Whether the session itself is unusable, as opposed to a single request failing.
    pub fn is_connection(&self) -> bool {
        !matches!(self, Self::NoSuchFile(_) | Self::Protocol(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchFile(_))
    }
}

impl From<russh::Error> for SftpError {
    fn from(e: russh::Error) -> Self {
        SftpError::ConnectionFailed(e.to_string())
    }
}
