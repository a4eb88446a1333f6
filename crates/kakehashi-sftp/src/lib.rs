//! SFTP adapter for kakehashi.
//!
//! [`SftpAdapter`] implements [`kakehashi::Adapter`] on top of an
//! [`SftpClient`]. The production client, [`RusshClient`], speaks SSH through
//! russh and opens the `sftp` subsystem with russh-sftp. The session is opened
//! lazily on first use and closed by `dispose`.
//!
//! ```no_run
//! use kakehashi::FileSystem;
//! use kakehashi_sftp::{SftpAdapter, SshAuth, SshConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = SshConfig::new("files.example.com");
//! config.username = "deploy".into();
//! config.auth = SshAuth::Password(std::env::var("REMOTE_PASSWORD")?);
//!
//! let mut fs = FileSystem::new();
//! fs.register(SftpAdapter::connect_to("remote1", "/srv/files", config))?;
//! let report = fs.read_text_file("remote1://reports/q3.csv").await?;
//! # let _ = report;
//! # Ok(())
//! # }
//! ```

mod adapter;
mod client;
pub mod constants;
mod error;
mod session;

pub use adapter::SftpAdapter;
pub use client::{SftpAttrs, SftpClient, SftpEntry};
pub use error::SftpError;
pub use session::{RusshClient, SshAuth, SshConfig};
