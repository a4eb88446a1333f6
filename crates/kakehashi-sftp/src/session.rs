//! SFTP over russh.
//!
//! One SSH connection carries one session channel with the `sftp` subsystem.
//! The pair lives in a `tokio::sync::RwLock` slot: requests share a read
//! guard, connect and disconnect take the write guard.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use kakehashi::EntryKind;
use russh::client::{self, Config, Handle};
use russh::keys::agent::client::AgentClient;
use russh::keys::{HashAlg, PrivateKeyWithHashAlg, PublicKey};
use russh::Disconnect;
use russh_sftp::client::SftpSession;
use russh_sftp::client::error::Error as ProtocolError;
use russh_sftp::protocol::{FileAttributes, OpenFlags, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;

use crate::client::{SftpAttrs, SftpClient, SftpEntry};
use crate::constants::{
    CONNECT_TIMEOUT, DEFAULT_SSH_PORT, SFTP_SUBSYSTEM, SSH_INACTIVITY_TIMEOUT,
    SSH_KEEPALIVE_INTERVAL, SSH_KEEPALIVE_MAX,
};
use crate::error::SftpError;

/// How to authenticate.
#[derive(Debug, Clone, Default)]
pub enum SshAuth {
    Password(String),
    KeyFile {
        path: PathBuf,
        passphrase: Option<String>,
    },
    /// Try every identity offered by `$SSH_AUTH_SOCK`.
    #[default]
    Agent,
}

/// SSH connection configuration
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: SshAuth,
    /// `SHA256:...` fingerprint the server key must match. `None` accepts any key.
    pub host_key_fingerprint: Option<String>,
}

impl SshConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: whoami::username(),
            auth: SshAuth::Agent,
            host_key_fingerprint: None,
        }
    }
}

struct ClientHandler {
    expected_fingerprint: Option<String>,
}

impl client::Handler for ClientHandler {
    type Error = SftpError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let actual = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        match &self.expected_fingerprint {
            Some(expected) if *expected == actual => Ok(true),
            Some(expected) => Err(SftpError::HostKeyMismatch {
                expected: expected.clone(),
                actual,
            }),
            None => {
                tracing::warn!("Accepting server key without verification: {}", actual);
                Ok(true)
            }
        }
    }
}

struct Connection {
    ssh: Handle<ClientHandler>,
    sftp: SftpSession,
}

/// [`SftpClient`] backed by a real SSH server.
pub struct RusshClient {
    config: SshConfig,
    slot: RwLock<Option<Connection>>,
}

impl RusshClient {
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            slot: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    async fn open(&self) -> Result<Connection, SftpError> {
        let config = Config {
            inactivity_timeout: Some(SSH_INACTIVITY_TIMEOUT),
            keepalive_interval: Some(SSH_KEEPALIVE_INTERVAL),
            keepalive_max: SSH_KEEPALIVE_MAX,
            ..<_>::default()
        };

        let handler = ClientHandler {
            expected_fingerprint: self.config.host_key_fingerprint.clone(),
        };
        let addr = (self.config.host.as_str(), self.config.port);
        let mut ssh = client::connect(Arc::new(config), addr, handler).await?;

        tracing::info!(
            "Connected to {}:{}, attempting authentication",
            self.config.host,
            self.config.port
        );
        self.authenticate(&mut ssh).await?;

        let channel = ssh
            .channel_open_session()
            .await
            .map_err(|e| SftpError::ChannelFailed(format!("session: {}", e)))?;
        channel
            .request_subsystem(true, SFTP_SUBSYSTEM)
            .await
            .map_err(|e| SftpError::ChannelFailed(format!("subsystem: {}", e)))?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| SftpError::ChannelFailed(format!("sftp init: {}", e)))?;

        Ok(Connection { ssh, sftp })
    }

    async fn authenticate(&self, ssh: &mut Handle<ClientHandler>) -> Result<(), SftpError> {
        let username = &self.config.username;
        let hash_alg = ssh.best_supported_rsa_hash().await.ok().flatten().flatten();

        let accepted = match &self.config.auth {
            SshAuth::Password(password) => ssh
                .authenticate_password(username, password)
                .await?
                .success(),
            SshAuth::KeyFile { path, passphrase } => {
                let key = russh::keys::load_secret_key(path, passphrase.as_deref())
                    .map_err(|e| SftpError::AuthFailed(format!("{}: {}", path.display(), e)))?;
                ssh.authenticate_publickey(
                    username,
                    PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                )
                .await?
                .success()
            }
            SshAuth::Agent => self.authenticate_with_agent(ssh, hash_alg).await?,
        };

        if !accepted {
            return Err(SftpError::AuthFailed(format!(
                "server rejected credentials for {}",
                username
            )));
        }
        tracing::info!("Authenticated as {}", username);
        Ok(())
    }

    async fn authenticate_with_agent(
        &self,
        ssh: &mut Handle<ClientHandler>,
        hash_alg: Option<HashAlg>,
    ) -> Result<bool, SftpError> {
        let mut agent = AgentClient::connect_env()
            .await
            .map_err(|e| SftpError::AgentFailed(e.to_string()))?;
        let keys = agent
            .request_identities()
            .await
            .map_err(|e| SftpError::AgentFailed(e.to_string()))?;
        if keys.is_empty() {
            return Err(SftpError::NoKeysAvailable);
        }

        for key in keys {
            let fingerprint = key.fingerprint(HashAlg::Sha256);
            tracing::debug!("Trying key: {}", fingerprint);
            match ssh
                .authenticate_publickey_with(&self.config.username, key, hash_alg, &mut agent)
                .await
            {
                Ok(result) if result.success() => return Ok(true),
                Ok(_) => tracing::debug!("Key {} rejected", fingerprint),
                Err(e) => tracing::warn!("Auth error with key {}: {}", fingerprint, e),
            }
        }
        Ok(false)
    }
}

fn translate(path: &str, e: ProtocolError) -> SftpError {
    match e {
        ProtocolError::Status(status) if status.status_code == StatusCode::NoSuchFile => {
            SftpError::NoSuchFile(path.to_string())
        }
        other => SftpError::Protocol(format!("{}: {}", path, other)),
    }
}

fn io_error(path: &str, e: std::io::Error) -> SftpError {
    SftpError::Protocol(format!("{}: {}", path, e))
}

fn to_attrs(attrs: &FileAttributes) -> SftpAttrs {
    let kind = if attrs.is_dir() {
        EntryKind::Directory
    } else if attrs.is_regular() {
        EntryKind::File
    } else {
        EntryKind::Other
    };
    SftpAttrs {
        kind,
        size: attrs.size.unwrap_or(0),
        modified: attrs
            .mtime
            .map(|secs| UNIX_EPOCH + Duration::from_secs(u64::from(secs))),
    }
}

/// A link whose target is gone lists as `Other`; any other failure propagates.
fn dangling_link(e: SftpError) -> Result<SftpAttrs, SftpError> {
    if e.is_not_found() {
        Ok(SftpAttrs {
            kind: EntryKind::Other,
            size: 0,
            modified: None,
        })
    } else {
        Err(e)
    }
}

/// Borrow the live SFTP session or fail with `NotConnected`.
macro_rules! session {
    ($guard:expr) => {
        match $guard.as_ref() {
            Some(connection) => &connection.sftp,
            None => return Err(SftpError::NotConnected),
        }
    };
}

#[async_trait]
impl SftpClient for RusshClient {
    async fn is_connected(&self) -> bool {
        self.slot
            .read()
            .await
            .as_ref()
            .map(|c| !c.ssh.is_closed())
            .unwrap_or(false)
    }

    async fn connect(&self) -> Result<(), SftpError> {
        let mut slot = self.slot.write().await;
        if slot.as_ref().is_some_and(|c| !c.ssh.is_closed()) {
            return Ok(());
        }
        let connection = tokio::time::timeout(CONNECT_TIMEOUT, self.open())
            .await
            .map_err(|_| SftpError::Timeout(CONNECT_TIMEOUT))??;
        *slot = Some(connection);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SftpError> {
        let Some(connection) = self.slot.write().await.take() else {
            return Ok(());
        };
        if let Err(e) = connection.sftp.close().await {
            tracing::debug!("SFTP close failed: {}", e);
        }
        connection
            .ssh
            .disconnect(Disconnect::ByApplication, "Client disconnecting", "en")
            .await?;
        Ok(())
    }

    async fn stat(&self, path: &str) -> Result<SftpAttrs, SftpError> {
        let guard = self.slot.read().await;
        let sftp = session!(guard);
        let attrs = sftp.metadata(path).await.map_err(|e| translate(path, e))?;
        Ok(to_attrs(&attrs))
    }

    async fn list(&self, path: &str) -> Result<Vec<SftpEntry>, SftpError> {
        let guard = self.slot.read().await;
        let sftp = session!(guard);
        let entries = sftp.read_dir(path).await.map_err(|e| translate(path, e))?;

        let mut out = Vec::new();
        for entry in entries {
            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }
            let meta = entry.metadata();
            let symlink = meta.is_symlink();
            let attrs = if symlink {
                let child = kakehashi::path::prepend_root_path(path, &name);
                match sftp.metadata(child.as_str()).await {
                    Ok(target) => to_attrs(&target),
                    Err(e) => dangling_link(translate(&child, e))?,
                }
            } else {
                to_attrs(&meta)
            };
            out.push(SftpEntry {
                name,
                attrs,
                symlink,
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn create_dir(&self, path: &str) -> Result<(), SftpError> {
        let guard = self.slot.read().await;
        session!(guard)
            .create_dir(path)
            .await
            .map_err(|e| translate(path, e))
    }

    async fn remove_file(&self, path: &str) -> Result<(), SftpError> {
        let guard = self.slot.read().await;
        session!(guard)
            .remove_file(path)
            .await
            .map_err(|e| translate(path, e))
    }

    async fn remove_dir(&self, path: &str) -> Result<(), SftpError> {
        let guard = self.slot.read().await;
        session!(guard)
            .remove_dir(path)
            .await
            .map_err(|e| translate(path, e))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, SftpError> {
        let guard = self.slot.read().await;
        let mut file = session!(guard)
            .open(path)
            .await
            .map_err(|e| translate(path, e))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .await
            .map_err(|e| io_error(path, e))?;
        Ok(buf)
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<(), SftpError> {
        let flags = OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE;
        let guard = self.slot.read().await;
        let mut file = session!(guard)
            .open_with_flags(path, flags)
            .await
            .map_err(|e| translate(path, e))?;
        file.write_all(data).await.map_err(|e| io_error(path, e))?;
        file.shutdown().await.map_err(|e| io_error(path, e))
    }

    async fn append(&self, path: &str, data: &[u8]) -> Result<(), SftpError> {
        let flags = OpenFlags::WRITE | OpenFlags::APPEND;
        let guard = self.slot.read().await;
        let mut file = session!(guard)
            .open_with_flags(path, flags)
            .await
            .map_err(|e| translate(path, e))?;
        file.write_all(data).await.map_err(|e| io_error(path, e))?;
        file.shutdown().await.map_err(|e| io_error(path, e))
    }

    async fn create_new(&self, path: &str) -> Result<(), SftpError> {
        let flags = OpenFlags::CREATE | OpenFlags::EXCLUDE | OpenFlags::WRITE;
        let guard = self.slot.read().await;
        let mut file = session!(guard)
            .open_with_flags(path, flags)
            .await
            .map_err(|e| translate(path, e))?;
        file.shutdown().await.map_err(|e| io_error(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SshConfig::new("files.example.com");
        assert_eq!(config.port, 22);
        assert!(matches!(config.auth, SshAuth::Agent));
        assert!(config.host_key_fingerprint.is_none());
    }

    #[test]
    fn test_link_target_errors() {
        let attrs = dangling_link(SftpError::NoSuchFile("/t/link".into())).unwrap();
        assert_eq!(attrs.kind, EntryKind::Other);

        let err = dangling_link(SftpError::Protocol("/t/link: permission denied".into()));
        assert!(matches!(err, Err(SftpError::Protocol(_))));
        assert!(matches!(
            dangling_link(SftpError::NotConnected),
            Err(SftpError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_requests_before_connect_fail() {
        let client = RusshClient::new(SshConfig::new("localhost"));
        assert!(!client.is_connected().await);
        assert!(matches!(
            client.stat("/tmp").await,
            Err(SftpError::NotConnected)
        ));
        client.disconnect().await.unwrap();
    }
}
