//! Turn a [`Config`] into a ready [`FileSystem`].

use std::path::PathBuf;

use kakehashi::{FileSystem, LocalAdapter, MemoryAdapter};
use kakehashi_sftp::{SftpAdapter, SshAuth, SshConfig};

use crate::config::{AdapterConfig, AdapterKind, AuthConfig, Config, ConfigError, expand};

/// Register every configured adapter. Nothing connects until first use.
pub fn build_filesystem(config: &Config) -> Result<FileSystem, ConfigError> {
    let mut fs = FileSystem::new();
    for adapter in &config.adapters {
        register(&mut fs, adapter)?;
    }
    if let Some(default) = &config.default {
        fs.set_default_prefix(default.clone())?;
    }
    Ok(fs)
}

fn register(fs: &mut FileSystem, adapter: &AdapterConfig) -> Result<(), ConfigError> {
    let prefix = adapter.prefix.clone();
    match &adapter.kind {
        AdapterKind::Local { root } => {
            fs.register(LocalAdapter::new(prefix, expand(root)))?;
        }
        AdapterKind::Memory { root: None } => {
            fs.register(MemoryAdapter::new(prefix))?;
        }
        AdapterKind::Memory { root: Some(root) } => {
            fs.register(MemoryAdapter::with_root(prefix, root.clone()))?;
        }
        AdapterKind::Sftp {
            root,
            host,
            port,
            username,
            auth,
            host_key_fingerprint,
        } => {
            let mut ssh = SshConfig::new(host.clone());
            if let Some(port) = port {
                ssh.port = *port;
            }
            if let Some(username) = username {
                ssh.username = username.clone();
            }
            ssh.auth = ssh_auth(&adapter.prefix, auth)?;
            ssh.host_key_fingerprint = host_key_fingerprint.clone();
            fs.register(SftpAdapter::connect_to(prefix, root.clone(), ssh))?;
        }
    }
    Ok(())
}

fn ssh_auth(prefix: &str, auth: &AuthConfig) -> Result<SshAuth, ConfigError> {
    let secret = |var: &str| {
        std::env::var(var).map_err(|_| ConfigError::MissingEnv {
            prefix: prefix.to_string(),
            var: var.to_string(),
        })
    };

    Ok(match auth {
        AuthConfig::Agent => SshAuth::Agent,
        AuthConfig::Password { env } => SshAuth::Password(secret(env)?),
        AuthConfig::KeyFile {
            path,
            passphrase_env,
        } => SshAuth::KeyFile {
            path: PathBuf::from(expand(path)),
            passphrase: passphrase_env.as_deref().map(secret).transpose()?,
        },
    })
}
