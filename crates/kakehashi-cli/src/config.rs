//! Adapter configuration loaded from `kakehashi.ron`.
//!
//! Optional fields may be written bare or as `Some(..)`.
//!
//! ```ron
//! (
//!     default: Some("local"),
//!     adapters: [
//!         (prefix: "local", kind: Local(root: "~/data")),
//!         (prefix: "scratch", kind: Memory(root: None)),
//!         (
//!             prefix: "remote1",
//!             kind: Sftp(
//!                 root: "/srv/files",
//!                 host: "files.example.com",
//!                 username: "deploy",
//!                 auth: KeyFile(path: "~/.ssh/id_ed25519", passphrase_env: None),
//!             ),
//!         ),
//!     ],
//! )
//! ```

use std::path::{Path, PathBuf};

use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};

use kakehashi::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("environment variable {var} is not set (adapter '{prefix}')")]
    MissingEnv { prefix: String, var: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Adapter that receives paths without a `prefix://`.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub adapters: Vec<AdapterConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub prefix: String,
    pub kind: AdapterKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdapterKind {
    Local {
        root: String,
    },
    Memory {
        #[serde(default)]
        root: Option<String>,
    },
    Sftp {
        root: String,
        host: String,
        #[serde(default)]
        port: Option<u16>,
        /// Defaults to the local user name.
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        auth: AuthConfig,
        #[serde(default)]
        host_key_fingerprint: Option<String>,
    },
}

/// SSH credentials. Secrets are never stored inline, only the variable that holds them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum AuthConfig {
    #[default]
    Agent,
    Password {
        env: String,
    },
    KeyFile {
        path: String,
        #[serde(default)]
        passphrase_env: Option<String>,
    },
}

impl Config {
    /// `$XDG_CONFIG_HOME/kakehashi/kakehashi.ron` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kakehashi").join("kakehashi.ron"))
    }

    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(text)
            .map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Load `explicit` if given, else the default path if it exists, else
    /// [`Config::fallback`].
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                tracing::debug!("no config file, using the working directory as 'local'");
                Ok(Self::fallback())
            }
        }
    }

    /// A single `local` adapter rooted at the working directory.
    pub fn fallback() -> Self {
        Self {
            default: Some("local".into()),
            adapters: vec![AdapterConfig {
                prefix: "local".into(),
                kind: AdapterKind::Local { root: ".".into() },
            }],
        }
    }
}

/// Expand `~` and `$VARS` in a configured path.
pub fn expand(path: &str) -> String {
    match shellexpand::full(path) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => {
            tracing::warn!("leaving {} unexpanded: {}", path, e);
            path.to_string()
        }
    }
}
