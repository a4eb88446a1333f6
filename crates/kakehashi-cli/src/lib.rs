//! Library half of the `kakehashi` binary: configuration, adapter
//! registration and command execution.

pub mod cli;
pub mod config;
pub mod registry;

pub use cli::{Cli, Command, run};
pub use config::{AdapterConfig, AdapterKind, AuthConfig, Config, ConfigError};
pub use registry::build_filesystem;
