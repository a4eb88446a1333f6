//! SSH connection constants.

use std::time::Duration;

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// SSH inactivity timeout.
pub const SSH_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300);

/// SSH keep-alive interval.
pub const SSH_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// SSH keep-alive max retries.
pub const SSH_KEEPALIVE_MAX: usize = 3;

/// Timeout for TCP connect, authentication and SFTP subsystem startup combined.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Subsystem name requested on the session channel.
pub const SFTP_SUBSYSTEM: &str = "sftp";
