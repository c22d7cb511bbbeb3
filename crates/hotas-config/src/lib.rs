//! Launch configuration shared by `hotasd` and its clients.
//!
//! The [`Config`] struct is resolved through `ortho_config`, layering the
//! built-in defaults, an optional configuration file, `HOTASD_*` environment
//! variables and command-line flags. It describes how the daemon process is
//! wired (socket, logging, session limits) and where the device
//! configuration file lives; the device parameters themselves are owned by
//! the daemon's configuration store.
//!
//! Loading goes through the [`OrthoConfig`] trait, so callers bring it into
//! scope (`use ortho_config::OrthoConfig`) before calling `Config::load`.

mod defaults;
mod logging;
mod runtime;
mod socket;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_LOG_FILTER, DEFAULT_MAX_CLIENTS, DEFAULT_TCP_PORT,
    default_device_config, default_log_filter, default_log_format, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use runtime::{RuntimePaths, RuntimePathsError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved launch configuration for the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "HOTASD")]
pub struct Config {
    /// Endpoint the daemon listens on.
    #[serde(default = "defaults::default_socket_endpoint")]
    pub daemon_socket: SocketEndpoint,
    /// Path of the device configuration file managed by the config store.
    #[serde(default = "defaults::default_device_config")]
    pub device_config: Utf8PathBuf,
    /// Initial `tracing` filter directive.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for daemon logs.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Seconds a session may sit idle before it is closed; zero disables.
    #[serde(default = "defaults::default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Maximum number of concurrently connected clients.
    #[serde(default = "defaults::default_max_clients")]
    pub max_clients: usize,
    /// Fail startup when no device can be enumerated.
    #[serde(default)]
    pub require_device: bool,
    /// Let every client run mutating commands, not just the daemon owner
    /// and root.
    #[serde(default)]
    pub open_writes: bool,
    /// Device parameter overrides in `section.key=value` form.
    #[serde(default)]
    pub overrides: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: defaults::default_socket_endpoint(),
            device_config: defaults::default_device_config(),
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            max_clients: DEFAULT_MAX_CLIENTS,
            require_device: false,
            open_writes: false,
            overrides: Vec::new(),
        }
    }
}

impl Config {
    /// Endpoint the daemon listens on.
    #[must_use]
    pub fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Device configuration file path.
    #[must_use]
    pub fn device_config(&self) -> &Utf8Path {
        self.device_config.as_path()
    }

    /// Initial log filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Idle timeout applied to sessions, if enabled.
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }

    /// Maximum number of concurrent sessions. Never less than one.
    #[must_use]
    pub fn max_clients(&self) -> usize {
        self.max_clients.max(1)
    }

    /// Whether a missing device aborts startup.
    #[must_use]
    pub fn require_device(&self) -> bool {
        self.require_device
    }

    /// Whether mutating commands are reserved for the daemon owner.
    #[must_use]
    pub fn owner_only_writes(&self) -> bool {
        !self.open_writes
    }

    /// Startup overrides for device parameters.
    #[must_use]
    pub fn overrides(&self) -> &[String] {
        &self.overrides
    }
}
