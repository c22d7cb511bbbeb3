//! Defines the unified error surface for daemon launch and supervision.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use nix::errno::Errno;
use thiserror::Error;

use ortho_config::OrthoError;

use hotas_config::{RuntimePathsError, SocketPreparationError};

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::daemonizer::DaemonizeError;
use super::signals::SignalError;

/// Startup failed for a reason without a dedicated exit code.
const EXIT_FAILURE: u8 = 1;
/// Launch configuration or device configuration file rejected.
const EXIT_CONFIG: u8 = 2;
/// No device found while one is required.
const EXIT_DEVICE_NOT_FOUND: u8 = 3;
/// The daemon socket could not be bound.
const EXIT_SOCKET: u8 = 4;

/// Errors surfaced while launching or supervising the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Preparing the socket filesystem failed.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Underlying filesystem error.
        #[source]
        source: SocketPreparationError,
    },
    /// The runtime directory could not be derived or created.
    #[error(transparent)]
    RuntimePaths(#[from] RuntimePathsError),
    /// Lock file creation failed.
    #[error("failed to create lock file '{path}': {source}")]
    LockCreate {
        /// Lock file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A running daemon already holds the lock.
    #[error("daemon already running with pid {pid}")]
    AlreadyRunning {
        /// PID recorded in the existing PID file.
        pid: u32,
    },
    /// Removing a stale runtime artefact failed.
    #[error("failed to remove stale file '{path}': {source}")]
    Cleanup {
        /// Path of the artefact that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing a runtime artefact failed.
    #[error("failed to write '{path}': {source}")]
    ArtefactWrite {
        /// Artefact path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Encoding the health snapshot failed.
    #[error("failed to encode health snapshot: {0}")]
    HealthEncode(#[from] serde_json::Error),
    /// Formatting the health timestamp failed.
    #[error("failed to format health timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    /// Probing the pid recorded by a previous run failed.
    #[error("failed to check existing process {pid}: {source}")]
    CheckProcess {
        /// PID that failed to probe.
        pid: u32,
        /// Underlying OS error.
        source: Errno,
    },
    /// Health updates were attempted before writing the PID file.
    #[error("pid must be written before updating health state")]
    MissingPid,
    /// Daemonisation failed.
    #[error("failed to daemonise: {source}")]
    Daemonize {
        /// Underlying daemonisation error.
        #[source]
        source: DaemonizeError,
    },
    /// Installing or reading signal handlers failed.
    #[error("signal forwarding failed: {source}")]
    Signals {
        /// Underlying signal error.
        #[source]
        source: SignalError,
    },
    /// Bootstrapping the daemon failed.
    #[error("daemon bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// Socket listener startup failed.
    #[error("daemon socket listener failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
    /// The daemon core thread could not be started or panicked.
    #[error("daemon core failed: {message}")]
    Core {
        /// Description of the failure.
        message: String,
    },
}

impl LaunchError {
    /// Process exit status reported for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config { .. } => EXIT_CONFIG,
            Self::Bootstrap { source } => match source {
                BootstrapError::Configuration { .. }
                | BootstrapError::Telemetry { .. }
                | BootstrapError::DeviceConfig { .. } => EXIT_CONFIG,
                BootstrapError::DeviceNotFound { .. } => EXIT_DEVICE_NOT_FOUND,
            },
            Self::Socket { .. } | Self::Listener { .. } => EXIT_SOCKET,
            _ => EXIT_FAILURE,
        }
    }
}

impl From<Arc<OrthoError>> for LaunchError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Config { source }
    }
}

impl From<SocketPreparationError> for LaunchError {
    fn from(source: SocketPreparationError) -> Self {
        Self::Socket { source }
    }
}

impl From<DaemonizeError> for LaunchError {
    fn from(source: DaemonizeError) -> Self {
        Self::Daemonize { source }
    }
}

impl From<SignalError> for LaunchError {
    fn from(source: SignalError) -> Self {
        Self::Signals { source }
    }
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ListenerError> for LaunchError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DriverError;
    use rstest::rstest;

    #[rstest]
    #[case(LaunchError::AlreadyRunning { pid: 7 }, 1)]
    #[case(LaunchError::MissingPid, 1)]
    #[case(
        LaunchError::Bootstrap { source: BootstrapError::DeviceNotFound { source: DriverError::NotConnected } },
        3
    )]
    #[case(LaunchError::Listener { source: ListenerError::ThreadPanic }, 4)]
    fn maps_failures_to_exit_codes(#[case] error: LaunchError, #[case] expected: u8) {
        assert_eq!(error.exit_code(), expected);
    }
}
