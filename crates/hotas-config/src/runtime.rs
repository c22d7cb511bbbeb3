//! Runtime artefact locations for the daemon supervisor.
//!
//! The lock, pid and health files live next to the Unix socket so every
//! tool that can reach the socket can also inspect the daemon's lifecycle.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{Config, SocketEndpoint};

#[cfg(unix)]
use dirs::runtime_dir;

/// Canonical paths for runtime artefacts written by the daemon.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    runtime_dir: PathBuf,
    lock_path: PathBuf,
    pid_path: PathBuf,
    health_path: PathBuf,
}

impl RuntimePaths {
    /// Derives runtime paths from the launch configuration and creates the
    /// runtime directory.
    ///
    /// # Errors
    ///
    /// Fails when the socket path has no parent or the directory cannot be
    /// created.
    pub fn from_config(config: &Config) -> Result<Self, RuntimePathsError> {
        let runtime_dir = runtime_directory(config.daemon_socket())?;
        fs::create_dir_all(&runtime_dir).map_err(|source| RuntimePathsError::RuntimeDirectory {
            path: runtime_dir.clone(),
            source,
        })?;
        Ok(Self {
            lock_path: runtime_dir.join("hotasd.lock"),
            pid_path: runtime_dir.join("hotasd.pid"),
            health_path: runtime_dir.join("hotasd.health"),
            runtime_dir,
        })
    }

    /// Directory holding runtime artefacts.
    #[must_use]
    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    /// Lock file guarding singleton startup.
    #[must_use]
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// PID file.
    #[must_use]
    pub fn pid_path(&self) -> &Path {
        &self.pid_path
    }

    /// Health snapshot.
    #[must_use]
    pub fn health_path(&self) -> &Path {
        &self.health_path
    }
}

fn runtime_directory(endpoint: &SocketEndpoint) -> Result<PathBuf, RuntimePathsError> {
    match endpoint {
        SocketEndpoint::Unix { path } => path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map(|parent| parent.as_std_path().to_path_buf())
            .ok_or_else(|| RuntimePathsError::MissingSocketParent {
                path: path.to_string(),
            }),
        SocketEndpoint::Tcp { .. } => Ok(default_runtime_directory()),
    }
}

fn default_runtime_directory() -> PathBuf {
    #[cfg(unix)]
    {
        if let Some(dir) = runtime_dir() {
            return dir.join("hotasd");
        }
        env::temp_dir()
            .join("hotasd")
            .join(crate::defaults::user_namespace())
    }

    #[cfg(not(unix))]
    {
        env::temp_dir().join("hotasd")
    }
}

/// Errors raised while deriving daemon runtime paths.
#[derive(Debug, Error)]
pub enum RuntimePathsError {
    /// The socket path lacked a parent directory.
    #[error("socket path '{path}' has no parent directory")]
    MissingSocketParent {
        /// Configured socket path.
        path: String,
    },
    /// Creating the runtime directory failed.
    #[error("failed to prepare runtime directory '{path}': {source}")]
    RuntimeDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn unix_socket_directory_hosts_artefacts() {
        let dir = tempfile::tempdir().expect("temp dir");
        let socket = Utf8PathBuf::from_path_buf(dir.path().join("hotasd.sock")).expect("utf8");
        let config = Config {
            daemon_socket: SocketEndpoint::unix(socket),
            ..Config::default()
        };
        let paths = RuntimePaths::from_config(&config).expect("paths derive");
        assert_eq!(paths.runtime_dir(), dir.path());
        assert!(paths.lock_path().ends_with("hotasd.lock"));
        assert!(paths.pid_path().ends_with("hotasd.pid"));
        assert!(paths.health_path().ends_with("hotasd.health"));
    }

    #[test]
    fn rejects_unix_socket_without_parent() {
        let config = Config {
            daemon_socket: SocketEndpoint::unix("hotasd.sock"),
            ..Config::default()
        };
        let error = RuntimePaths::from_config(&config).expect_err("bare socket name rejected");
        assert!(matches!(
            error,
            RuntimePathsError::MissingSocketParent { .. }
        ));
    }
}
