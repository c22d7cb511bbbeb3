use std::fmt;
use std::fs::DirBuilder;
use std::net::IpAddr;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Host-local endpoint the daemon listens on.
///
/// Unix domain sockets are the primary transport. TCP exists for platforms
/// without them and is restricted to loopback hosts; see
/// [`SocketEndpoint::is_host_local`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain socket endpoint.
    Unix {
        /// Filesystem path of the socket.
        path: Utf8PathBuf,
    },
    /// Loopback TCP endpoint.
    Tcp {
        /// Host name or address; must resolve to loopback.
        host: String,
        /// TCP port; zero asks the OS for an ephemeral port.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP socket endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket path for Unix endpoints.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }

    /// Reports whether the endpoint cannot be reached from another host.
    ///
    /// TCP hosts must be `localhost` or a loopback address literal. Names
    /// are not resolved here; the listener re-checks every resolved address.
    #[must_use]
    pub fn is_host_local(&self) -> bool {
        match self {
            Self::Unix { .. } => true,
            Self::Tcp { host, .. } => {
                let trimmed = host.trim_start_matches('[').trim_end_matches(']');
                trimmed.eq_ignore_ascii_case("localhost")
                    || trimmed
                        .parse::<IpAddr>()
                        .is_ok_and(|address| address.is_loopback())
            }
        }
    }

    /// Creates the socket's parent directory with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Fails when the socket path has no parent or the directory cannot be
    /// created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
            return Err(SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            });
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(parent.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            });
        }
        Ok(())
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => {
                let path = url.path();
                if path.is_empty() {
                    return Err(SocketParseError::MissingUnixPath(input.to_owned()));
                }
                Ok(Self::unix(path))
            }
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| SocketParseError::MissingHost(input.to_owned()))?;
                let port = url
                    .port()
                    .ok_or_else(|| SocketParseError::MissingPort(input.to_owned()))?;
                let endpoint = Self::tcp(host, port);
                if !endpoint.is_host_local() {
                    return Err(SocketParseError::NotLoopback(host.to_owned()));
                }
                Ok(endpoint)
            }
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

/// Errors encountered while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Scheme was neither `unix` nor `tcp`.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP host name was missing.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// TCP port was missing.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// TCP host is not a loopback host.
    #[error("TCP host '{0}' is not a loopback address; the daemon socket is host-local only")]
    NotLoopback(String),
    /// Unix socket path was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised when preparing the socket directory.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The socket path has no parent directory.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Configured socket path.
        path: Utf8PathBuf,
    },
    /// The parent directory could not be created.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn displays_unix_socket_as_url() {
        let endpoint = SocketEndpoint::unix("/run/hotasd/hotasd.sock");
        assert_eq!(endpoint.to_string(), "unix:///run/hotasd/hotasd.sock");
    }

    #[rstest]
    #[case("tcp://127.0.0.1:5252", 5252)]
    #[case("tcp://localhost:9000", 9000)]
    #[case("tcp://[::1]:7000", 7000)]
    fn parses_loopback_tcp(#[case] input: &str, #[case] port: u16) {
        let endpoint: SocketEndpoint = input.parse().expect("loopback endpoint parses");
        assert!(matches!(endpoint, SocketEndpoint::Tcp { port: parsed, .. } if parsed == port));
        assert!(endpoint.is_host_local());
    }

    #[rstest]
    #[case("tcp://0.0.0.0:5252")]
    #[case("tcp://192.168.1.20:5252")]
    #[case("tcp://example.com:5252")]
    fn rejects_non_loopback_tcp(#[case] input: &str) {
        let error = input.parse::<SocketEndpoint>().expect_err("remote host rejected");
        assert!(matches!(error, SocketParseError::NotLoopback(_)));
    }

    #[rstest]
    fn rejects_unknown_scheme() {
        let error = "udp://127.0.0.1:1".parse::<SocketEndpoint>().expect_err("udp rejected");
        assert!(matches!(error, SocketParseError::UnsupportedScheme(_)));
    }

    #[rstest]
    fn prepare_filesystem_creates_parent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let socket = Utf8PathBuf::from_path_buf(dir.path().join("nested").join("hotasd.sock"))
            .expect("utf8 path");
        let endpoint = SocketEndpoint::unix(socket.clone());
        endpoint.prepare_filesystem().expect("prepare socket dir");
        assert!(socket.parent().is_some_and(|parent| parent.is_dir()));
    }

    #[rstest]
    fn prepare_filesystem_rejects_bare_file_name() {
        let endpoint = SocketEndpoint::unix("hotasd.sock");
        let error = endpoint.prepare_filesystem().expect_err("missing parent");
        assert!(matches!(error, SocketPreparationError::MissingParent { .. }));
    }
}
