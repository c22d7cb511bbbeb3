use serde::{Deserialize, Serialize};

/// Version of the request/response contract. Bumped on breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Name the daemon announces in its banner.
pub const DAEMON_NAME: &str = "hotasd";

/// First frame written by the daemon on every connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    /// Daemon name, always [`DAEMON_NAME`].
    pub daemon: String,
    /// Daemon package version.
    pub version: String,
    /// Protocol version spoken on this connection.
    pub protocol: u32,
}

impl Banner {
    /// Builds the banner for the current protocol version.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            daemon: DAEMON_NAME.to_owned(),
            version: version.into(),
            protocol: PROTOCOL_VERSION,
        }
    }

    /// Reports whether a client built against this crate can talk to the
    /// daemon that sent the banner.
    #[must_use]
    pub const fn is_compatible(&self) -> bool {
        self.protocol == PROTOCOL_VERSION
    }
}
