use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::{config_dir, runtime_dir};

use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Loopback TCP port used where Unix domain sockets are unavailable.
pub const DEFAULT_TCP_PORT: u16 = 5252;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default idle timeout, in seconds, before a quiet session is closed.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Default cap on concurrent client sessions.
pub const DEFAULT_MAX_CLIENTS: usize = 63;

const APP_DIR: &str = "hotasd";

/// Default log filter expression used by the daemon.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

pub(crate) fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

pub(crate) const fn default_idle_timeout_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

pub(crate) const fn default_max_clients() -> usize {
    DEFAULT_MAX_CLIENTS
}

/// Default location of the device configuration file.
///
/// Resolves to `$XDG_CONFIG_HOME/hotasd/hotasd.toml`, falling back to
/// `/etc/hotasd/hotasd.toml` when no user configuration directory exists.
#[must_use]
pub fn default_device_config() -> Utf8PathBuf {
    #[cfg(unix)]
    {
        if let Some(dir) = config_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok()) {
            return dir.join(APP_DIR).join("hotasd.toml");
        }
    }
    Utf8PathBuf::from("/etc").join(APP_DIR).join("hotasd.toml")
}

/// Computes the default socket endpoint for the daemon.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    let mut base = match runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok()) {
        Some(dir) => dir.join(APP_DIR),
        None => fallback_base_directory()
            .join(APP_DIR)
            .join(user_namespace()),
    };
    base.push("hotasd.sock");
    SocketEndpoint::unix(base)
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
pub(crate) fn user_namespace() -> String {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_config_lives_under_app_directory() {
        let path = default_device_config();
        assert_eq!(path.file_name(), Some("hotasd.toml"));
        assert_eq!(
            path.parent().and_then(|parent| parent.file_name()),
            Some(APP_DIR)
        );
    }

    #[cfg(unix)]
    #[test]
    fn default_socket_is_a_unix_socket() {
        let endpoint = default_socket_endpoint();
        let path = endpoint.unix_path().expect("default endpoint should be unix");
        assert_eq!(path.file_name(), Some("hotasd.sock"));
    }
}
