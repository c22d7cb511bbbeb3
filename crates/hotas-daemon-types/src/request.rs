use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Command names understood by the daemon.
pub mod commands {
    /// Liveness probe.
    pub const PING: &str = "ping";
    /// Read one configuration parameter.
    pub const GET_CONFIG: &str = "get-config";
    /// Write one configuration parameter.
    pub const SET_CONFIG: &str = "set-config";
    /// Load the configuration file, optionally from a new path.
    pub const LOAD_CONFIG: &str = "load-config";
    /// Save the configuration file, optionally to another path.
    pub const SAVE_CONFIG: &str = "save-config";
    /// Re-read the configuration file from its current path.
    pub const RELOAD_CONFIG: &str = "reload-config";
    /// Push persisted device parameters to the device.
    pub const APPLY_CONFIG: &str = "apply-config";
    /// Read the daemon log filter.
    pub const GET_LOG_LEVEL: &str = "get-log-level";
    /// Replace the daemon log filter.
    pub const SET_LOG_LEVEL: &str = "set-log-level";
    /// Set the device clock.
    pub const SET_CLOCK: &str = "set-clock";
    /// Write one MFD line.
    pub const SET_MFD: &str = "set-mfd";
    /// Change one LED.
    pub const SET_LED: &str = "set-led";
}

/// A single client request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Command name, for example `set-config`.
    pub command: String,
    /// Named arguments for the command.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub arguments: Map<String, Value>,
}

impl Request {
    /// Builds a request with no arguments.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            arguments: Map::new(),
        }
    }

    /// Adds a named argument.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Looks up a named argument.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }
}
