use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Stable error identifiers reported to clients.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCode {
    /// Unknown command name, malformed frame, or missing command arguments.
    InvalidCommand,
    /// The session's privilege tier does not allow the command.
    PermissionDenied,
    /// The configuration key does not exist.
    UnknownKey,
    /// The value does not match the parameter's type or range.
    TypeMismatch,
    /// The key cannot be written through this pathway.
    ReadOnly,
    /// The configuration file is not valid syntax.
    ConfigParse,
    /// The configuration file names a key the schema does not know.
    ConfigSchema,
    /// Reading or writing the configuration file failed.
    ConfigIo,
    /// A device command argument is out of range.
    InvalidArgument,
    /// The device is disconnected or the transport failed.
    DeviceUnavailable,
    /// An unexpected internal failure; always logged by the daemon.
    Internal,
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// The command succeeded.
    Ok {
        /// Command-specific result payload.
        #[serde(default)]
        result: Value,
    },
    /// The command failed.
    Error {
        /// Machine-readable error kind.
        error: ErrorCode,
        /// Human-readable detail.
        detail: String,
    },
}

impl Response {
    /// Builds a success response.
    #[must_use]
    pub const fn ok(result: Value) -> Self {
        Self::Ok { result }
    }

    /// Builds an error response.
    #[must_use]
    pub fn error(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Error {
            error: code,
            detail: detail.into(),
        }
    }

    /// Reports whether the command succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Returns the error code of a failed response.
    #[must_use]
    pub const fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Ok { .. } => None,
            Self::Error { error, .. } => Some(*error),
        }
    }

    /// Returns the result payload of a successful response.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match self {
            Self::Ok { result } => Some(result),
            Self::Error { .. } => None,
        }
    }
}
