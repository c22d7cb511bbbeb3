//! Error types for request dispatch failures.
//!
//! Every variant maps onto exactly one wire [`ErrorCode`]; the session turns
//! the error into a structured response and stays open.

use thiserror::Error;

use hotas_daemon_types::ErrorCode;

use crate::config_store::ConfigError;
use crate::device::{DeviceError, DriverError};

use super::command::Privilege;

/// Errors surfaced while decoding or executing a command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Unknown command name, or missing or ill-typed arguments.
    #[error("{message}")]
    InvalidCommand { message: String },

    /// The session's tier does not allow the command.
    #[error("'{command}' requires {required} privilege")]
    PermissionDenied {
        command: &'static str,
        required: Privilege,
    },

    /// An argument is well-typed but outside the accepted values.
    #[error("{message}")]
    InvalidArgument { message: String },

    /// The configuration store rejected the operation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The device adapter rejected the operation.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Internal error (e.g., lock poisoned).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl DispatchError {
    /// Wire error code reported to the client.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidCommand { .. } => ErrorCode::InvalidCommand,
            Self::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Config(error) => error.code(),
            Self::Device(error) => error.code(),
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Creates an invalid command error.
    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::InvalidCommand {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<DriverError> for DispatchError {
    fn from(error: DriverError) -> Self {
        Self::Device(DeviceError::from(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DispatchError::invalid_command("nope"), ErrorCode::InvalidCommand)]
    #[case(
        DispatchError::PermissionDenied { command: "set-led", required: Privilege::Control },
        ErrorCode::PermissionDenied
    )]
    #[case(DispatchError::invalid_argument("line 9"), ErrorCode::InvalidArgument)]
    #[case(
        DispatchError::from(ConfigError::UnknownKey { key: "led.z".to_owned() }),
        ErrorCode::UnknownKey
    )]
    #[case(DispatchError::from(DriverError::Timeout), ErrorCode::DeviceUnavailable)]
    #[case(DispatchError::internal("poisoned"), ErrorCode::Internal)]
    fn maps_errors_to_wire_codes(#[case] error: DispatchError, #[case] code: ErrorCode) {
        assert_eq!(error.code(), code);
    }
}
