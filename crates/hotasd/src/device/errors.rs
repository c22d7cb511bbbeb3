//! Failures raised by the device layer.

use thiserror::Error;

use hotas_daemon_types::ErrorCode;

/// Errors reported by a [`super::HotasDriver`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// No device is attached.
    #[error("device is not connected")]
    NotConnected,
    /// The device did not answer within the driver's own deadline.
    #[error("device did not respond in time")]
    Timeout,
    /// The transport reported a failure.
    #[error("device transport failed: {message}")]
    Transport { message: String },
}

impl DriverError {
    /// Builds a transport failure.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Errors reported by [`super::DeviceAdapter::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The command argument is outside the device's range.
    #[error("{message}")]
    InvalidArgument { message: String },
    /// The device is absent or the driver call failed.
    #[error(transparent)]
    Unavailable(#[from] DriverError),
}

impl DeviceError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Maps the failure onto its wire error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Unavailable(_) => ErrorCode::DeviceUnavailable,
        }
    }
}
