//! Failures reported by the configuration store.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use hotas_daemon_types::ErrorCode;

use super::schema::Scope;

/// Errors surfaced by [`super::ConfigStore`] operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The key is not declared in the schema.
    #[error("unknown configuration key '{key}'")]
    UnknownKey { key: String },
    /// The value does not fit the parameter type.
    #[error("'{key}' expects {expected}, got {found}")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },
    /// The key cannot be written through the attempted pathway.
    #[error("'{key}' is {scope} and cannot be written here")]
    ReadOnly { key: String, scope: Scope },
    /// The file is not valid TOML.
    #[error("failed to parse '{path}': {message}")]
    Parse { path: Utf8PathBuf, message: String },
    /// The file names a key that the schema does not declare.
    #[error("'{path}' sets unknown key '{key}'")]
    Schema { path: Utf8PathBuf, key: String },
    /// Reading or writing the file failed.
    #[error("configuration file '{path}': {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// A startup override was not of the form `section.key=value`.
    #[error("invalid override '{input}': expected section.key=value")]
    Override { input: String },
    /// Rendering the tree as TOML failed.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

impl ConfigError {
    /// Maps the failure onto its wire error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownKey { .. } => ErrorCode::UnknownKey,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::ReadOnly { .. } => ErrorCode::ReadOnly,
            Self::Parse { .. } | Self::Override { .. } => ErrorCode::ConfigParse,
            Self::Schema { .. } => ErrorCode::ConfigSchema,
            Self::Io { .. } => ErrorCode::ConfigIo,
            Self::Render(_) => ErrorCode::Internal,
        }
    }
}
