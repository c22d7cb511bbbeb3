//! Structured telemetry initialisation for the daemon.
//!
//! The global subscriber is a registry carrying an [`EnvFilter`] behind a
//! reload layer, so the `set-log-level` command can swap the filter while the
//! daemon runs.

use std::io::{self, IsTerminal};
use std::str::FromStr;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::{Layer, Layered, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Registry, reload};

use hotas_config::{Config, LogFormat};

type FilterHandle = reload::Handle<EnvFilter, Registry>;
type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;

static TELEMETRY_GUARD: OnceCell<FilterHandle> = OnceCell::new();

/// Errors encountered while configuring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] TryInitError),
    /// The live filter could not be replaced.
    #[error("failed to reload log filter: {0}")]
    Reload(String),
}

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    reload: Option<FilterHandle>,
}

impl TelemetryHandle {
    /// A handle that is not attached to any subscriber.
    #[must_use]
    pub const fn detached() -> Self {
        Self { reload: None }
    }

    /// Builds the runtime log control seeded with `filter`.
    #[must_use]
    pub fn log_control(&self, filter: impl Into<String>) -> LogControl {
        LogControl {
            filter: filter.into(),
            reload: self.reload.clone(),
        }
    }
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls reuse the handle from the first installation.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|handle| TelemetryHandle {
            reload: Some(handle.clone()),
        })
}

fn install_subscriber(config: &Config) -> Result<FilterHandle, TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let (filter_layer, handle) = reload::Layer::new(filter);

    let output: Box<dyn Layer<FilteredRegistry> + Send + Sync> = match config.log_format() {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(io::stderr)
            .with_ansi(false)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            // Colour only when a person is watching.
            .with_ansi(io::stderr().is_terminal())
            .with_timer(UtcTime::rfc_3339())
            .with_writer(io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(output)
        .try_init()?;
    Ok(handle)
}

fn parse_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(expression).map_err(|error| TelemetryError::Filter(error.to_string()))
}

/// Runtime view of the daemon's log level.
#[derive(Debug, Clone)]
pub struct LogControl {
    filter: String,
    reload: Option<FilterHandle>,
}

impl LogControl {
    /// A control that only tracks the level, used when no subscriber is
    /// attached.
    #[must_use]
    pub fn detached(filter: impl Into<String>) -> Self {
        TelemetryHandle::detached().log_control(filter)
    }

    /// Current filter expression.
    #[must_use]
    pub fn level(&self) -> &str {
        &self.filter
    }

    /// Replaces the filter with a single global level.
    ///
    /// Accepts `off`, `error`, `warn`, `info`, `debug` or `trace`, in any
    /// case. Returns the canonical level name.
    pub fn set_level(&mut self, level: &str) -> Result<String, TelemetryError> {
        let trimmed = level.trim();
        let unknown = || TelemetryError::Filter(format!("unknown log level '{trimmed}'"));
        if trimmed.is_empty() {
            return Err(unknown());
        }
        let parsed = LevelFilter::from_str(trimmed).map_err(|_| unknown())?;
        let name = parsed.to_string().to_ascii_lowercase();
        if let Some(handle) = &self.reload {
            let filter = parse_filter(&name)?;
            handle
                .reload(filter)
                .map_err(|error| TelemetryError::Reload(error.to_string()))?;
        }
        self.filter.clone_from(&name);
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("DEBUG", "debug")]
    #[case(" warn ", "warn")]
    #[case("off", "off")]
    fn set_level_canonicalises_names(#[case] input: &str, #[case] expected: &str) {
        let mut control = LogControl::detached("info");
        assert_eq!(control.set_level(input).expect("valid level"), expected);
        assert_eq!(control.level(), expected);
    }

    #[rstest]
    #[case("verbose")]
    #[case("hotasd=debug")]
    #[case("")]
    fn set_level_rejects_other_expressions(#[case] input: &str) {
        let mut control = LogControl::detached("info");
        assert!(matches!(
            control.set_level(input),
            Err(TelemetryError::Filter(_))
        ));
        assert_eq!(control.level(), "info");
    }
}
