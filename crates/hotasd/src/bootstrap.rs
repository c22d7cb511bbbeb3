//! Daemon bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::{info, warn};

use hotas_config::Config;

use crate::config_store::{ConfigError, ConfigStore};
use crate::daemon::{DaemonState, StateGate};
use crate::device::{DeviceAdapter, DriverError, HotasDriver};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out an already resolved configuration.
///
/// The launcher loads once, before daemonising, and bootstraps from the
/// same values afterwards.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Launch configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The device configuration file or a startup override was rejected.
    #[error("device configuration rejected: {source}")]
    DeviceConfig {
        /// Underlying store error.
        #[source]
        source: ConfigError,
    },
    /// No device was found and the configuration requires one.
    #[error("no HOTAS device found: {source}")]
    DeviceNotFound {
        /// Enumeration failure.
        #[source]
        source: DriverError,
    },
}

/// Result of a successful bootstrap invocation.
#[derive(Debug)]
pub struct Daemon {
    config: Config,
    state: StateGate,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Shared daemon state, ready to hand to sessions and the core.
    #[must_use]
    pub fn state(&self) -> StateGate {
        self.state.clone()
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry.clone()
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// Loads the launch configuration, installs telemetry, opens the device
/// configuration file, applies startup overrides and probes the device. A
/// device found at startup receives the persisted LED and brightness
/// parameters.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    driver: Box<dyn HotasDriver>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;
    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(BootstrapError::Telemetry { source }))?;
    let store = open_store(&config).map_err(|source| fail(BootstrapError::DeviceConfig { source }))?;

    let mut device = DeviceAdapter::new(driver);
    let probe = device.probe().cloned();
    if let Err(source) = &probe {
        if config.require_device() {
            return Err(fail(BootstrapError::DeviceNotFound {
                source: source.clone(),
            }));
        }
        reporter.device_missing(source);
    }

    let logging = telemetry.log_control(config.log_filter());
    let mut state = DaemonState::new(store, device, logging);
    state.publish_device();
    if let Ok(info) = probe {
        match state.apply_config() {
            Ok(report) => reporter.device_connected(&info, report),
            Err(error) => warn!(
                target: BOOTSTRAP_TARGET,
                %error,
                "device vanished before the configuration was applied"
            ),
        }
    }

    reporter.bootstrap_succeeded(&config);
    Ok(Daemon {
        config,
        state: StateGate::new(state),
        telemetry,
    })
}

fn open_store(config: &Config) -> Result<ConfigStore, ConfigError> {
    let mut store = ConfigStore::open(config.device_config())?;
    for input in config.overrides() {
        store.apply_override(input)?;
    }
    if !config.overrides().is_empty() {
        info!(
            target: BOOTSTRAP_TARGET,
            count = config.overrides().len(),
            "startup overrides applied"
        );
    }
    Ok(store)
}
