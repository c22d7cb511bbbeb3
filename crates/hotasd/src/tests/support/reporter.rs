//! Test double for [`HealthReporter`] that records structured events for
//! assertions.

use std::sync::Mutex;

use camino::Utf8Path;

use hotas_config::Config;

use crate::bootstrap::BootstrapError;
use crate::config_store::ConfigError;
use crate::device::{DeviceInfo, DriverError, ReplayReport};
use crate::health::HealthReporter;

/// Health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    DeviceConnected { name: String, report: ReplayReport },
    DeviceMissing,
    DeviceDisconnected,
    ConfigReloaded { keys: usize },
    ConfigReloadFailed(hotas_daemon_types::ErrorCode),
    ConfigSaved(String),
    ConfigSaveFailed(hotas_daemon_types::ErrorCode),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn device_connected(&self, info: &DeviceInfo, report: ReplayReport) {
        self.record(HealthEvent::DeviceConnected {
            name: info.name.clone(),
            report,
        });
    }

    fn device_missing(&self, _error: &DriverError) {
        self.record(HealthEvent::DeviceMissing);
    }

    fn device_disconnected(&self) {
        self.record(HealthEvent::DeviceDisconnected);
    }

    fn config_reloaded(&self, _path: &Utf8Path, keys: usize) {
        self.record(HealthEvent::ConfigReloaded { keys });
    }

    fn config_reload_failed(&self, error: &ConfigError) {
        self.record(HealthEvent::ConfigReloadFailed(error.code()));
    }

    fn config_saved(&self, path: &Utf8Path) {
        self.record(HealthEvent::ConfigSaved(path.to_string()));
    }

    fn config_save_failed(&self, error: &ConfigError) {
        self.record(HealthEvent::ConfigSaveFailed(error.code()));
    }
}
