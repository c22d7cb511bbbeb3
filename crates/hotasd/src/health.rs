//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use camino::Utf8Path;

use hotas_config::Config;

use crate::bootstrap::BootstrapError;
use crate::config_store::ConfigError;
use crate::device::{DeviceInfo, DriverError, ReplayReport};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked when the device is found, after its state has been pushed.
    fn device_connected(&self, info: &DeviceInfo, report: ReplayReport);

    /// Invoked when startup finds no device and continues without one.
    fn device_missing(&self, error: &DriverError);

    /// Invoked when the device goes away.
    fn device_disconnected(&self);

    /// Invoked after an externally triggered reload succeeds.
    fn config_reloaded(&self, path: &Utf8Path, keys: usize);

    /// Invoked when an externally triggered reload fails.
    fn config_reload_failed(&self, error: &ConfigError);

    /// Invoked after an externally triggered save succeeds.
    fn config_saved(&self, path: &Utf8Path);

    /// Invoked when an externally triggered save fails.
    fn config_save_failed(&self, error: &ConfigError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn device_connected(&self, info: &DeviceInfo, report: ReplayReport) {
        (**self).device_connected(info, report);
    }

    fn device_missing(&self, error: &DriverError) {
        (**self).device_missing(error);
    }

    fn device_disconnected(&self) {
        (**self).device_disconnected();
    }

    fn config_reloaded(&self, path: &Utf8Path, keys: usize) {
        (**self).config_reloaded(path, keys);
    }

    fn config_reload_failed(&self, error: &ConfigError) {
        (**self).config_reload_failed(error);
    }

    fn config_saved(&self, path: &Utf8Path) {
        (**self).config_saved(path);
    }

    fn config_save_failed(&self, error: &ConfigError) {
        (**self).config_save_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.daemon_socket(),
            device_config = %config.device_config(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn device_connected(&self, info: &DeviceInfo, report: ReplayReport) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "device_connected",
            device = %info.name,
            applied = report.applied,
            failed = report.failed,
            "device connected"
        );
    }

    fn device_missing(&self, error: &DriverError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "device_missing",
            error = %error,
            "no device found; waiting for it to appear"
        );
    }

    fn device_disconnected(&self) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "device_disconnected",
            "device disconnected"
        );
    }

    fn config_reloaded(&self, path: &Utf8Path, keys: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "config_reloaded",
            path = %path,
            keys,
            "configuration reloaded"
        );
    }

    fn config_reload_failed(&self, error: &ConfigError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "config_reload_failed",
            code = %error.code(),
            error = %error,
            "configuration reload failed; keeping previous values"
        );
    }

    fn config_saved(&self, path: &Utf8Path) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "config_saved",
            path = %path,
            "configuration saved"
        );
    }

    fn config_save_failed(&self, error: &ConfigError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "config_save_failed",
            code = %error.code(),
            error = %error,
            "configuration save failed"
        );
    }
}
