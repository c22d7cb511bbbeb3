//! Device Adapter: the only path from protocol commands to the driver.
//!
//! The adapter validates every command before touching the driver, records
//! what was successfully applied, and replays that record when the device
//! comes back after a disconnect.

mod command;
mod driver;
mod errors;
mod simulated;
mod state;

use tracing::{debug, info, warn};

pub use self::command::{ClockSetting, DeviceCommand, ZoneClock};
pub use self::driver::{DeviceEvent, DeviceInfo, HotasDriver};
pub use self::errors::{DeviceError, DriverError};
pub use self::simulated::SimulatedDriver;
pub use self::state::DeviceState;

const DEVICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::device");

/// Outcome of a best-effort batch of device writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Writes the driver accepted.
    pub applied: usize,
    /// Writes that failed and were skipped.
    pub failed: usize,
}

/// Owns the driver and the last-applied [`DeviceState`].
pub struct DeviceAdapter {
    driver: Box<dyn HotasDriver>,
    state: DeviceState,
    info: Option<DeviceInfo>,
}

impl DeviceAdapter {
    /// Wraps a driver. The device counts as absent until [`Self::probe`].
    #[must_use]
    pub fn new(driver: Box<dyn HotasDriver>) -> Self {
        Self {
            driver,
            state: DeviceState::default(),
            info: None,
        }
    }

    /// Enumerates the device and records whether it is present.
    pub fn probe(&mut self) -> Result<&DeviceInfo, DriverError> {
        match self.driver.enumerate_device() {
            Ok(info) => {
                info!(target: DEVICE_TARGET, name = %info.name, "device enumerated");
                Ok(self.info.insert(info))
            }
            Err(error) => {
                self.info = None;
                Err(error)
            }
        }
    }

    /// Whether the last probe found a device and no disconnect followed.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.info.is_some()
    }

    /// Identity of the connected device.
    #[must_use]
    pub const fn info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    /// Last-applied state.
    #[must_use]
    pub const fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Validates and applies one command.
    ///
    /// Invalid arguments fail before the driver is called. A driver failure
    /// leaves [`DeviceState`] untouched.
    pub fn apply(&mut self, command: DeviceCommand) -> Result<(), DeviceError> {
        command.validate()?;
        if !self.is_connected() {
            return Err(DriverError::NotConnected.into());
        }
        match self.send(&command) {
            Ok(()) => {
                debug!(target: DEVICE_TARGET, command = %command, "device command applied");
                self.state.record(&command);
                Ok(())
            }
            Err(error) => {
                if error == DriverError::NotConnected {
                    self.mark_disconnected();
                }
                Err(error.into())
            }
        }
    }

    /// Applies a batch, continuing past individual failures.
    ///
    /// Fails only when the device is absent.
    pub fn apply_all(
        &mut self,
        commands: impl IntoIterator<Item = DeviceCommand>,
    ) -> Result<ReplayReport, DeviceError> {
        if !self.is_connected() {
            return Err(DriverError::NotConnected.into());
        }
        let mut report = ReplayReport::default();
        for command in commands {
            let label = command.to_string();
            match self.apply(command) {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    warn!(
                        target: DEVICE_TARGET,
                        command = %label,
                        error = %error,
                        "device write skipped"
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Handles the device reappearing: probes, then replays the cached state.
    ///
    /// Individual replay failures are logged and counted; they do not abort
    /// the replay.
    pub fn on_reconnect(&mut self) -> Result<ReplayReport, DriverError> {
        self.probe()?;
        let mut report = ReplayReport::default();
        for command in self.state.replay_commands() {
            match self.send(&command) {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    warn!(
                        target: DEVICE_TARGET,
                        command = %command,
                        error = %error,
                        "replay of cached device state failed"
                    );
                    report.failed += 1;
                }
            }
        }
        info!(
            target: DEVICE_TARGET,
            applied = report.applied,
            failed = report.failed,
            "device state replayed"
        );
        Ok(report)
    }

    /// Records that the device went away. Cached state is kept for replay.
    pub fn mark_disconnected(&mut self) {
        if self.info.take().is_some() {
            info!(target: DEVICE_TARGET, "device disconnected");
        }
    }

    fn send(&mut self, command: &DeviceCommand) -> Result<(), DriverError> {
        match command {
            DeviceCommand::SetClock(clock) => self.driver.set_clock(clock),
            DeviceCommand::SetZoneClock {
                clock,
                timezone,
                format,
            } => self.driver.set_zone_clock(*clock, timezone, *format),
            DeviceCommand::SetDateFormat(format) => self.driver.set_date_format(*format),
            DeviceCommand::SetMfdText { line, text } => self.driver.set_mfd_text(*line, text),
            DeviceCommand::SetLed { led, state } => self.driver.set_led(*led, *state),
            DeviceCommand::SetBrightness { target, level } => {
                self.driver.set_brightness(*target, *level)
            }
        }
    }
}

impl std::fmt::Debug for DeviceAdapter {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DeviceAdapter")
            .field("state", &self.state)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
