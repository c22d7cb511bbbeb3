//! The single owned resource behind the shared/exclusive lock.

use std::str::FromStr;
use std::sync::{Arc, RwLock};

use strum::IntoEnumIterator;
use time::{OffsetDateTime, Time};
use tracing::{debug, error, warn};

use hotas_daemon_types::{BrightnessTarget, ClockFormat, DateFormat, LedId, LedState};

use crate::config_store::{ConfigStore, ParamValue};
use crate::device::{
    ClockSetting, DeviceAdapter, DeviceCommand, DeviceError, DeviceInfo, DriverError,
    ReplayReport, ZoneClock,
};
use crate::dispatch::DispatchError;
use crate::telemetry::LogControl;

use super::CORE_TARGET;

/// Configuration, device and log level, mutated only under the gate.
#[derive(Debug)]
pub struct DaemonState {
    pub(crate) config: ConfigStore,
    pub(crate) device: DeviceAdapter,
    pub(crate) logging: LogControl,
}

impl DaemonState {
    /// Bundles the daemon's mutable resources.
    #[must_use]
    pub fn new(config: ConfigStore, device: DeviceAdapter, logging: LogControl) -> Self {
        Self {
            config,
            device,
            logging,
        }
    }

    /// Configuration store.
    #[must_use]
    pub const fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Device adapter.
    #[must_use]
    pub const fn device(&self) -> &DeviceAdapter {
        &self.device
    }

    /// Pushes the persisted `clock.*`, `led.*` and `brightness.*`
    /// parameters to the device, continuing past individual failures.
    ///
    /// The primary clock is set to the current time only while
    /// `clock.enabled` is true.
    pub fn apply_config(&mut self) -> Result<ReplayReport, DeviceError> {
        let commands = configured_commands(&self.config);
        self.device.apply_all(commands)
    }

    /// Applies freshly loaded parameters when the device is attached.
    ///
    /// Returns `None` when there is no device to write to; the values stay
    /// in the store for the next `apply-config`.
    pub(crate) fn apply_loaded(&mut self) -> Option<ReplayReport> {
        if !self.device.is_connected() {
            debug!(target: CORE_TARGET, "no device attached; loaded values not applied");
            return None;
        }
        match self.apply_config() {
            Ok(report) => Some(report),
            Err(failure) => {
                warn!(target: CORE_TARGET, error = %failure, "loaded values not applied");
                self.publish_device();
                None
            }
        }
    }

    /// Handles the device appearing: replays cached state and publishes
    /// `device.connected` and `device.name`.
    pub fn device_connected(&mut self) -> Result<(DeviceInfo, ReplayReport), DriverError> {
        let outcome = self.device.on_reconnect();
        self.publish_device();
        let report = outcome?;
        let info = self
            .device
            .info()
            .cloned()
            .ok_or(DriverError::NotConnected)?;
        Ok((info, report))
    }

    /// Handles the device going away.
    pub fn device_disconnected(&mut self) {
        self.device.mark_disconnected();
        self.publish_device();
    }

    /// Mirrors the adapter's connection state into the runtime keys.
    pub(crate) fn publish_device(&mut self) {
        let connected = self.device.is_connected();
        let name = self
            .device
            .info()
            .map(|info| info.name.clone())
            .unwrap_or_default();
        for (key, value) in [
            ("device.connected", ParamValue::Bool(connected)),
            ("device.name", ParamValue::Str(name)),
        ] {
            if let Err(failure) = self.config.set_runtime(key, value) {
                error!(target: CORE_TARGET, key, error = %failure, "runtime key rejected");
            }
        }
    }
}

fn configured_commands(config: &ConfigStore) -> Vec<DeviceCommand> {
    let primary = primary_clock(config).map(DeviceCommand::SetClock);
    let zones = ZoneClock::iter().filter_map(|clock| {
        let timezone = config.get(&format!("clock.{clock}")).ok()?.as_str()?;
        let format = parsed::<ClockFormat>(config, &format!("clock.format_{clock}"))?;
        Some(DeviceCommand::SetZoneClock {
            clock,
            timezone: timezone.to_owned(),
            format,
        })
    });
    let date =
        parsed::<DateFormat>(config, "clock.date_format").map(DeviceCommand::SetDateFormat);
    let leds = LedId::iter().filter_map(|led| {
        let key = format!("led.{led}");
        let state = config
            .get(&key)
            .ok()
            .and_then(ParamValue::as_str)
            .and_then(|text| LedState::from_str(text).ok())?;
        Some(DeviceCommand::SetLed { led, state })
    });
    let brightness = BrightnessTarget::iter().filter_map(|target| {
        let key = format!("brightness.{target}");
        let level = config
            .get(&key)
            .ok()
            .and_then(ParamValue::as_int)
            .and_then(|level| u16::try_from(level).ok())?;
        Some(DeviceCommand::SetBrightness { target, level })
    });
    primary
        .into_iter()
        .chain(zones)
        .chain(date)
        .chain(leds)
        .chain(brightness)
        .collect()
}

fn primary_clock(config: &ConfigStore) -> Option<ClockSetting> {
    if !config.get("clock.enabled").ok()?.as_bool()? {
        return None;
    }
    let local = config.get("clock.primary_is_local").ok()?.as_bool()?;
    let format = parsed::<ClockFormat>(config, "clock.format")?;
    let (now, timezone) = if local {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        (now, "local")
    } else {
        (OffsetDateTime::now_utc(), "UTC")
    };
    let time = Time::from_hms(now.hour(), now.minute(), 0).ok()?;
    ClockSetting::new(time, timezone, format).ok()
}

fn parsed<T: FromStr>(config: &ConfigStore, key: &str) -> Option<T> {
    config
        .get(key)
        .ok()
        .and_then(ParamValue::as_str)
        .and_then(|text| T::from_str(text).ok())
}

/// Shared/exclusive gate around [`DaemonState`].
///
/// Readers run concurrently; a writer runs alone. The lock is held only for
/// the closure, never across socket reads or writes.
#[derive(Debug, Clone)]
pub struct StateGate {
    inner: Arc<RwLock<DaemonState>>,
}

impl StateGate {
    /// Places `state` behind the gate.
    #[must_use]
    pub fn new(state: DaemonState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Runs `operation` under the shared lock.
    pub fn read<T>(
        &self,
        operation: impl FnOnce(&DaemonState) -> Result<T, DispatchError>,
    ) -> Result<T, DispatchError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| DispatchError::internal("daemon state lock poisoned"))?;
        operation(&guard)
    }

    /// Runs `operation` under the exclusive lock.
    pub fn write<T>(
        &self,
        operation: impl FnOnce(&mut DaemonState) -> Result<T, DispatchError>,
    ) -> Result<T, DispatchError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| DispatchError::internal("daemon state lock poisoned"))?;
        operation(&mut guard)
    }
}
