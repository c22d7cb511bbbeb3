//! Seam between the adapter and the USB transport.

use hotas_daemon_types::{BrightnessTarget, ClockFormat, DateFormat, LedId, LedState};

use super::command::{ClockSetting, ZoneClock};
use super::errors::DriverError;

/// Identity reported by a successful enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Product name shown in `device.name`.
    pub name: String,
}

impl DeviceInfo {
    /// Builds device information from a product name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Connect and disconnect notifications posted by the driver layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The device appeared.
    Connected,
    /// The device went away.
    Disconnected,
}

/// Synchronous driver calls.
///
/// Each call either completes or returns a [`DriverError`]; implementations
/// enforce their own timeouts and report them as [`DriverError::Timeout`].
pub trait HotasDriver: Send + Sync {
    /// Looks for an attached device.
    fn enumerate_device(&mut self) -> Result<DeviceInfo, DriverError>;

    /// Sets the primary clock.
    fn set_clock(&mut self, clock: &ClockSetting) -> Result<(), DriverError>;

    /// Points a secondary clock at `timezone`, shown in `format`.
    fn set_zone_clock(
        &mut self,
        clock: ZoneClock,
        timezone: &str,
        format: ClockFormat,
    ) -> Result<(), DriverError>;

    /// Sets the date display order.
    fn set_date_format(&mut self, format: DateFormat) -> Result<(), DriverError>;

    /// Writes one MFD line.
    fn set_mfd_text(&mut self, line: usize, text: &str) -> Result<(), DriverError>;

    /// Sets one LED.
    fn set_led(&mut self, led: LedId, state: LedState) -> Result<(), DriverError>;

    /// Sets a backlight level.
    fn set_brightness(&mut self, target: BrightnessTarget, level: u16)
    -> Result<(), DriverError>;
}
