//! In-process driver used in place of the USB transport.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hotas_daemon_types::{BrightnessTarget, ClockFormat, DateFormat, LedId, LedState};

use super::command::{ClockSetting, DeviceCommand, ZoneClock};
use super::driver::{DeviceEvent, DeviceInfo, HotasDriver};
use super::errors::DriverError;
use crate::daemon::EventSender;

const DEFAULT_NAME: &str = "Saitek X52 Pro (simulated)";

#[derive(Debug)]
struct Inner {
    name: String,
    plugged: bool,
    calls: Vec<DeviceCommand>,
    notifier: Option<EventSender>,
}

/// Driver that records every write and can be unplugged on demand.
///
/// Clones share state, so a test can keep one handle while the adapter owns
/// another.
#[derive(Debug, Clone)]
pub struct SimulatedDriver {
    inner: Arc<Mutex<Inner>>,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl SimulatedDriver {
    /// Builds a plugged-in device with the given product name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                name: name.into(),
                plugged: true,
                calls: Vec::new(),
                notifier: None,
            })),
        }
    }

    /// Builds a driver whose device is initially absent.
    #[must_use]
    pub fn absent() -> Self {
        let driver = Self::default();
        driver.lock().plugged = false;
        driver
    }

    /// Posts connect and disconnect notifications to `sender`.
    #[must_use]
    pub fn with_notifier(self, sender: EventSender) -> Self {
        self.lock().notifier = Some(sender);
        self
    }

    /// Simulates pulling the cable.
    pub fn unplug(&self) {
        self.transition(false, DeviceEvent::Disconnected);
    }

    /// Simulates plugging the cable back in.
    pub fn replug(&self) {
        self.transition(true, DeviceEvent::Connected);
    }

    /// Whether the simulated device is attached.
    #[must_use]
    pub fn is_plugged(&self) -> bool {
        self.lock().plugged
    }

    /// Every write the device accepted, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<DeviceCommand> {
        self.lock().calls.clone()
    }

    /// Forgets recorded writes.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn transition(&self, plugged: bool, event: DeviceEvent) {
        let notifier = {
            let mut inner = self.lock();
            if inner.plugged == plugged {
                return;
            }
            inner.plugged = plugged;
            inner.notifier.clone()
        };
        if let Some(sender) = notifier {
            sender.notify_device(event);
        }
    }

    fn record(&self, command: DeviceCommand) -> Result<(), DriverError> {
        let mut inner = self.lock();
        if !inner.plugged {
            return Err(DriverError::NotConnected);
        }
        inner.calls.push(command);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HotasDriver for SimulatedDriver {
    fn enumerate_device(&mut self) -> Result<DeviceInfo, DriverError> {
        let inner = self.lock();
        if inner.plugged {
            Ok(DeviceInfo::new(inner.name.clone()))
        } else {
            Err(DriverError::NotConnected)
        }
    }

    fn set_clock(&mut self, clock: &ClockSetting) -> Result<(), DriverError> {
        self.record(DeviceCommand::SetClock(clock.clone()))
    }

    fn set_zone_clock(
        &mut self,
        clock: ZoneClock,
        timezone: &str,
        format: ClockFormat,
    ) -> Result<(), DriverError> {
        self.record(DeviceCommand::SetZoneClock {
            clock,
            timezone: timezone.to_owned(),
            format,
        })
    }

    fn set_date_format(&mut self, format: DateFormat) -> Result<(), DriverError> {
        self.record(DeviceCommand::SetDateFormat(format))
    }

    fn set_mfd_text(&mut self, line: usize, text: &str) -> Result<(), DriverError> {
        self.record(DeviceCommand::SetMfdText {
            line,
            text: text.to_owned(),
        })
    }

    fn set_led(&mut self, led: LedId, state: LedState) -> Result<(), DriverError> {
        self.record(DeviceCommand::SetLed { led, state })
    }

    fn set_brightness(
        &mut self,
        target: BrightnessTarget,
        level: u16,
    ) -> Result<(), DriverError> {
        self.record(DeviceCommand::SetBrightness { target, level })
    }
}
