//! Last-applied device state.

use std::collections::BTreeMap;

use hotas_daemon_types::{BrightnessTarget, ClockFormat, DateFormat, LedId, LedState, MFD_LINES};

use super::command::{ClockSetting, DeviceCommand, ZoneClock};

/// What the device was last told, field by field.
///
/// Only successful driver calls are recorded, so after a reconnect the
/// state can be replayed verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    clock: Option<ClockSetting>,
    zone_clocks: BTreeMap<ZoneClock, (String, ClockFormat)>,
    date_format: Option<DateFormat>,
    mfd_lines: [Option<String>; MFD_LINES],
    leds: BTreeMap<LedId, LedState>,
    brightness: BTreeMap<BrightnessTarget, u16>,
}

impl DeviceState {
    /// Last clock setting.
    #[must_use]
    pub const fn clock(&self) -> Option<&ClockSetting> {
        self.clock.as_ref()
    }

    /// Last timezone and format given to a secondary clock.
    #[must_use]
    pub fn zone_clock(&self, clock: ZoneClock) -> Option<(&str, ClockFormat)> {
        self.zone_clocks
            .get(&clock)
            .map(|(timezone, format)| (timezone.as_str(), *format))
    }

    /// Last date display order.
    #[must_use]
    pub const fn date_format(&self) -> Option<DateFormat> {
        self.date_format
    }

    /// Last text written to `line`.
    #[must_use]
    pub fn mfd_line(&self, line: usize) -> Option<&str> {
        self.mfd_lines.get(line).and_then(Option::as_deref)
    }

    /// Last state applied to `led`.
    #[must_use]
    pub fn led(&self, led: LedId) -> Option<LedState> {
        self.leds.get(&led).copied()
    }

    /// Last level applied to `target`.
    #[must_use]
    pub fn brightness(&self, target: BrightnessTarget) -> Option<u16> {
        self.brightness.get(&target).copied()
    }

    /// Whether nothing has been applied yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clock.is_none()
            && self.zone_clocks.is_empty()
            && self.date_format.is_none()
            && self.mfd_lines.iter().all(Option::is_none)
            && self.leds.is_empty()
            && self.brightness.is_empty()
    }

    pub(super) fn record(&mut self, command: &DeviceCommand) {
        match command {
            DeviceCommand::SetClock(clock) => self.clock = Some(clock.clone()),
            DeviceCommand::SetZoneClock {
                clock,
                timezone,
                format,
            } => {
                self.zone_clocks.insert(*clock, (timezone.clone(), *format));
            }
            DeviceCommand::SetDateFormat(format) => self.date_format = Some(*format),
            DeviceCommand::SetMfdText { line, text } => {
                if let Some(slot) = self.mfd_lines.get_mut(*line) {
                    *slot = Some(text.clone());
                }
            }
            DeviceCommand::SetLed { led, state } => {
                self.leds.insert(*led, *state);
            }
            DeviceCommand::SetBrightness { target, level } => {
                self.brightness.insert(*target, *level);
            }
        }
    }

    /// Commands that reproduce this state, clocks first.
    pub(super) fn replay_commands(&self) -> Vec<DeviceCommand> {
        let clock = self.clock.iter().cloned().map(DeviceCommand::SetClock);
        let zones = self
            .zone_clocks
            .iter()
            .map(|(clock, (timezone, format))| DeviceCommand::SetZoneClock {
                clock: *clock,
                timezone: timezone.clone(),
                format: *format,
            });
        let date = self.date_format.map(DeviceCommand::SetDateFormat);
        let mfd = self
            .mfd_lines
            .iter()
            .enumerate()
            .filter_map(|(line, text)| {
                text.as_ref().map(|text| DeviceCommand::SetMfdText {
                    line,
                    text: text.clone(),
                })
            });
        let leds = self
            .leds
            .iter()
            .map(|(led, state)| DeviceCommand::SetLed {
                led: *led,
                state: *state,
            });
        let brightness = self
            .brightness
            .iter()
            .map(|(target, level)| DeviceCommand::SetBrightness {
                target: *target,
                level: *level,
            });
        clock
            .chain(zones)
            .chain(date)
            .chain(mfd)
            .chain(leds)
            .chain(brightness)
            .collect()
    }
}
