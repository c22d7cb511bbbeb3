//! Validated device commands.

use std::fmt;
use std::str::FromStr;

use strum::{Display, EnumIter};
use time::Time;

use hotas_daemon_types::{
    BrightnessTarget, ClockFormat, DateFormat, LedId, LedState, MAX_BRIGHTNESS, MFD_LINE_WIDTH,
    MFD_LINES,
};

use super::errors::DeviceError;

const MAX_TIMEZONE_BYTES: usize = 64;

/// Time of day, timezone label and display format for the primary clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSetting {
    time: Time,
    timezone: String,
    format: ClockFormat,
}

impl ClockSetting {
    /// Builds a clock setting, validating the timezone label.
    pub fn new(
        time: Time,
        timezone: impl Into<String>,
        format: ClockFormat,
    ) -> Result<Self, DeviceError> {
        let timezone = timezone.into();
        validate_timezone(&timezone)?;
        Ok(Self {
            time,
            timezone,
            format,
        })
    }

    /// Parses `HH:MM` in 24-hour notation.
    pub fn parse_time(input: &str) -> Result<Time, DeviceError> {
        let invalid = || DeviceError::invalid(format!("time '{input}' is not HH:MM"));
        let (hour, minute) = input.trim().split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour = u8::from_str(hour).map_err(|_| invalid())?;
        let minute = u8::from_str(minute).map_err(|_| invalid())?;
        Time::from_hms(hour, minute, 0).map_err(|_| invalid())
    }

    /// Time of day.
    #[must_use]
    pub const fn time(&self) -> Time {
        self.time
    }

    /// Timezone label.
    #[must_use]
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Display format.
    #[must_use]
    pub const fn format(&self) -> ClockFormat {
        self.format
    }

    /// Time of day rendered as `HH:MM`.
    #[must_use]
    pub fn time_label(&self) -> String {
        format!("{:02}:{:02}", self.time.hour(), self.time.minute())
    }
}

impl fmt::Display for ClockSetting {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {} ({})",
            self.time_label(),
            self.timezone,
            self.format
        )
    }
}

/// The two clocks that show the primary time shifted into another zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ZoneClock {
    /// Second clock on the MFD.
    Secondary,
    /// Third clock on the MFD.
    Tertiary,
}

fn validate_timezone(timezone: &str) -> Result<(), DeviceError> {
    if timezone.is_empty() || timezone.len() > MAX_TIMEZONE_BYTES {
        return Err(DeviceError::invalid(format!(
            "timezone must be 1 to {MAX_TIMEZONE_BYTES} bytes"
        )));
    }
    let allowed = |ch: char| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '+' | '-' | '/');
    if !timezone.chars().all(allowed) {
        return Err(DeviceError::invalid(format!(
            "timezone '{timezone}' contains unsupported characters"
        )));
    }
    Ok(())
}

/// A device mutation accepted by [`super::DeviceAdapter::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Set the primary clock.
    SetClock(ClockSetting),
    /// Point a secondary clock at a timezone.
    SetZoneClock {
        clock: ZoneClock,
        timezone: String,
        format: ClockFormat,
    },
    /// Set the date display order.
    SetDateFormat(DateFormat),
    /// Write one MFD line.
    SetMfdText { line: usize, text: String },
    /// Set one LED.
    SetLed { led: LedId, state: LedState },
    /// Set a backlight level.
    SetBrightness {
        target: BrightnessTarget,
        level: u16,
    },
}

impl DeviceCommand {
    /// Checks argument ranges before any driver call.
    pub fn validate(&self) -> Result<(), DeviceError> {
        match self {
            Self::SetClock(clock) => validate_timezone(&clock.timezone),
            Self::SetZoneClock { timezone, .. } => validate_timezone(timezone),
            Self::SetDateFormat(_) => Ok(()),
            Self::SetMfdText { line, text } => validate_mfd(*line, text),
            Self::SetLed { led, state } => {
                if led.supports(*state) {
                    Ok(())
                } else {
                    Err(DeviceError::invalid(format!(
                        "LED {led} accepts {}, not {state}",
                        led.describe_states()
                    )))
                }
            }
            Self::SetBrightness { target, level } => {
                if *level <= MAX_BRIGHTNESS {
                    Ok(())
                } else {
                    Err(DeviceError::invalid(format!(
                        "{target} brightness {level} exceeds {MAX_BRIGHTNESS}"
                    )))
                }
            }
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetClock(clock) => write!(formatter, "clock {clock}"),
            Self::SetZoneClock {
                clock,
                timezone,
                format,
            } => write!(formatter, "{clock} clock {timezone} ({format})"),
            Self::SetDateFormat(format) => write!(formatter, "date format {format}"),
            Self::SetMfdText { line, text } => write!(formatter, "mfd line {line} \"{text}\""),
            Self::SetLed { led, state } => write!(formatter, "led {led} {state}"),
            Self::SetBrightness { target, level } => {
                write!(formatter, "{target} brightness {level}")
            }
        }
    }
}

fn validate_mfd(line: usize, text: &str) -> Result<(), DeviceError> {
    if line >= MFD_LINES {
        return Err(DeviceError::invalid(format!(
            "MFD line {line} is outside 0..={}",
            MFD_LINES - 1
        )));
    }
    if text.len() > MFD_LINE_WIDTH {
        return Err(DeviceError::invalid(format!(
            "MFD text is {} characters; the display holds {MFD_LINE_WIDTH}",
            text.chars().count()
        )));
    }
    if !text.chars().all(|ch| ch.is_ascii_graphic() || ch == ' ') {
        return Err(DeviceError::invalid(
            "MFD text must be printable ASCII".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("14:32", 14, 32)]
    #[case("00:00", 0, 0)]
    #[case(" 23:59 ", 23, 59)]
    fn parses_clock_times(#[case] input: &str, #[case] hour: u8, #[case] minute: u8) {
        let time = ClockSetting::parse_time(input).expect("valid time");
        assert_eq!((time.hour(), time.minute()), (hour, minute));
    }

    #[rstest]
    #[case("24:00")]
    #[case("12:60")]
    #[case("1:05")]
    #[case("noon")]
    #[case("12-30")]
    fn rejects_malformed_times(#[case] input: &str) {
        assert!(matches!(
            ClockSetting::parse_time(input),
            Err(DeviceError::InvalidArgument { .. })
        ));
    }

    #[rstest]
    #[case("UTC", true)]
    #[case("local", true)]
    #[case("America/Argentina/Buenos_Aires", true)]
    #[case("Etc/GMT+5", true)]
    #[case("", false)]
    #[case("Europe/Lon don", false)]
    fn validates_timezones(#[case] timezone: &str, #[case] accepted: bool) {
        let time = Time::from_hms(8, 0, 0).expect("valid time");
        assert_eq!(
            ClockSetting::new(time, timezone, ClockFormat::TwelveHour).is_ok(),
            accepted
        );
    }

    #[test]
    fn rejects_overlong_timezones() {
        let time = Time::from_hms(8, 0, 0).expect("valid time");
        let label = "A".repeat(MAX_TIMEZONE_BYTES + 1);
        assert!(ClockSetting::new(time, label, ClockFormat::TwelveHour).is_err());
    }

    #[rstest]
    #[case("Asia/Kolkata", true)]
    #[case("Pacific Time", false)]
    fn validates_zone_clock_timezones(#[case] timezone: &str, #[case] accepted: bool) {
        let command = DeviceCommand::SetZoneClock {
            clock: ZoneClock::Tertiary,
            timezone: timezone.to_owned(),
            format: ClockFormat::TwentyFourHour,
        };
        assert_eq!(command.validate().is_ok(), accepted);
    }

    #[rstest]
    #[case(0, "HELLO", true)]
    #[case(2, "exactly16chars!!", true)]
    #[case(3, "HELLO", false)]
    #[case(0, "seventeen chars!!", false)]
    #[case(1, "tab\there", false)]
    #[case(1, "caf\u{e9}", false)]
    fn validates_mfd_lines(#[case] line: usize, #[case] text: &str, #[case] accepted: bool) {
        let command = DeviceCommand::SetMfdText {
            line,
            text: text.to_owned(),
        };
        assert_eq!(command.validate().is_ok(), accepted);
    }

    #[rstest]
    #[case(LedId::Fire, LedState::On, true)]
    #[case(LedId::Fire, LedState::Red, false)]
    #[case(LedId::Pov, LedState::Amber, true)]
    #[case(LedId::Pov, LedState::On, false)]
    fn validates_led_states(#[case] led: LedId, #[case] state: LedState, #[case] accepted: bool) {
        assert_eq!(DeviceCommand::SetLed { led, state }.validate().is_ok(), accepted);
    }

    #[rstest]
    #[case(MAX_BRIGHTNESS, true)]
    #[case(MAX_BRIGHTNESS + 1, false)]
    fn validates_brightness(#[case] level: u16, #[case] accepted: bool) {
        let command = DeviceCommand::SetBrightness {
            target: BrightnessTarget::Mfd,
            level,
        };
        assert_eq!(command.validate().is_ok(), accepted);
    }
}
