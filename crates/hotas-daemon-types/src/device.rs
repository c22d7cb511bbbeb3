use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

/// Number of text lines on the multi-function display.
pub const MFD_LINES: usize = 3;

/// Characters per MFD line.
pub const MFD_LINE_WIDTH: usize = 16;

/// Highest brightness level accepted by the device.
pub const MAX_BRIGHTNESS: u16 = 128;

/// Addressable LEDs, numbered 1 to 11 on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LedId {
    /// Fire button; on/off only.
    Fire,
    /// A button.
    A,
    /// B button.
    B,
    /// D button.
    D,
    /// E button.
    E,
    /// First toggle pair.
    T1,
    /// Second toggle pair.
    T2,
    /// Third toggle pair.
    T3,
    /// Point-of-view hat.
    Pov,
    /// Clutch button.
    Clutch,
    /// Throttle backlight; on/off only.
    Throttle,
}

/// Error returned when an LED selector names no known LED.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown LED '{0}'")]
pub struct UnknownLed(pub String);

impl LedId {
    /// Wire ordinal, 1-based.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Fire => 1,
            Self::A => 2,
            Self::B => 3,
            Self::D => 4,
            Self::E => 5,
            Self::T1 => 6,
            Self::T2 => 7,
            Self::T3 => 8,
            Self::Pov => 9,
            Self::Clutch => 10,
            Self::Throttle => 11,
        }
    }

    /// Looks up an LED by its wire ordinal.
    #[must_use]
    pub fn from_ordinal(ordinal: u64) -> Option<Self> {
        Self::iter().find(|led| u64::from(led.ordinal()) == ordinal)
    }

    /// Parses an LED selector given either as a name or an ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownLed`] when the selector matches no LED.
    pub fn parse_selector(selector: &str) -> Result<Self, UnknownLed> {
        let trimmed = selector.trim();
        if let Ok(ordinal) = trimmed.parse::<u64>() {
            return Self::from_ordinal(ordinal).ok_or_else(|| UnknownLed(trimmed.to_owned()));
        }
        Self::from_str(trimmed).map_err(|_| UnknownLed(trimmed.to_owned()))
    }

    /// States this LED can display.
    #[must_use]
    pub const fn supported_states(self) -> &'static [LedState] {
        match self {
            Self::Fire | Self::Throttle => &[LedState::Off, LedState::On],
            _ => &[
                LedState::Off,
                LedState::Red,
                LedState::Amber,
                LedState::Green,
            ],
        }
    }

    /// Renders the supported states as `off|on` for error messages.
    #[must_use]
    pub fn describe_states(self) -> String {
        self.supported_states()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Reports whether the LED can display `state`.
    #[must_use]
    pub fn supports(self, state: LedState) -> bool {
        self.supported_states().contains(&state)
    }
}

/// Display state of one LED.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LedState {
    /// Unlit.
    Off,
    /// Lit, for single-colour LEDs.
    On,
    /// Red, for bi-colour LEDs.
    Red,
    /// Amber, for bi-colour LEDs.
    Amber,
    /// Green, for bi-colour LEDs.
    Green,
}

/// Hour display format of the device clock.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ClockFormat {
    /// 12-hour display with AM/PM.
    #[default]
    #[serde(rename = "12hr")]
    #[strum(serialize = "12hr")]
    TwelveHour,
    /// 24-hour display.
    #[serde(rename = "24hr")]
    #[strum(serialize = "24hr")]
    TwentyFourHour,
}

/// Order of day, month and year on the device date display.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DateFormat {
    /// `DD-MM-YY`.
    #[default]
    Ddmmyy,
    /// `MM-DD-YY`.
    Mmddyy,
    /// `YY-MM-DD`.
    Yymmdd,
}

/// Brightness channels of the device.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BrightnessTarget {
    /// Multi-function display backlight.
    Mfd,
    /// Button LEDs.
    Led,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", LedId::Fire)]
    #[case("11", LedId::Throttle)]
    #[case("pov", LedId::Pov)]
    #[case(" T2 ", LedId::T2)]
    fn parses_led_selectors(#[case] selector: &str, #[case] expected: LedId) {
        assert_eq!(LedId::parse_selector(selector), Ok(expected));
    }

    #[rstest]
    #[case("0")]
    #[case("12")]
    #[case("c")]
    fn rejects_unknown_led_selectors(#[case] selector: &str) {
        assert!(LedId::parse_selector(selector).is_err());
    }

    #[test]
    fn ordinals_cover_one_to_eleven() {
        let ordinals: Vec<u8> = LedId::iter().map(LedId::ordinal).collect();
        assert_eq!(ordinals, (1..=11).collect::<Vec<u8>>());
    }

    #[rstest]
    #[case(LedId::Fire, LedState::On, true)]
    #[case(LedId::Fire, LedState::Red, false)]
    #[case(LedId::A, LedState::Amber, true)]
    #[case(LedId::A, LedState::On, false)]
    fn led_state_support(#[case] led: LedId, #[case] state: LedState, #[case] expected: bool) {
        assert_eq!(led.supports(state), expected);
    }

    #[test]
    fn clock_format_round_trips_wire_names() {
        assert_eq!("24HR".parse::<ClockFormat>(), Ok(ClockFormat::TwentyFourHour));
        assert_eq!(ClockFormat::TwelveHour.to_string(), "12hr");
        assert_eq!(
            serde_json::to_string(&ClockFormat::TwentyFourHour).expect("encode"),
            "\"24hr\""
        );
    }

    #[test]
    fn date_formats_use_lowercase_names() {
        assert_eq!("DDMMYY".parse::<DateFormat>(), Ok(DateFormat::Ddmmyy));
        assert_eq!(DateFormat::Yymmdd.to_string(), "yymmdd");
        assert_eq!(
            serde_json::to_string(&DateFormat::Mmddyy).expect("encode"),
            "\"mmddyy\""
        );
    }

    #[test]
    fn state_list_formats_with_pipes() {
        assert_eq!(LedId::Fire.describe_states(), "off|on");
        assert_eq!(LedId::Clutch.describe_states(), "off|red|amber|green");
    }
}
