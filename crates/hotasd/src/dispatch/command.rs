//! Typed commands decoded from wire requests.

use std::str::FromStr;

use camino::Utf8PathBuf;
use serde_json::Value;
use strum::Display;
use time::Time;

use hotas_daemon_types::{ClockFormat, LedId, LedState, Request, commands};

use crate::device::ClockSetting;

use super::errors::DispatchError;

/// Privilege tier of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Privilege {
    /// May run queries only.
    #[strum(serialize = "read")]
    ReadOnly,
    /// May run every command.
    #[strum(serialize = "control")]
    Control,
}

impl Privilege {
    /// Whether a session at this tier may run a command needing `required`.
    #[must_use]
    pub const fn allows(self, required: Self) -> bool {
        matches!((self, required), (Self::Control, _) | (_, Self::ReadOnly))
    }
}

/// Lock a command takes on the daemon state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Touches no shared state.
    Lockless,
    /// Reads shared state alongside other readers.
    Shared,
    /// Mutates shared state alone.
    Exclusive,
}

/// Arguments of `set-clock` before defaults are filled in from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockRequest {
    pub time: Time,
    pub timezone: Option<String>,
    pub format: Option<ClockFormat>,
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping,
    GetConfig { key: String },
    SetConfig { key: String, value: Value },
    LoadConfig { path: Option<Utf8PathBuf> },
    SaveConfig { path: Option<Utf8PathBuf> },
    ReloadConfig,
    ApplyConfig,
    GetLogLevel,
    SetLogLevel { level: String },
    SetClock(ClockRequest),
    SetMfd { line: usize, text: String },
    SetLed { led: LedId, state: LedState },
}

impl Command {
    /// Decodes a request, matching the command name case-insensitively.
    ///
    /// # Errors
    ///
    /// Unknown names and missing or ill-typed arguments are
    /// [`DispatchError::InvalidCommand`]; well-typed arguments naming values
    /// the device does not have are [`DispatchError::InvalidArgument`].
    pub fn decode(request: &Request) -> Result<Self, DispatchError> {
        let name = request.command.trim().to_ascii_lowercase();
        let args = Arguments {
            request,
            command: &name,
        };
        let command = match name.as_str() {
            commands::PING => Self::Ping,
            commands::GET_CONFIG => Self::GetConfig {
                key: args.string("key")?.to_owned(),
            },
            commands::SET_CONFIG => Self::SetConfig {
                key: args.string("key")?.to_owned(),
                value: args.required("value")?.clone(),
            },
            commands::LOAD_CONFIG => Self::LoadConfig {
                path: args.path("path")?,
            },
            commands::SAVE_CONFIG => Self::SaveConfig {
                path: args.path("path")?,
            },
            commands::RELOAD_CONFIG => Self::ReloadConfig,
            commands::APPLY_CONFIG => Self::ApplyConfig,
            commands::GET_LOG_LEVEL => Self::GetLogLevel,
            commands::SET_LOG_LEVEL => Self::SetLogLevel {
                level: args.string("level")?.to_owned(),
            },
            commands::SET_CLOCK => Self::SetClock(ClockRequest {
                time: ClockSetting::parse_time(args.string("time")?)?,
                timezone: args.optional_string("tz")?.map(str::to_owned),
                format: args.optional_string("format")?.map(parse_format).transpose()?,
            }),
            commands::SET_MFD => Self::SetMfd {
                line: args.index("line")?,
                text: args.string("text")?.to_owned(),
            },
            commands::SET_LED => Self::SetLed {
                led: args.led("id")?,
                state: parse_state(args.string("state")?)?,
            },
            _ => {
                return Err(DispatchError::invalid_command(format!(
                    "unknown command '{}'",
                    request.command.trim()
                )));
            }
        };
        Ok(command)
    }

    /// Canonical command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ping => commands::PING,
            Self::GetConfig { .. } => commands::GET_CONFIG,
            Self::SetConfig { .. } => commands::SET_CONFIG,
            Self::LoadConfig { .. } => commands::LOAD_CONFIG,
            Self::SaveConfig { .. } => commands::SAVE_CONFIG,
            Self::ReloadConfig => commands::RELOAD_CONFIG,
            Self::ApplyConfig => commands::APPLY_CONFIG,
            Self::GetLogLevel => commands::GET_LOG_LEVEL,
            Self::SetLogLevel { .. } => commands::SET_LOG_LEVEL,
            Self::SetClock(_) => commands::SET_CLOCK,
            Self::SetMfd { .. } => commands::SET_MFD,
            Self::SetLed { .. } => commands::SET_LED,
        }
    }

    /// Tier a session needs to run this command.
    #[must_use]
    pub const fn privilege(&self) -> Privilege {
        match self.access() {
            Access::Lockless | Access::Shared => Privilege::ReadOnly,
            Access::Exclusive => Privilege::Control,
        }
    }

    /// Lock the command takes while it runs.
    #[must_use]
    pub const fn access(&self) -> Access {
        match self {
            Self::Ping => Access::Lockless,
            Self::GetConfig { .. } | Self::GetLogLevel => Access::Shared,
            _ => Access::Exclusive,
        }
    }
}

struct Arguments<'a> {
    request: &'a Request,
    command: &'a str,
}

impl<'a> Arguments<'a> {
    fn optional(&self, name: &str) -> Option<&'a Value> {
        self.request.argument(name).filter(|value| !value.is_null())
    }

    fn required(&self, name: &str) -> Result<&'a Value, DispatchError> {
        self.optional(name).ok_or_else(|| {
            DispatchError::invalid_command(format!(
                "'{}' requires argument '{name}'",
                self.command
            ))
        })
    }

    fn string(&self, name: &str) -> Result<&'a str, DispatchError> {
        self.required(name)?
            .as_str()
            .ok_or_else(|| mistyped(name, "a string"))
    }

    fn optional_string(&self, name: &str) -> Result<Option<&'a str>, DispatchError> {
        self.optional(name)
            .map(|value| value.as_str().ok_or_else(|| mistyped(name, "a string")))
            .transpose()
    }

    fn path(&self, name: &str) -> Result<Option<Utf8PathBuf>, DispatchError> {
        match self.optional_string(name)?.map(str::trim) {
            None => Ok(None),
            Some("") => Err(DispatchError::invalid_argument(format!(
                "argument '{name}' must not be empty"
            ))),
            Some(path) => Ok(Some(Utf8PathBuf::from(path))),
        }
    }

    fn index(&self, name: &str) -> Result<usize, DispatchError> {
        let number = match self.required(name)? {
            Value::Number(number) => number.as_i64().ok_or_else(|| mistyped(name, "an integer")),
            Value::String(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| mistyped(name, "an integer")),
            _ => Err(mistyped(name, "an integer")),
        }?;
        usize::try_from(number).map_err(|_| {
            DispatchError::invalid_argument(format!("{name} {number} is out of range"))
        })
    }

    fn led(&self, name: &str) -> Result<LedId, DispatchError> {
        let unknown = |selector: &dyn std::fmt::Display| {
            DispatchError::invalid_argument(format!("unknown LED '{selector}'"))
        };
        match self.required(name)? {
            Value::Number(number) => number
                .as_u64()
                .and_then(LedId::from_ordinal)
                .ok_or_else(|| unknown(number)),
            Value::String(text) => {
                LedId::parse_selector(text).map_err(|error| unknown(&error.0))
            }
            _ => Err(mistyped(name, "an LED number or name")),
        }
    }
}

fn mistyped(name: &str, expected: &str) -> DispatchError {
    DispatchError::invalid_command(format!("argument '{name}' must be {expected}"))
}

fn parse_state(text: &str) -> Result<LedState, DispatchError> {
    LedState::from_str(text.trim())
        .map_err(|_| DispatchError::invalid_argument(format!("unknown LED state '{text}'")))
}

fn parse_format(text: &str) -> Result<ClockFormat, DispatchError> {
    ClockFormat::from_str(text.trim()).map_err(|_| {
        DispatchError::invalid_argument(format!("clock format '{text}' is not 12hr or 24hr"))
    })
}
