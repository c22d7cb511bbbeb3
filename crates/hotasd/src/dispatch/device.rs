//! Device commands.

use std::str::FromStr;

use serde_json::{Value, json};

use hotas_daemon_types::{ClockFormat, LedId, LedState};

use crate::daemon::DaemonState;
use crate::device::{ClockSetting, DeviceCommand, DeviceError};

use super::command::ClockRequest;
use super::errors::DispatchError;

const LOCAL_TIMEZONE: &str = "local";
const UTC_TIMEZONE: &str = "UTC";

pub(super) fn set_clock(
    state: &mut DaemonState,
    request: ClockRequest,
) -> Result<Value, DispatchError> {
    let timezone = match request.timezone {
        Some(timezone) => timezone,
        None => default_timezone(state)?.to_owned(),
    };
    let format = match request.format {
        Some(format) => format,
        None => default_format(state)?,
    };
    let setting = ClockSetting::new(request.time, timezone, format)?;
    let result = json!({
        "time": setting.time_label(),
        "tz": setting.timezone(),
        "format": setting.format(),
    });
    apply(state, DeviceCommand::SetClock(setting))?;
    Ok(result)
}

pub(super) fn set_mfd(
    state: &mut DaemonState,
    line: usize,
    text: String,
) -> Result<Value, DispatchError> {
    let result = json!({ "line": line, "text": &text });
    apply(state, DeviceCommand::SetMfdText { line, text })?;
    Ok(result)
}

pub(super) fn set_led(
    state: &mut DaemonState,
    led: LedId,
    led_state: LedState,
) -> Result<Value, DispatchError> {
    apply(
        state,
        DeviceCommand::SetLed {
            led,
            state: led_state,
        },
    )?;
    Ok(json!({ "id": led.ordinal(), "state": led_state }))
}

/// Applies `command`, republishing `device.*` when the write found the
/// device gone.
fn apply(state: &mut DaemonState, command: DeviceCommand) -> Result<(), DispatchError> {
    let outcome = state.device.apply(command);
    if matches!(outcome, Err(DeviceError::Unavailable(_))) && !state.device.is_connected() {
        state.publish_device();
    }
    Ok(outcome?)
}

fn default_timezone(state: &DaemonState) -> Result<&'static str, DispatchError> {
    let local = state
        .config
        .get("clock.primary_is_local")?
        .as_bool()
        .ok_or_else(|| DispatchError::internal("clock.primary_is_local is not a boolean"))?;
    Ok(if local { LOCAL_TIMEZONE } else { UTC_TIMEZONE })
}

fn default_format(state: &DaemonState) -> Result<ClockFormat, DispatchError> {
    state
        .config
        .get("clock.format")?
        .as_str()
        .and_then(|text| ClockFormat::from_str(text).ok())
        .ok_or_else(|| DispatchError::internal("clock.format holds an unknown format"))
}
