//! Configuration commands.

use camino::Utf8PathBuf;
use serde_json::{Value, json};

use crate::config_store::RawValue;
use crate::daemon::DaemonState;

use super::errors::DispatchError;

pub(super) fn get(state: &DaemonState, key: &str) -> Result<Value, DispatchError> {
    let value = state.config.get(key)?;
    Ok(json!({ "key": canonical(key), "value": value }))
}

pub(super) fn set(state: &mut DaemonState, key: &str, value: &Value) -> Result<Value, DispatchError> {
    let stored = state.config.set(key, RawValue::from(value))?;
    Ok(json!({ "key": canonical(key), "value": stored }))
}

pub(super) fn load(
    state: &mut DaemonState,
    path: Option<Utf8PathBuf>,
) -> Result<Value, DispatchError> {
    let target = path.unwrap_or_else(|| state.config.path().to_path_buf());
    let keys = state.config.load(&target)?;
    let applied = state.apply_loaded().map(|report| report.applied);
    Ok(json!({ "path": target, "keys": keys, "applied": applied }))
}

pub(super) fn save(
    state: &mut DaemonState,
    path: Option<Utf8PathBuf>,
) -> Result<Value, DispatchError> {
    let written = state.config.save(path.as_deref())?;
    Ok(json!({ "path": written }))
}

pub(super) fn reload(state: &mut DaemonState) -> Result<Value, DispatchError> {
    let keys = state.config.reload()?;
    let applied = state.apply_loaded().map(|report| report.applied);
    Ok(json!({ "path": state.config.path(), "keys": keys, "applied": applied }))
}

pub(super) fn apply(state: &mut DaemonState) -> Result<Value, DispatchError> {
    let report = state.apply_config()?;
    Ok(json!({ "applied": report.applied, "failed": report.failed }))
}

pub(super) fn log_level(state: &DaemonState) -> Value {
    json!({ "level": state.logging.level() })
}

pub(super) fn set_log_level(state: &mut DaemonState, level: &str) -> Result<Value, DispatchError> {
    let applied = state
        .logging
        .set_level(level)
        .map_err(|error| DispatchError::invalid_argument(error.to_string()))?;
    Ok(json!({ "level": applied }))
}

fn canonical(key: &str) -> &str {
    crate::config_store::lookup(key).map_or(key, |spec| spec.key)
}
