//! Routes decoded commands to their handlers under the right lock.

use serde_json::{Value, json};
use tracing::{debug, error};

use hotas_daemon_types::{PROTOCOL_VERSION, Request, Response};

use crate::daemon::StateGate;

use super::command::{Command, Privilege};
use super::errors::DispatchError;
use super::{config, device};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Turns requests into responses against the shared daemon state.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    gate: StateGate,
}

impl Dispatcher {
    /// Creates a dispatcher over the shared state.
    #[must_use]
    pub const fn new(gate: StateGate) -> Self {
        Self { gate }
    }

    /// Executes one request for a session holding `privilege`.
    ///
    /// Every failure becomes an error response; nothing here closes the
    /// session.
    pub fn dispatch(&self, request: &Request, privilege: Privilege) -> Response {
        match self.execute(request, privilege) {
            Ok(result) => Response::ok(result),
            Err(failure) => {
                let code = failure.code();
                if matches!(failure, DispatchError::Internal { .. }) {
                    error!(
                        target: DISPATCH_TARGET,
                        command = %request.command,
                        error = %failure,
                        "internal error while dispatching"
                    );
                } else {
                    debug!(
                        target: DISPATCH_TARGET,
                        command = %request.command,
                        %code,
                        error = %failure,
                        "command failed"
                    );
                }
                Response::error(code, failure.to_string())
            }
        }
    }

    fn execute(&self, request: &Request, privilege: Privilege) -> Result<Value, DispatchError> {
        let command = Command::decode(request)?;
        let required = command.privilege();
        if !privilege.allows(required) {
            return Err(DispatchError::PermissionDenied {
                command: command.name(),
                required,
            });
        }
        debug!(
            target: DISPATCH_TARGET,
            command = command.name(),
            access = ?command.access(),
            "dispatching command"
        );

        match command {
            Command::Ping => Ok(json!({ "pong": true, "protocol": PROTOCOL_VERSION })),
            Command::GetConfig { key } => self.gate.read(|state| config::get(state, &key)),
            Command::GetLogLevel => self.gate.read(|state| Ok(config::log_level(state))),
            Command::SetConfig { key, value } => {
                self.gate.write(|state| config::set(state, &key, &value))
            }
            Command::LoadConfig { path } => self.gate.write(|state| config::load(state, path)),
            Command::SaveConfig { path } => self.gate.write(|state| config::save(state, path)),
            Command::ReloadConfig => self.gate.write(config::reload),
            Command::ApplyConfig => self.gate.write(config::apply),
            Command::SetLogLevel { level } => {
                self.gate.write(|state| config::set_log_level(state, &level))
            }
            Command::SetClock(clock) => self.gate.write(|state| device::set_clock(state, clock)),
            Command::SetMfd { line, text } => {
                self.gate.write(|state| device::set_mfd(state, line, text))
            }
            Command::SetLed { led, state: led_state } => {
                self.gate.write(|state| device::set_led(state, led, led_state))
            }
        }
    }
}
