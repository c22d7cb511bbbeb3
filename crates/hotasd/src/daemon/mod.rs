//! Daemon Core: the event loop that serialises external triggers against
//! client commands.
//!
//! Session threads and the core share one [`StateGate`]. Signal-driven
//! reloads and saves, and device connect and disconnect notifications, arrive
//! through the bounded event queue and each runs under the exclusive lock,
//! so they queue behind any command already executing. A successful reload
//! pushes the new values to the device before the lock is released.

mod events;
mod sessions;
mod state;

use std::io;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use tracing::{debug, error, info};

use crate::device::DeviceEvent;
use crate::health::HealthReporter;

pub use self::events::{DaemonEvent, EVENT_QUEUE_CAPACITY, EventSender, event_queue};
pub use self::sessions::{SessionRegistry, SessionTicket};
pub use self::state::{DaemonState, StateGate};

pub(crate) const CORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::core");

/// Consumes [`DaemonEvent`]s until shutdown.
pub struct DaemonCore {
    gate: StateGate,
    events: Receiver<DaemonEvent>,
    reporter: Arc<dyn HealthReporter>,
}

impl DaemonCore {
    /// Builds a core over the shared state and the receiving end of the
    /// event queue.
    #[must_use]
    pub fn new(
        gate: StateGate,
        events: Receiver<DaemonEvent>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            gate,
            events,
            reporter,
        }
    }

    /// Runs the loop on a dedicated thread.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("hotasd-core".to_owned())
            .spawn(move || self.run())
    }

    /// Handles events until [`DaemonEvent::Shutdown`] arrives or every
    /// sender is gone.
    pub fn run(&self) {
        for event in &self.events {
            if self.handle(event).is_break() {
                break;
            }
        }
        info!(target: CORE_TARGET, "daemon core stopped");
    }

    /// Handles a single event.
    pub fn handle(&self, event: DaemonEvent) -> ControlFlow<()> {
        debug!(target: CORE_TARGET, ?event, "handling daemon event");
        match event {
            DaemonEvent::Device(DeviceEvent::Connected) => self.device_connected(),
            DaemonEvent::Device(DeviceEvent::Disconnected) => self.device_disconnected(),
            DaemonEvent::Reload => self.reload(),
            DaemonEvent::Save => self.save(),
            DaemonEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn device_connected(&self) {
        match self.gate.write(|state| Ok(state.device_connected())) {
            Ok(Ok((info, report))) => self.reporter.device_connected(&info, report),
            Ok(Err(failure)) => self.reporter.device_missing(&failure),
            Err(failure) => error!(target: CORE_TARGET, error = %failure, "reconnect aborted"),
        }
    }

    fn device_disconnected(&self) {
        match self.gate.write(|state| {
            state.device_disconnected();
            Ok(())
        }) {
            Ok(()) => self.reporter.device_disconnected(),
            Err(failure) => {
                error!(target: CORE_TARGET, error = %failure, "disconnect not recorded");
            }
        }
    }

    fn reload(&self) {
        let outcome = self.gate.write(|state| {
            Ok(state.config.reload().map(|keys| {
                if let Some(report) = state.apply_loaded() {
                    info!(
                        target: CORE_TARGET,
                        applied = report.applied,
                        failed = report.failed,
                        "reloaded configuration applied to device"
                    );
                }
                (state.config.path().to_path_buf(), keys)
            }))
        });
        match outcome {
            Ok(Ok((path, keys))) => self.reporter.config_reloaded(&path, keys),
            Ok(Err(failure)) => self.reporter.config_reload_failed(&failure),
            Err(failure) => error!(target: CORE_TARGET, error = %failure, "reload aborted"),
        }
    }

    fn save(&self) {
        match self.gate.write(|state| Ok(state.config.save(None))) {
            Ok(Ok(path)) => self.reporter.config_saved(&path),
            Ok(Err(failure)) => self.reporter.config_save_failed(&failure),
            Err(failure) => error!(target: CORE_TARGET, error = %failure, "save aborted"),
        }
    }
}

#[cfg(test)]
mod tests;
