//! Forwards POSIX signals into the daemon event queue.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM, SIGUSR1};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{info, warn};

use crate::daemon::{DaemonEvent, EventSender};

use super::PROCESS_TARGET;

/// Errors reported by signal sources.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Source of external triggers for the daemon core.
pub trait SignalSource: Send + Sync {
    /// Forwards events until one of them is [`DaemonEvent::Shutdown`] or the
    /// core stops listening.
    fn forward(&self, events: &EventSender) -> Result<(), SignalError>;
}

/// Maps a delivered signal onto the event it triggers.
pub(crate) fn event_for(signal: i32) -> Option<DaemonEvent> {
    match signal {
        SIGHUP => Some(DaemonEvent::Reload),
        SIGUSR1 => Some(DaemonEvent::Save),
        SIGTERM | SIGINT | SIGQUIT => Some(DaemonEvent::Shutdown),
        _ => None,
    }
}

/// Signal source backed by `signal-hook`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSignals;

impl SignalSource for SystemSignals {
    fn forward(&self, events: &EventSender) -> Result<(), SignalError> {
        let mut signals = Signals::new([SIGHUP, SIGUSR1, SIGTERM, SIGINT, SIGQUIT])
            .map_err(|source| SignalError::Install { source })?;
        for signal in signals.forever() {
            let Some(event) = event_for(signal) else {
                continue;
            };
            info!(target: PROCESS_TARGET, signal, ?event, "signal received");
            let shutdown = event == DaemonEvent::Shutdown;
            if !events.send(event) {
                warn!(target: PROCESS_TARGET, "daemon core stopped before shutdown");
                break;
            }
            if shutdown {
                break;
            }
        }
        Ok(())
    }
}
