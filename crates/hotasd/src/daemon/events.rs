//! Events delivered to the daemon core from outside the session threads.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::{debug, warn};

use crate::device::DeviceEvent;

use super::CORE_TARGET;

/// Queue depth; driver notifications beyond this are dropped with a warning.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Work items for [`super::DaemonCore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    /// A driver connect or disconnect notification.
    Device(DeviceEvent),
    /// Re-read the configuration file (`SIGHUP`).
    Reload,
    /// Write the configuration file (`SIGUSR1`).
    Save,
    /// Stop the daemon.
    Shutdown,
}

/// Cloneable producer side of the event queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    inner: Sender<DaemonEvent>,
}

impl EventSender {
    /// Queues `event`, waiting for room. Returns `false` once the core has
    /// stopped.
    pub fn send(&self, event: DaemonEvent) -> bool {
        self.inner.send(event).is_ok()
    }

    /// Queues a driver notification without blocking the driver thread.
    pub fn notify_device(&self, event: DeviceEvent) {
        match self.inner.try_send(DaemonEvent::Device(event)) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(target: CORE_TARGET, ?event, "event queue full; notification dropped");
            }
            Err(TrySendError::Disconnected(event)) => {
                debug!(target: CORE_TARGET, ?event, "daemon core stopped; notification dropped");
            }
        }
    }
}

/// Creates the bounded event queue.
#[must_use]
pub fn event_queue() -> (EventSender, Receiver<DaemonEvent>) {
    let (inner, receiver) = bounded(EVENT_QUEUE_CAPACITY);
    (EventSender { inner }, receiver)
}
