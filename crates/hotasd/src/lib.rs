//! Control daemon for the Saitek X52 Pro HOTAS.
//!
//! `hotasd` owns the USB-facing device driver and the device configuration
//! file, and serves a newline-delimited JSON protocol on a Unix or loopback
//! TCP socket. Client tools send commands (query or change configuration,
//! set the clock, write MFD text, drive LEDs); the daemon validates them,
//! applies them to the configuration and the device, and answers with a
//! result or a stable error code.
//!
//! Session threads and the [`DaemonCore`] event loop share one
//! [`StateGate`]: queries take the shared lock, mutations and external
//! triggers (signals, device hot-plug) take the exclusive lock, so no
//! client ever observes a half-applied change.
//!
//! The device remembers everything it was successfully told. When it is
//! unplugged, commands fail with `device_unavailable`; when it comes back,
//! the recorded state is replayed before anything else runs.

pub mod config_store;
pub mod daemon;
pub mod device;
pub mod dispatch;

mod bootstrap;
mod health;
mod process;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use daemon::{DaemonCore, DaemonEvent, DaemonState, EventSender, StateGate};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::daemonizer::DaemonizeError;
pub use process::signals::SignalError;
pub use process::{LaunchError, LaunchMode, run_daemon};
pub use telemetry::{LogControl, TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
