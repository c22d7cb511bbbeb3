//! Command dispatch: decoding, privilege checks and locking.
//!
//! A [`Dispatcher`] decodes each [`hotas_daemon_types::Request`] into a
//! [`Command`], checks the session's [`Privilege`], then runs the handler
//! under the lock the command declares: `ping` takes none, queries share the
//! read lock, and everything that mutates configuration or the device takes
//! the write lock.

mod command;
mod config;
mod device;
mod errors;
mod router;

pub use self::command::{Access, ClockRequest, Command, Privilege};
pub use self::errors::DispatchError;
pub use self::router::Dispatcher;
