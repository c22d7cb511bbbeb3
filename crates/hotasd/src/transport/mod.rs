//! Socket transport: the accept loop and per-client protocol sessions.
//!
//! The listener binds the configured endpoint and hands every accepted
//! stream to a [`ConnectionHandler`] on its own thread. [`SessionHandler`]
//! is the production handler and speaks the line protocol.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod listener_tests;
mod session;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream, Peer};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub(crate) use self::session::{PrivilegePolicy, SessionHandler};
#[cfg(test)]
pub(crate) use self::test_utils::PeerRecorder;

pub(crate) const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
