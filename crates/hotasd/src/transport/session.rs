//! Protocol Session Handler: one thread per client connection.
//!
//! A session walks `Connecting -> Ready -> Executing -> Ready ... -> Closed`.
//! The banner frame ends `Connecting`; each request moves it to `Executing`
//! until its response is written. Framing errors get a best-effort
//! `invalid_command` response and close the session; command errors never
//! do.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use hotas_config::Config;
use hotas_daemon_types::{
    Banner, ErrorCode, FrameError, FrameReader, Request, Response, decode_frame, write_frame,
};

use crate::daemon::{SessionRegistry, SessionTicket};
use crate::dispatch::{Dispatcher, Privilege};

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, Peer};

/// Decides the privilege tier of a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PrivilegePolicy {
    owner_only_writes: bool,
    owner: u32,
}

impl PrivilegePolicy {
    pub(crate) const fn new(owner_only_writes: bool, owner: u32) -> Self {
        Self {
            owner_only_writes,
            owner,
        }
    }

    /// Policy for this process: the owner is the effective uid.
    pub(crate) fn from_config(config: &Config) -> Self {
        Self::new(config.owner_only_writes(), effective_uid())
    }

    pub(crate) fn classify(&self, peer: &Peer) -> Privilege {
        if !self.owner_only_writes {
            return Privilege::Control;
        }
        match peer {
            Peer::Unix { uid: Some(uid) } if *uid == self.owner || *uid == 0 => Privilege::Control,
            Peer::Unix { .. } | Peer::Tcp(_) => Privilege::ReadOnly,
        }
    }
}

#[cfg(unix)]
fn effective_uid() -> u32 {
    nix::unistd::geteuid().as_raw()
}

#[cfg(not(unix))]
fn effective_uid() -> u32 {
    0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Connecting,
    Ready,
    Executing,
    Closed,
}

/// Serves the protocol on accepted connections.
#[derive(Debug)]
pub(crate) struct SessionHandler {
    dispatcher: Dispatcher,
    registry: SessionRegistry,
    policy: PrivilegePolicy,
    idle_timeout: Option<Duration>,
    banner: Banner,
}

impl SessionHandler {
    pub(crate) fn new(
        dispatcher: Dispatcher,
        registry: SessionRegistry,
        policy: PrivilegePolicy,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            dispatcher,
            registry,
            policy,
            idle_timeout,
            banner: Banner::new(env!("CARGO_PKG_VERSION")),
        }
    }

    pub(crate) fn into_handler(self) -> Arc<dyn ConnectionHandler> {
        Arc::new(self)
    }
}

impl ConnectionHandler for SessionHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        let peer = stream.peer();
        let privilege = self.policy.classify(&peer);
        let Some(ticket) = self.registry.register(privilege) else {
            warn!(
                target: LISTENER_TARGET,
                ?peer,
                capacity = self.registry.capacity(),
                "session limit reached; rejecting client"
            );
            let response = Response::error(ErrorCode::Internal, "too many clients");
            if let Err(error) = write_frame(&mut stream, &response) {
                debug!(target: LISTENER_TARGET, %error, "rejection not delivered");
            }
            return;
        };
        let mut session = Session {
            ticket,
            state: SessionState::Connecting,
        };
        info!(
            target: LISTENER_TARGET,
            session = session.ticket.id(),
            ?peer,
            privilege = %privilege,
            "session opened"
        );
        if let Err(error) = self.serve(&mut session, stream) {
            debug!(
                target: LISTENER_TARGET,
                session = session.ticket.id(),
                %error,
                "session ended by stream error"
            );
        }
        session.transition(SessionState::Closed);
    }
}

impl SessionHandler {
    fn serve(&self, session: &mut Session, stream: ConnectionStream) -> Result<(), FrameError> {
        stream.set_read_timeout(self.idle_timeout)?;
        let mut writer = stream.try_clone()?;
        let mut reader = FrameReader::new(stream);

        write_frame(&mut writer, &self.banner)?;
        session.transition(SessionState::Ready);

        loop {
            let frame = match reader.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(()),
                Err(error) if error.is_timeout() => {
                    info!(
                        target: LISTENER_TARGET,
                        session = session.ticket.id(),
                        "idle session closed"
                    );
                    return Ok(());
                }
                Err(FrameError::Io(error)) => return Err(FrameError::Io(error)),
                Err(error) => return reject_frame(&mut writer, session, &error),
            };
            let request = match decode_frame::<Request>(&frame) {
                Ok(request) => request,
                Err(error) => return reject_frame(&mut writer, session, &error),
            };

            session.transition(SessionState::Executing);
            let response = self.dispatcher.dispatch(&request, session.ticket.privilege());
            // A client that vanished mid-command still lets the command finish;
            // only the write fails.
            write_frame(&mut writer, &response)?;
            session.transition(SessionState::Ready);
        }
    }
}

fn reject_frame(
    writer: &mut ConnectionStream,
    session: &Session,
    error: &FrameError,
) -> Result<(), FrameError> {
    warn!(
        target: LISTENER_TARGET,
        session = session.ticket.id(),
        %error,
        "framing error; closing session"
    );
    let response = Response::error(ErrorCode::InvalidCommand, error.to_string());
    let delivered = write_frame(writer, &response);
    if let Err(error) = writer.shutdown() {
        debug!(target: LISTENER_TARGET, %error, "socket shutdown failed");
    }
    delivered
}

#[derive(Debug)]
struct Session {
    ticket: SessionTicket,
    state: SessionState,
}

impl Session {
    fn transition(&mut self, next: SessionState) {
        debug!(
            target: LISTENER_TARGET,
            session = self.ticket.id(),
            from = ?self.state,
            to = ?next,
            "session state"
        );
        self.state = next;
    }
}
