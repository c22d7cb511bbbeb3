//! Test helpers for the transport module.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::{ConnectionHandler, ConnectionStream, Peer};

/// Records the peer of every accepted connection and drops the stream.
#[derive(Default)]
pub(crate) struct PeerRecorder {
    peers: Mutex<Vec<Peer>>,
}

impl PeerRecorder {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn peers(&self) -> Vec<Peer> {
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Polls until `expected` connections arrived or two seconds pass.
    pub(crate) fn wait_for(&self, expected: usize) -> Vec<Peer> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let peers = self.peers();
            if peers.len() >= expected || Instant::now() >= deadline {
                return peers;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl ConnectionHandler for PeerRecorder {
    fn handle(&self, stream: ConnectionStream) {
        let peer = stream.peer();
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(peer);
    }
}
