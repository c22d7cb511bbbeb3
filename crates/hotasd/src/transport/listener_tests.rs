//! Tests for the socket listener.

use std::net::TcpStream;
use std::sync::Arc;

use rstest::{fixture, rstest};

use hotas_config::SocketEndpoint;

use super::{ConnectionHandler, ListenerError, Peer, PeerRecorder, SocketListener};

#[fixture]
fn recorder() -> Arc<PeerRecorder> {
    PeerRecorder::new()
}

#[rstest]
fn tcp_listener_hands_each_client_to_the_handler(recorder: Arc<PeerRecorder>) {
    let listener =
        SocketListener::bind(&SocketEndpoint::tcp("127.0.0.1", 0)).expect("bind tcp listener");
    let addr = listener
        .local_addr()
        .expect("listener should report local address");
    let handler: Arc<dyn ConnectionHandler> = recorder.clone();
    let handle = listener.start(handler).expect("start listener");

    let first = TcpStream::connect(addr).expect("connect first client");
    let second = TcpStream::connect(addr).expect("connect second client");

    let peers = recorder.wait_for(2);
    assert_eq!(peers.len(), 2, "expected two connections");
    for peer in peers {
        let Peer::Tcp(Some(remote)) = peer else {
            panic!("expected a tcp peer, got {peer:?}");
        };
        assert!(remote.ip().is_loopback());
    }
    drop((first, second));
    handle.shutdown();
    handle.join().expect("join listener");
}

#[rstest]
fn tcp_listener_refuses_names_without_loopback_addresses() {
    let error = SocketListener::bind(&SocketEndpoint::tcp("192.0.2.10", 0))
        .expect_err("documentation address is not loopback");
    assert!(matches!(
        error,
        ListenerError::NoLoopback { .. } | ListenerError::Resolve { .. }
    ));
}

#[cfg(unix)]
#[fixture]
fn unix_tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("temp dir")
}

#[cfg(unix)]
fn unix_endpoint(path: &std::path::Path) -> SocketEndpoint {
    SocketEndpoint::unix(path.to_str().expect("utf8 path").to_owned())
}

#[cfg(unix)]
#[rstest]
fn unix_listener_replaces_stale_socket_and_removes_it_on_stop(
    unix_tempdir: tempfile::TempDir,
    recorder: Arc<PeerRecorder>,
) {
    let path = unix_tempdir.path().join("hotasd.sock");
    {
        let _stale = std::os::unix::net::UnixListener::bind(&path).expect("bind stale listener");
    }
    assert!(path.exists(), "stale socket should remain");

    let listener = SocketListener::bind(&unix_endpoint(&path)).expect("bind new listener");
    let handler: Arc<dyn ConnectionHandler> = recorder.clone();
    let handle = listener.start(handler).expect("start listener");

    let _client = std::os::unix::net::UnixStream::connect(&path).expect("connect unix client");
    let peers = recorder.wait_for(1);
    assert_eq!(peers.len(), 1);
    assert!(matches!(peers[0], Peer::Unix { .. }));
    #[cfg(target_os = "linux")]
    assert_eq!(
        peers[0],
        Peer::Unix {
            uid: Some(nix::unistd::geteuid().as_raw())
        }
    );

    handle.shutdown();
    handle.join().expect("join listener");
    assert!(!path.exists(), "listener should remove unix socket on stop");
}

#[cfg(unix)]
#[rstest]
fn unix_listener_rejects_socket_in_use(unix_tempdir: tempfile::TempDir) {
    let path = unix_tempdir.path().join("hotasd.sock");
    let _existing = std::os::unix::net::UnixListener::bind(&path).expect("bind existing listener");

    let error = SocketListener::bind(&unix_endpoint(&path)).expect_err("should fail bind");
    assert!(matches!(error, ListenerError::UnixInUse { .. }));
}

#[cfg(unix)]
#[rstest]
fn unix_listener_refuses_to_replace_regular_files(unix_tempdir: tempfile::TempDir) {
    let path = unix_tempdir.path().join("hotasd.sock");
    std::fs::write(&path, b"not a socket").expect("write placeholder");

    let error = SocketListener::bind(&unix_endpoint(&path)).expect_err("should fail bind");
    assert!(matches!(error, ListenerError::UnixNotSocket { .. }));
    assert!(path.exists(), "regular files are left alone");
}
