//! A full daemon stack on a loopback TCP port: bootstrap, core thread,
//! listener and session handler around a simulated device.

use std::fs;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tempfile::TempDir;

use hotas_config::{Config, SocketEndpoint};
use hotas_daemon_types::client::Client;
use hotas_daemon_types::{FrameReader, Request, Response, commands, decode_frame};

use crate::bootstrap::{StaticConfigLoader, bootstrap_with};
use crate::daemon::{DaemonCore, DaemonEvent, EventSender, SessionRegistry, StateGate, event_queue};
use crate::device::SimulatedDriver;
use crate::dispatch::Dispatcher;
use crate::transport::{ListenerHandle, PrivilegePolicy, SessionHandler, SocketListener};

use super::RecordingHealthReporter;

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Knobs for [`DaemonHarness::start`].
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub seed: &'static str,
    pub owner_only_writes: bool,
    pub max_clients: usize,
    pub idle_timeout_secs: u64,
    pub device_present: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            seed: "",
            // TCP peers only get write access when writes are open.
            owner_only_writes: false,
            max_clients: 8,
            idle_timeout_secs: 0,
            device_present: true,
        }
    }
}

pub struct DaemonHarness {
    _dir: TempDir,
    config_path: Utf8PathBuf,
    driver: SimulatedDriver,
    state: StateGate,
    events: EventSender,
    reporter: Arc<RecordingHealthReporter>,
    endpoint: SocketEndpoint,
    listener: Option<ListenerHandle>,
    core: Option<JoinHandle<()>>,
}

impl DaemonHarness {
    pub fn start(options: HarnessOptions) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let config_path =
            Utf8PathBuf::from_path_buf(dir.path().join("hotasd.toml")).expect("utf8 path");
        if !options.seed.is_empty() {
            fs::write(&config_path, options.seed).expect("seed configuration");
        }
        let config = Config {
            daemon_socket: SocketEndpoint::tcp("127.0.0.1", 0),
            device_config: config_path.clone(),
            open_writes: !options.owner_only_writes,
            max_clients: options.max_clients,
            idle_timeout_secs: options.idle_timeout_secs,
            ..Config::default()
        };

        let (events, queue) = event_queue();
        let driver = if options.device_present {
            SimulatedDriver::default()
        } else {
            SimulatedDriver::absent()
        }
        .with_notifier(events.clone());
        let reporter = Arc::new(RecordingHealthReporter::default());
        let daemon = bootstrap_with(
            &StaticConfigLoader::new(config.clone()),
            reporter.clone(),
            Box::new(driver.clone()),
        )
        .expect("bootstrap");
        let core = DaemonCore::new(daemon.state(), queue, reporter.clone())
            .spawn()
            .expect("spawn core");

        let listener = SocketListener::bind(config.daemon_socket()).expect("bind listener");
        let port = listener.local_addr().expect("tcp address").port();
        let handler = SessionHandler::new(
            Dispatcher::new(daemon.state()),
            SessionRegistry::new(config.max_clients()),
            PrivilegePolicy::from_config(&config),
            config.idle_timeout(),
        );
        let listener = listener
            .start(handler.into_handler())
            .expect("start listener");

        Self {
            _dir: dir,
            config_path,
            driver,
            state: daemon.state(),
            events,
            reporter,
            endpoint: SocketEndpoint::tcp("127.0.0.1", port),
            listener: Some(listener),
            core: Some(core),
        }
    }

    pub fn connect(&self) -> Client {
        let client = Client::connect(&self.endpoint).expect("connect client");
        client
            .set_response_timeout(Some(WAIT_TIMEOUT))
            .expect("response timeout");
        client
    }

    /// Connects without the client library and consumes the banner.
    pub fn connect_raw(&self) -> RawSession {
        let mut session = self.connect_raw_without_banner();
        let banner = session.next_frame().expect("banner frame");
        assert_eq!(banner["daemon"], "hotasd");
        session
    }

    /// Connects without reading anything.
    pub fn connect_raw_without_banner(&self) -> RawSession {
        let SocketEndpoint::Tcp { host, port } = &self.endpoint else {
            panic!("harness listens on tcp");
        };
        let stream = TcpStream::connect((host.as_str(), *port)).expect("connect raw");
        stream
            .set_read_timeout(Some(WAIT_TIMEOUT))
            .expect("read timeout");
        RawSession {
            writer: stream.try_clone().expect("clone stream"),
            reader: FrameReader::new(stream),
        }
    }

    pub fn driver(&self) -> &SimulatedDriver {
        &self.driver
    }

    pub fn state(&self) -> &StateGate {
        &self.state
    }

    pub fn reporter(&self) -> &RecordingHealthReporter {
        &self.reporter
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(&self.config_path, contents).expect("write configuration");
    }

    pub fn send_event(&self, event: DaemonEvent) {
        assert!(self.events.send(event), "daemon core stopped");
    }

    /// Polls `check` until it passes or the wait budget runs out.
    pub fn wait_until(&self, mut check: impl FnMut(&Self) -> bool) -> bool {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            if check(self) {
                return true;
            }
            thread::sleep(POLL_INTERVAL);
        }
        check(self)
    }

    /// Reads a configuration value through a fresh session.
    pub fn read_value(&self, key: &str) -> Value {
        let response = self
            .connect()
            .send(&Request::new(commands::GET_CONFIG).with_argument("key", key))
            .expect("get-config");
        response_value(&response)
    }
}

impl Drop for DaemonHarness {
    fn drop(&mut self) {
        self.events.send(DaemonEvent::Shutdown);
        if let Some(listener) = self.listener.take() {
            listener.shutdown();
            let _ = listener.join();
        }
        if let Some(core) = self.core.take() {
            let _ = core.join();
        }
    }
}

/// A session driven byte by byte, for framing tests.
pub struct RawSession {
    writer: TcpStream,
    reader: FrameReader<TcpStream>,
}

impl RawSession {
    pub fn write(&mut self, bytes: &[u8]) {
        use std::io::Write;
        self.writer.write_all(bytes).expect("write raw bytes");
    }

    /// Next frame as JSON, or `None` once the daemon closed the session.
    pub fn next_frame(&mut self) -> Option<Value> {
        let frame = self.reader.read_frame().ok()??;
        Some(decode_frame(&frame).expect("daemon frames are JSON"))
    }

    pub fn next_response(&mut self) -> Option<Response> {
        self.next_frame()
            .map(|frame| serde_json::from_value(frame).expect("response frame"))
    }

    pub fn is_closed(&mut self) -> bool {
        match self.reader.read_frame() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(error) => !error.is_timeout(),
        }
    }
}

/// The `value` field of a get/set-config result.
pub fn response_value(response: &Response) -> Value {
    response
        .result()
        .and_then(|result| result.get("value"))
        .cloned()
        .unwrap_or_else(|| panic!("expected a value in {response:?}"))
}
