//! Blocking client for the daemon socket.
//!
//! Client binaries connect, check the banner, then exchange one request for
//! one response at a time.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use hotas_config::SocketEndpoint;
use thiserror::Error;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};
#[cfg(unix)]
use std::os::unix::net::UnixStream;

use crate::{Banner, FrameError, FrameReader, PROTOCOL_VERSION, Request, Response};
use crate::{decode_frame, write_frame};

/// Time allowed for establishing a connection.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised by [`Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The TCP host could not be resolved.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        /// Endpoint being resolved.
        endpoint: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Connecting to the daemon failed.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// Endpoint being connected to.
        endpoint: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are not available on this platform.
    #[error("unix sockets are unsupported for endpoint {0}")]
    UnsupportedUnix(String),
    /// The daemon speaks a different protocol version.
    #[error("daemon speaks protocol {found}, client expects {expected}")]
    IncompatibleProtocol {
        /// Protocol version this client implements.
        expected: u32,
        /// Protocol version announced by the daemon.
        found: u32,
    },
    /// The daemon closed the connection before answering.
    #[error("daemon closed the connection")]
    Closed,
    /// Framing failed.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Stream to the daemon.
#[derive(Debug)]
pub enum Connection {
    /// Loopback TCP stream.
    Tcp(TcpStream),
    /// Unix domain socket stream.
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    /// Opens a connection to `endpoint`.
    ///
    /// # Errors
    ///
    /// Fails when the endpoint cannot be resolved or connected to within
    /// [`CONNECTION_TIMEOUT`].
    pub fn open(endpoint: &SocketEndpoint) -> Result<Self, ClientError> {
        match endpoint {
            SocketEndpoint::Tcp { host, port } => {
                let address =
                    resolve_tcp_address(host, *port).map_err(|source| ClientError::Resolve {
                        endpoint: endpoint.to_string(),
                        source,
                    })?;
                TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT)
                    .map(Self::Tcp)
                    .map_err(|source| ClientError::Connect {
                        endpoint: endpoint.to_string(),
                        source,
                    })
            }
            SocketEndpoint::Unix { path } => {
                #[cfg(unix)]
                {
                    connect_unix(path.as_str()).map_err(|source| ClientError::Connect {
                        endpoint: endpoint.to_string(),
                        source,
                    })
                }

                #[cfg(not(unix))]
                {
                    let _ = path;
                    Err(ClientError::UnsupportedUnix(endpoint.to_string()))
                }
            }
        }
    }

    fn try_clone(&self) -> io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.set_read_timeout(timeout),
            #[cfg(unix)]
            Self::Unix(stream) => stream.set_read_timeout(timeout),
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// A connected protocol session.
#[derive(Debug)]
pub struct Client {
    reader: FrameReader<Connection>,
    writer: Connection,
    banner: Banner,
}

impl Client {
    /// Connects to the daemon and validates its banner.
    ///
    /// # Errors
    ///
    /// Fails when the connection cannot be established, the banner cannot be
    /// read, or the daemon speaks another protocol version.
    pub fn connect(endpoint: &SocketEndpoint) -> Result<Self, ClientError> {
        Self::from_connection(Connection::open(endpoint)?)
    }

    /// Wraps an established connection and validates the banner.
    ///
    /// # Errors
    ///
    /// See [`Client::connect`].
    pub fn from_connection(connection: Connection) -> Result<Self, ClientError> {
        let writer = connection.try_clone().map_err(FrameError::Io)?;
        let mut reader = FrameReader::new(connection);
        let frame = reader.read_frame()?.ok_or(ClientError::Closed)?;
        let banner: Banner = decode_frame(&frame)?;
        if !banner.is_compatible() {
            return Err(ClientError::IncompatibleProtocol {
                expected: PROTOCOL_VERSION,
                found: banner.protocol,
            });
        }
        Ok(Self {
            reader,
            writer,
            banner,
        })
    }

    /// Banner announced by the daemon.
    #[must_use]
    pub const fn banner(&self) -> &Banner {
        &self.banner
    }

    /// Limits how long [`Client::send`] waits for a response.
    ///
    /// # Errors
    ///
    /// Fails when the socket option cannot be set.
    pub fn set_response_timeout(&self, timeout: Option<Duration>) -> Result<(), ClientError> {
        self.reader
            .get_ref()
            .set_read_timeout(timeout)
            .map_err(|error| ClientError::Frame(FrameError::Io(error)))
    }

    /// Sends one request and waits for its response.
    ///
    /// # Errors
    ///
    /// Fails when the request cannot be written, the daemon hangs up, or the
    /// response cannot be decoded.
    pub fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        write_frame(&mut self.writer, request)?;
        let frame = self.reader.read_frame()?.ok_or(ClientError::Closed)?;
        Ok(decode_frame(&frame)?)
    }
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, CONNECTION_TIMEOUT)?;
    let stream: UnixStream = socket.into();
    Ok(Connection::Unix(stream))
}
