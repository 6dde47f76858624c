//! Connection establishment and traffic generation
//!
//! The trial runner drives these narrow interfaces; it never touches sockets
//! directly. The shipped implementations push a fixed printable-ASCII
//! payload over a TCP stream (MPTCP-capable when the kernel path is
//! enabled) and drain echoes opportunistically.

use async_trait::async_trait;
use rand::Rng;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::trial::Endpoint;
use crate::{Error, Result};

/// Traffic payload size in bytes per send.
pub const PAYLOAD_SIZE: usize = 1024;

/// Opens one exclusively-owned connection handle per trial.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Live connection handle type.
    type Handle: Send;

    /// Establish a connection to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] when the endpoint is unreachable.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Self::Handle>;
}

/// Feeds traffic over a connection handle.
///
/// `try_receive` returning `Ok(None)` means "no data yet" (WouldBlock), not
/// an error.
#[async_trait]
pub trait TrafficGenerator<H: Send>: Send + Sync {
    /// Send one payload; returns bytes sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] when the connection drops mid-send.
    async fn send_once(&self, handle: &mut H) -> Result<usize>;

    /// Drain available echoed bytes without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] when the peer closed or the read
    /// failed with anything other than WouldBlock.
    async fn try_receive(&self, handle: &mut H) -> Result<Option<usize>>;
}

/// Connector producing plain `TcpStream` handles.
///
/// MPTCP subflow creation happens below the socket API on kernels with the
/// multipath stack enabled; the connector itself stays ordinary TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Handle = TcpStream;

    async fn connect(&self, endpoint: &Endpoint) -> Result<TcpStream> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|e| Error::Connection(format!("connect to {endpoint}: {e}")))?;
        tracing::debug!(%endpoint, "connected");
        Ok(stream)
    }
}

/// Traffic generator writing a fixed random printable-ASCII payload.
#[derive(Debug, Clone)]
pub struct TcpTraffic {
    payload: Vec<u8>,
}

impl TcpTraffic {
    /// Create a generator with a freshly randomized [`PAYLOAD_SIZE`]-byte
    /// payload of printable ASCII.
    #[must_use]
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let payload = (0..PAYLOAD_SIZE).map(|_| rng.gen_range(33..=126u8)).collect();
        Self { payload }
    }

    /// The payload written on every send.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl Default for TcpTraffic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrafficGenerator<TcpStream> for TcpTraffic {
    async fn send_once(&self, stream: &mut TcpStream) -> Result<usize> {
        stream
            .write_all(&self.payload)
            .await
            .map_err(|e| Error::Connection(format!("send failed: {e}")))?;
        Ok(self.payload.len())
    }

    async fn try_receive(&self, stream: &mut TcpStream) -> Result<Option<usize>> {
        let mut buf = [0u8; PAYLOAD_SIZE];
        match stream.try_read(&mut buf) {
            Ok(0) => Err(Error::Connection("peer closed the connection".into())),
            Ok(n) => Ok(Some(n)),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(Error::Connection(format!("receive failed: {e}"))),
        }
    }
}
