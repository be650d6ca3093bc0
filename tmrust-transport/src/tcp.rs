//! TCP transport
//!
//! Blocking `std::net` connection to a reader reachable as
//! `tmr://host:port`. One socket, one remote, no pooling, no retry.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Largest chunk a single receive returns
const RECV_BUF_SIZE: usize = 1024;

/// TCP transport for network-attached readers
pub struct TcpTransport {
    addr: String,
    port: u16,
    socket_addr: Option<SocketAddr>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
}

impl TcpTransport {
    /// Create a new TCP transport
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            socket_addr: None,
            stream: None,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.socket_addr {
            return Ok(addr);
        }

        let addr_str = format!("{}:{}", self.addr, self.port);

        let addr = addr_str
            .to_socket_addrs()
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr_str, e)))?
            .next()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {addr_str}")))?;

        self.socket_addr = Some(addr);
        Ok(addr)
    }
}

impl Transport for TcpTransport {
    fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyOpen);
        }

        let addr = self.resolve_addr()?;

        debug!("Connecting to {}...", addr);

        let stream = TcpStream::connect_timeout(&addr, self.connect_timeout).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                Error::ConnectionTimeout
            } else {
                Error::Io(e)
            }
        })?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        debug!("Connected to {}", addr);

        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            debug!("Disconnecting from {}...", self.remote_addr());
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }

        self.socket_addr = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;

        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(16)]);

        stream.write_all(data)?;
        stream.flush()?;

        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;

        stream.set_read_timeout(Some(timeout))?;

        // Frames are short; a reader answers each in one segment
        let mut buf = vec![0u8; RECV_BUF_SIZE];
        let n = match stream.read(&mut buf) {
            Ok(0) => return Err(Error::ConnectionClosed),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(Error::ReadTimeout)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Err(Error::ReadTimeout),
            Err(e) => return Err(Error::Io(e)),
        };

        trace!("Received {} bytes: {:02X?}", n, &buf[..n.min(16)]);

        Ok(BytesMut::from(&buf[..n]))
    }

    fn remote_addr(&self) -> String {
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.addr, self.port))
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("TCP transport dropped while still open");
            let _ = self.close();
        }
    }
}
