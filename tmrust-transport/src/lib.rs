//! Transport layer for tmrust
//!
//! Provides the byte-stream seam between the binding and a reader:
//! a synchronous [`Transport`] trait, a TCP implementation for
//! `tmr://host:port` readers, and an in-process simulated reader for
//! `test://` URIs.
//!
//! Every operation blocks the calling thread until the device responds or
//! the timeout elapses; there is no internal suspension and no retry.

pub mod error;
pub mod sim;
pub mod tcp;

pub use error::{Error, Result};
pub use sim::{SimDeviceHandle, SimTag, SimTransport};
pub use tcp::TcpTransport;

use std::time::Duration;

use bytes::BytesMut;

/// Transport trait for different communication methods
///
/// Implementations handle only byte transmission; they know nothing about
/// frames or parameters.
pub trait Transport: Send {
    /// Open the connection to the device
    fn open(&mut self) -> Result<()>;

    /// Close the connection
    fn close(&mut self) -> Result<()>;

    /// Check if open
    fn is_open(&self) -> bool;

    /// Send raw bytes
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive raw bytes, blocking up to `timeout`
    fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Human-readable remote address for logs and errors
    fn remote_addr(&self) -> String;
}
