//! Reader handle lifecycle
//!
//! A [`Reader`] owns its transport and walks a one-way state machine:
//! *Created* → *Connected* → *Destroyed*. Destruction is idempotent and
//! also runs on drop, exactly once; afterwards every operation fails with
//! [`Error::AlreadyDestroyed`](crate::Error::AlreadyDestroyed) instead of
//! touching the released transport.
//!
//! # Thread safety
//!
//! A `Reader` is not safe for concurrent use from multiple threads; a
//! caller sharing one handle must add its own serialization. Transport
//! listeners run synchronously on the calling thread, and with a
//! simulated transport the device logic itself runs inside `send` — a
//! listener must not call back into the same handle.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use tmrust_core::{constants, Opcode, WireBuffer, DEFAULT_PORT};
use tmrust_transport::{SimTransport, TcpTransport, Transport};
use tmrust_types::{Param, ParamValue};

use crate::error::{Error, Result};
use crate::listener::TransportListenerFn;

/// Handle lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Handle exists, transport not yet opened
    Created,

    /// Transport open, device verified
    Connected,

    /// Terminal; the transport has been released
    Destroyed,
}

/// A Mercury-series reader
///
/// # Examples
///
/// ```
/// use tmrust::Reader;
///
/// fn main() -> tmrust::Result<()> {
///     let mut reader = Reader::create("test:///dev/null")?;
///     reader.connect()?;
///
///     let tags = reader.read(500)?;
///     println!("{} tags", tags.len());
///
///     reader.destroy()?;
///     Ok(())
/// }
/// ```
pub struct Reader {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) uri: String,
    pub(crate) state: ReaderState,
    pub(crate) listeners: HashMap<String, TransportListenerFn>,
    pub(crate) transport_timeout: Duration,
    pub(crate) command_timeout: Duration,
    /// Parameters set before connect, replayed to the device at connect
    pub(crate) pending: Vec<(Param, ParamValue)>,
}

impl Reader {
    /// Create a handle for the reader at `uri`
    ///
    /// Supported schemes:
    /// - `tmr://host[:port]` — network-attached reader (TCP)
    /// - `test://...` — in-process simulated reader
    ///
    /// Any failure here means no handle exists; there is no
    /// partially-constructed state to clean up.
    pub fn create(uri: &str) -> Result<Reader> {
        let transport: Box<dyn Transport> = if let Some(rest) = uri.strip_prefix("tmr://") {
            let (host, port) = match rest.rsplit_once(':') {
                Some((host, port)) => {
                    let port = port
                        .parse::<u16>()
                        .map_err(|_| Error::InvalidUri(uri.to_string()))?;
                    (host, port)
                }
                None => (rest, DEFAULT_PORT),
            };
            if host.is_empty() {
                return Err(Error::InvalidUri(uri.to_string()));
            }
            Box::new(TcpTransport::new(host, port))
        } else if uri.starts_with("test://") {
            Box::new(SimTransport::new(uri))
        } else {
            return Err(Error::InvalidUri(uri.to_string()));
        };

        Ok(Self::with_transport(uri, transport))
    }

    /// Create a handle over a caller-supplied transport
    ///
    /// Used for custom transports and for simulated readers that need
    /// seeding before the handle takes ownership.
    pub fn with_transport(uri: &str, transport: Box<dyn Transport>) -> Reader {
        Reader {
            transport,
            uri: uri.to_string(),
            state: ReaderState::Created,
            listeners: HashMap::new(),
            transport_timeout: Duration::from_millis(
                constants::DEFAULT_TRANSPORT_TIMEOUT_MS as u64,
            ),
            command_timeout: Duration::from_millis(constants::DEFAULT_COMMAND_TIMEOUT_MS as u64),
            pending: Vec::new(),
        }
    }

    /// The URI this handle was created with
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Current lifecycle state
    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub(crate) fn ensure_alive(&self) -> Result<()> {
        if self.state == ReaderState::Destroyed {
            return Err(Error::AlreadyDestroyed);
        }
        Ok(())
    }

    pub(crate) fn ensure_connected(&self) -> Result<()> {
        self.ensure_alive()?;
        if self.state != ReaderState::Connected {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    /// Open the transport and verify a device is answering
    ///
    /// Valid only in the *Created* state. A verification failure closes
    /// the transport again so the handle stays in *Created* and `connect`
    /// can be retried. Parameters set before connect are replayed to the
    /// device once verification passes.
    pub fn connect(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if self.state == ReaderState::Connected {
            return Err(Error::AlreadyConnected);
        }

        info!("Connecting to {}...", self.uri);

        if let Err(e) = self.transport.open() {
            return Err(self.classify(crate::dispatch::comm_status(&e), "connect", None));
        }

        let firmware = match self.verify_device() {
            Ok(firmware) => firmware,
            Err(e) => {
                if let Err(close_err) = self.transport.close() {
                    warn!("Transport close after failed verification: {}", close_err);
                }
                return Err(e);
            }
        };

        self.state = ReaderState::Connected;
        info!("Connected to {} (firmware {})", self.uri, firmware);

        // Push everything configured while unconnected to the device
        let pending = std::mem::take(&mut self.pending);
        for (param, value) in pending {
            self.set_param(param, &value)?;
        }

        Ok(())
    }

    /// The firmware must answer a version query before the handle is
    /// considered connected
    fn verify_device(&mut self) -> Result<String> {
        let data = self.invoke("connect", None, |r| r.transact(Opcode::Version, &[]))?;
        let mut rd = WireBuffer::from_slice(&data);
        Ok(rd.get_bounded_str("version")?)
    }

    /// Release the handle
    ///
    /// Valid from any state and idempotent with respect to the release
    /// itself; a connected reader gets a best-effort shutdown notice
    /// first. After this, every operation fails with `AlreadyDestroyed`.
    pub fn destroy(&mut self) -> Result<()> {
        if self.state == ReaderState::Destroyed {
            return Ok(());
        }

        if self.state == ReaderState::Connected {
            info!("Destroying reader {}...", self.uri);
            if let Err(e) = self.transact(Opcode::Shutdown, &[]) {
                warn!("Shutdown notice failed: {}", e);
            }
            if let Err(e) = self.transport.close() {
                warn!("Transport close failed: {}", e);
            }
        } else {
            debug!("Destroying unconnected reader {}", self.uri);
        }

        // Tombstone: later operations must fail, not touch the transport
        self.state = ReaderState::Destroyed;
        Ok(())
    }

    /// Discard any tag records still buffered on the device
    pub fn clear_tag_buffer(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.invoke("clearTagBuffer", None, |r| {
            r.transact(Opcode::ClearTagBuffer, &[])
        })?;
        Ok(())
    }

    pub(crate) fn apply_timeout_side_effects(&mut self, param: Param, ms: u32) {
        // The device stores these too; the handle keeps local copies so
        // the blocking receive honors what was configured.
        match param {
            Param::TransportTimeout => {
                self.transport_timeout = Duration::from_millis(ms as u64);
            }
            Param::CommandTimeout => {
                self.command_timeout = Duration::from_millis(ms as u64);
            }
            _ => {}
        }
    }

    /// Hold a value set before connect for replay at connect time
    pub(crate) fn stash_pending(&mut self, param: Param, value: ParamValue) {
        match self.pending.iter_mut().find(|(p, _)| *p == param) {
            Some(entry) => entry.1 = value,
            None => self.pending.push((param, value)),
        }
    }

    /// Value visible before connect: a stashed set, or the handle's own
    /// timeout copies
    pub(crate) fn pending_param(&self, param: Param) -> Option<ParamValue> {
        if let Some((_, value)) = self.pending.iter().find(|(p, _)| *p == param) {
            return Some(value.clone());
        }
        match param {
            Param::TransportTimeout => {
                Some(ParamValue::Uint32(self.transport_timeout.as_millis() as u32))
            }
            Param::CommandTimeout => {
                Some(ParamValue::Uint32(self.command_timeout.as_millis() as u32))
            }
            _ => None,
        }
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        if self.state != ReaderState::Destroyed {
            let _ = self.destroy();
        }
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("uri", &self.uri)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
