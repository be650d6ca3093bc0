//! Command dispatch
//!
//! One transaction is: encode a frame, send it, block for the response,
//! decode, and reduce the outcome to a [`StatusWord`]. Transport failures
//! do not short-circuit as errors here — they are folded into the same
//! status word a device fault produces, so a single classification point
//! decides whether the caller sees a host I/O error or a device error.
//!
//! Listeners observe the raw bytes on both legs of the exchange, before
//! any decoding happens.

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, trace};

use tmrust_core::status::comm;
use tmrust_core::{Frame, Opcode, StatusWord};

use crate::error::{Error, Result};
use crate::listener::TransportDirection;
use crate::reader::Reader;

/// Fold a transport failure into a Comm-category status word
///
/// An OS errno is preserved via the errno flag; everything else maps to
/// a transport code.
pub(crate) fn comm_status(err: &tmrust_transport::Error) -> StatusWord {
    use tmrust_transport::Error as T;

    if let Some(errno) = err.errno() {
        return StatusWord::comm_errno(errno);
    }
    match err {
        T::ConnectionTimeout | T::ReadTimeout => StatusWord::comm(comm::TIMEOUT),
        T::ConnectionClosed => StatusWord::comm(comm::CLOSED),
        T::NotOpen | T::AlreadyOpen => StatusWord::comm(comm::NOT_OPEN),
        T::InvalidAddress(_) => StatusWord::comm(comm::BAD_ADDRESS),
        T::Io(_) => StatusWord::comm(comm::IO),
    }
}

impl Reader {
    /// One command/response exchange with the default transport timeout
    pub(crate) fn transact(
        &mut self,
        opcode: Opcode,
        payload: &[u8],
    ) -> Result<(StatusWord, Bytes)> {
        self.transact_with_timeout(opcode, payload, self.transport_timeout)
    }

    /// One command/response exchange
    ///
    /// `Err` here means the response bytes could not be decoded at all
    /// (framing, CRC, unknown opcode) or the request could not be
    /// encoded. Everything the device or transport *said* — including
    /// timeouts and faults — comes back as `Ok` with a non-success
    /// status word and is classified by [`Reader::invoke`].
    pub(crate) fn transact_with_timeout(
        &mut self,
        opcode: Opcode,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(StatusWord, Bytes)> {
        let frame = Frame::with_payload(opcode, payload.to_vec());
        let encoded = frame.encode()?;

        trace!(%frame, "sending command");

        let sent = self.transport.send(&encoded);
        self.notify_listeners(TransportDirection::Send, &encoded, timeout);
        if let Err(e) = sent {
            return Ok((comm_status(&e), Bytes::new()));
        }

        let raw = match self.transport.receive(timeout) {
            Ok(raw) => raw,
            Err(e) => return Ok((comm_status(&e), Bytes::new())),
        };
        self.notify_listeners(TransportDirection::Receive, &raw, timeout);

        let response = Frame::decode(raw)?;

        if response.opcode != opcode {
            debug!(sent = %opcode, got = %response.opcode, "opcode echo mismatch");
            return Ok((StatusWord::comm(comm::BAD_FRAME), Bytes::new()));
        }

        // A response payload always starts with the 16-bit module status
        if response.payload.len() < 2 {
            return Ok((StatusWord::comm(comm::BAD_FRAME), Bytes::new()));
        }
        let module_status = u16::from_be_bytes([response.payload[0], response.payload[1]]);
        let data = response.payload.slice(2..);

        let status = StatusWord::from_module_status(module_status);
        trace!(%opcode, %status, data_len = data.len(), "transaction complete");

        Ok((status, data))
    }

    /// Run a transaction and classify its status word
    ///
    /// Success yields the response data; a non-success status becomes an
    /// [`Error::Io`] when it carries a host errno and an
    /// [`Error::Device`] otherwise.
    pub(crate) fn invoke<F>(
        &mut self,
        op: &'static str,
        param: Option<&'static str>,
        f: F,
    ) -> Result<Bytes>
    where
        F: FnOnce(&mut Reader) -> Result<(StatusWord, Bytes)>,
    {
        let (status, data) = f(self)?;
        if status.is_success() {
            Ok(data)
        } else {
            Err(self.classify(status, op, param))
        }
    }

    pub(crate) fn classify(
        &self,
        status: StatusWord,
        op: &'static str,
        param: Option<&'static str>,
    ) -> Error {
        if let Some(errno) = status.errno() {
            Error::Io {
                errno,
                uri: self.uri.clone(),
            }
        } else {
            let (category, code) = status.decode();
            Error::Device {
                category,
                code,
                message: status.describe(),
                op,
                param,
                uri: self.uri.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmrust_core::Category;

    #[test]
    fn test_comm_status_mapping() {
        use tmrust_transport::Error as T;

        assert_eq!(comm_status(&T::ReadTimeout), StatusWord::comm(comm::TIMEOUT));
        assert_eq!(
            comm_status(&T::ConnectionClosed),
            StatusWord::comm(comm::CLOSED)
        );
        assert_eq!(comm_status(&T::NotOpen), StatusWord::comm(comm::NOT_OPEN));
        assert_eq!(
            comm_status(&T::InvalidAddress("nowhere".into())),
            StatusWord::comm(comm::BAD_ADDRESS)
        );
    }

    #[test]
    fn test_comm_status_preserves_errno() {
        let io = std::io::Error::from_raw_os_error(111); // ECONNREFUSED
        let status = comm_status(&tmrust_transport::Error::Io(io));
        assert_eq!(status.errno(), Some(111));
    }

    #[test]
    fn test_classify_errno_becomes_io_error() {
        let reader = Reader::create("test:///dev/null").unwrap();
        let err = reader.classify(StatusWord::comm_errno(110), "read", None);
        assert!(matches!(err, Error::Io { errno: 110, .. }));
    }

    #[test]
    fn test_classify_fault_becomes_device_error() {
        let reader = Reader::create("test:///dev/null").unwrap();
        let err = reader.classify(StatusWord::device_fault(0x0402), "killTag", None);
        match err {
            Error::Device {
                category,
                code,
                op,
                ..
            } => {
                assert_eq!(category, Category::Code);
                assert_eq!(code, 0x0402);
                assert_eq!(op, "killTag");
            }
            other => panic!("expected Device error, got {other:?}"),
        }
    }

    #[test]
    fn test_transact_version_via_sim() {
        let mut reader = Reader::create("test:///dev/null").unwrap();
        reader.transport.open().unwrap();

        let (status, data) = reader.transact(Opcode::Version, &[]).unwrap();
        assert!(status.is_success());
        assert!(!data.is_empty());
    }

    #[test]
    fn test_unsent_command_folds_to_not_open() {
        let mut reader = Reader::create("test:///dev/null").unwrap();
        // Transport never opened
        let (status, _) = reader.transact(Opcode::Version, &[]).unwrap();
        assert_eq!(status, StatusWord::comm(comm::NOT_OPEN));
    }
}
