//! Wire frame structure and encoding/decoding

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;
use tracing::trace;

use crate::{
    crc,
    error::{Error, Result},
    opcode::Opcode,
    FRAME_OVERHEAD, FRAME_SOH, MAX_PAYLOAD_SIZE,
};

/// Protocol frame
///
/// # Frame Structure
///
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────────┬─────────┐
/// │   SOH   │ Length  │ Opcode  │   Payload   │   CRC   │
/// │ 1 byte  │ 1 byte  │ 1 byte  │   N bytes   │ 2 bytes │
/// │ (0xFF)  │  (u8)   │  (u8)   │   (bytes)   │ (BE u16)│
/// └─────────┴─────────┴─────────┴─────────────┴─────────┘
/// ```
///
/// The CRC covers length, opcode, and payload. Multi-byte values are
/// big-endian. Responses echo the request opcode; the first two payload
/// bytes of a response are the 16-bit module status.
///
/// # Examples
///
/// ```
/// use tmrust_core::{Frame, Opcode};
///
/// let frame = Frame::new(Opcode::Version);
/// let encoded = frame.encode().unwrap();
/// let decoded = Frame::decode(encoded).unwrap();
/// assert_eq!(frame.opcode, decoded.opcode);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame opcode
    pub opcode: Opcode,

    /// Frame payload (opcode-specific data)
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame with an empty payload
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            payload: Bytes::new(),
        }
    }

    /// Create a frame with payload
    pub fn with_payload(opcode: Opcode, payload: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            payload: payload.into(),
        }
    }

    /// CRC for this frame
    pub fn crc(&self) -> u16 {
        crc::calculate(self.opcode.into(), &self.payload)
    }

    /// Encode frame to bytes
    ///
    /// # Errors
    ///
    /// Fails if the payload exceeds [`MAX_PAYLOAD_SIZE`].
    pub fn encode(&self) -> Result<BytesMut> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(FRAME_OVERHEAD + self.payload.len());
        buf.put_u8(FRAME_SOH);
        buf.put_u8(self.payload.len() as u8);
        buf.put_u8(self.opcode.into());
        buf.put_slice(&self.payload);
        buf.put_u16(self.crc());

        trace!(frame = %hex::encode(&buf), "encoded frame");

        Ok(buf)
    }

    /// Decode a frame from bytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is shorter than the frame overhead or the declared length
    /// - The SOH byte is wrong
    /// - CRC verification fails
    /// - The opcode is unknown
    pub fn decode(mut buf: BytesMut) -> Result<Self> {
        if buf.len() < FRAME_OVERHEAD {
            return Err(Error::FrameTooShort {
                expected: FRAME_OVERHEAD,
                actual: buf.len(),
            });
        }

        let soh = buf.get_u8();
        if soh != FRAME_SOH {
            return Err(Error::InvalidSoh(soh));
        }

        let len = buf.get_u8() as usize;
        let opcode_raw = buf.get_u8();

        // len payload bytes plus the trailing CRC must still be present
        if buf.len() < len + 2 {
            return Err(Error::FrameTooShort {
                expected: FRAME_OVERHEAD + len,
                actual: FRAME_OVERHEAD + buf.len().saturating_sub(2),
            });
        }

        let payload = buf.split_to(len).freeze();
        let crc_received = buf.get_u16();

        let crc_calculated = crc::calculate(opcode_raw, &payload);
        if crc_calculated != crc_received {
            return Err(Error::CrcMismatch {
                expected: crc_calculated,
                received: crc_received,
            });
        }

        let opcode = Opcode::try_from(opcode_raw)?;

        Ok(Self { opcode, payload })
    }

    /// Total encoded size
    pub fn size(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("opcode", &self.opcode)
            .field("crc", &format!("0x{:04X}", self.crc()))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame[{}](len={})", self.opcode, self.payload.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frame_encode_decode() {
        let original = Frame::with_payload(Opcode::SetParam, vec![0x00, 0x01, 0x00, 0x00, 0xC2, 0x00]);
        let encoded = original.encode().unwrap();
        let decoded = Frame::decode(encoded).unwrap();

        assert_eq!(original.opcode, decoded.opcode);
        assert_eq!(original.payload, decoded.payload);
    }

    #[test]
    fn test_frame_layout() {
        let frame = Frame::with_payload(Opcode::Version, vec![0xAB]);
        let encoded = frame.encode().unwrap();
        assert_eq!(encoded[0], FRAME_SOH);
        assert_eq!(encoded[1], 1); // length
        assert_eq!(encoded[2], 0x03); // opcode
        assert_eq!(encoded[3], 0xAB);
        assert_eq!(encoded.len(), FRAME_OVERHEAD + 1);
    }

    #[test]
    fn test_frame_crc_verification() {
        let frame = Frame::new(Opcode::Version);
        let mut encoded = frame.encode().unwrap();

        // Corrupt the CRC (last two bytes)
        let len = encoded.len();
        encoded[len - 1] ^= 0xFF;

        let result = Frame::decode(encoded);
        assert!(matches!(result, Err(Error::CrcMismatch { .. })));
    }

    #[test]
    fn test_frame_bad_soh() {
        let frame = Frame::new(Opcode::Version);
        let mut encoded = frame.encode().unwrap();
        encoded[0] = 0x00;

        assert!(matches!(
            Frame::decode(encoded),
            Err(Error::InvalidSoh(0x00))
        ));
    }

    #[test]
    fn test_frame_too_short() {
        let buf = BytesMut::from(&[0xFF, 0x00][..]);
        assert!(matches!(
            Frame::decode(buf),
            Err(Error::FrameTooShort { .. })
        ));
    }

    #[test]
    fn test_frame_truncated_payload() {
        let frame = Frame::with_payload(Opcode::SearchTags, vec![1, 2, 3, 4]);
        let mut encoded = frame.encode().unwrap();
        encoded.truncate(encoded.len() - 3);

        assert!(matches!(
            Frame::decode(encoded),
            Err(Error::FrameTooShort { .. })
        ));
    }

    #[test]
    fn test_frame_unknown_opcode() {
        // Build a frame by hand with a bogus opcode but a valid CRC
        let payload: [u8; 0] = [];
        let crc = crate::crc::calculate(0xEE, &payload);
        let mut buf = BytesMut::new();
        buf.put_u8(FRAME_SOH);
        buf.put_u8(0);
        buf.put_u8(0xEE);
        buf.put_u16(crc);

        assert!(matches!(
            Frame::decode(buf),
            Err(Error::UnknownOpcode(0xEE))
        ));
    }

    #[test]
    fn test_frame_payload_too_large() {
        let frame = Frame::with_payload(Opcode::SetParam, vec![0u8; MAX_PAYLOAD_SIZE + 1]);
        assert!(matches!(
            frame.encode(),
            Err(Error::PayloadTooLarge { .. })
        ));
    }
}
