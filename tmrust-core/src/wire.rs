//! Bounded wire buffer
//!
//! Parameter values, tag operations, and filters are marshaled through a
//! [`WireBuffer`]: a fixed-capacity cursor with big-endian scalar access
//! and length-prefixed bounded fields. A bounded field whose logical
//! length exceeds its declared maximum fails with a size violation naming
//! the field, the attempted length, and the maximum — it is never
//! silently truncated.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// Fixed-capacity encode/decode cursor
///
/// # Examples
///
/// ```
/// use tmrust_core::WireBuffer;
///
/// let mut buf = WireBuffer::new(16);
/// buf.put_u32(115200).unwrap();
/// buf.put_bounded_bytes("mask", &[0xE2, 0x80], 32).unwrap();
///
/// let mut rd = WireBuffer::from_slice(buf.as_slice());
/// assert_eq!(rd.get_u32().unwrap(), 115200);
/// assert_eq!(rd.get_bounded_bytes("mask").unwrap(), vec![0xE2, 0x80]);
/// ```
#[derive(Debug, Clone)]
pub struct WireBuffer {
    buf: Vec<u8>,
    cap: usize,
    read: usize,
}

impl WireBuffer {
    /// Empty buffer that will hold at most `cap` bytes
    pub fn new(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
            cap,
            read: 0,
        }
    }

    /// Decode cursor over received bytes
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            buf: data.to_vec(),
            cap: data.len(),
            read: 0,
        }
    }

    /// Bytes encoded so far
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Used length
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left to decode
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.read
    }

    fn ensure_space(&mut self, needed: usize) -> Result<()> {
        let size = self.buf.len() + needed;
        if size > self.cap {
            return Err(Error::PayloadTooLarge {
                size,
                max: self.cap,
            });
        }
        Ok(())
    }

    fn take(&mut self, needed: usize) -> Result<&[u8]> {
        if self.remaining() < needed {
            return Err(Error::Truncated {
                needed,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.read..self.read + needed];
        self.read += needed;
        Ok(slice)
    }

    // Encode side

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.ensure_space(1)?;
        self.buf.push(value);
        Ok(())
    }

    pub fn put_i8(&mut self, value: i8) -> Result<()> {
        self.put_u8(value as u8)
    }

    pub fn put_u16(&mut self, value: u16) -> Result<()> {
        self.ensure_space(2)?;
        let mut scratch = [0u8; 2];
        BigEndian::write_u16(&mut scratch, value);
        self.buf.extend_from_slice(&scratch);
        Ok(())
    }

    pub fn put_u32(&mut self, value: u32) -> Result<()> {
        self.ensure_space(4)?;
        let mut scratch = [0u8; 4];
        BigEndian::write_u32(&mut scratch, value);
        self.buf.extend_from_slice(&scratch);
        Ok(())
    }

    pub fn put_i32(&mut self, value: i32) -> Result<()> {
        self.put_u32(value as u32)
    }

    pub fn put_u64(&mut self, value: u64) -> Result<()> {
        self.ensure_space(8)?;
        let mut scratch = [0u8; 8];
        BigEndian::write_u64(&mut scratch, value);
        self.buf.extend_from_slice(&scratch);
        Ok(())
    }

    /// Length-prefixed byte field with a declared maximum
    pub fn put_bounded_bytes(
        &mut self,
        field: &'static str,
        bytes: &[u8],
        max: usize,
    ) -> Result<()> {
        if bytes.len() > max {
            return Err(Error::SizeViolation {
                field,
                len: bytes.len(),
                max,
            });
        }
        self.ensure_space(1 + bytes.len())?;
        self.buf.push(bytes.len() as u8);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Length-prefixed UTF-8 string field with a declared maximum
    pub fn put_bounded_str(&mut self, field: &'static str, s: &str, max: usize) -> Result<()> {
        self.put_bounded_bytes(field, s.as_bytes(), max)
    }

    // Decode side

    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn get_i8(&mut self) -> Result<i8> {
        Ok(self.get_u8()? as i8)
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        Ok(self.get_u32()? as i32)
    }

    pub fn get_u64(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    /// Length-prefixed byte field
    pub fn get_bounded_bytes(&mut self, _field: &'static str) -> Result<Vec<u8>> {
        let len = self.get_u8()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Length-prefixed UTF-8 string field
    pub fn get_bounded_str(&mut self, field: &'static str) -> Result<String> {
        let bytes = self.get_bounded_bytes(field)?;
        String::from_utf8(bytes).map_err(|e| Error::Malformed {
            field,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_scalar_roundtrip() {
        let mut buf = WireBuffer::new(32);
        buf.put_u8(0xAB).unwrap();
        buf.put_u16(0x1234).unwrap();
        buf.put_u32(0xDEAD_BEEF).unwrap();
        buf.put_i32(-42).unwrap();
        buf.put_u64(1_700_000_000_000).unwrap();
        buf.put_i8(-3).unwrap();

        let mut rd = WireBuffer::from_slice(buf.as_slice());
        assert_eq!(rd.get_u8().unwrap(), 0xAB);
        assert_eq!(rd.get_u16().unwrap(), 0x1234);
        assert_eq!(rd.get_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(rd.get_i32().unwrap(), -42);
        assert_eq!(rd.get_u64().unwrap(), 1_700_000_000_000);
        assert_eq!(rd.get_i8().unwrap(), -3);
        assert_eq!(rd.remaining(), 0);
    }

    #[test]
    fn test_big_endian_layout() {
        let mut buf = WireBuffer::new(4);
        buf.put_u32(0x0102_0304).unwrap();
        assert_eq!(buf.as_slice(), &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_bounded_bytes_over_max_fails_with_context() {
        let mut buf = WireBuffer::new(128);
        let data = vec![0u8; 33];
        let err = buf.put_bounded_bytes("mask", &data, 32).unwrap_err();
        match err {
            Error::SizeViolation { field, len, max } => {
                assert_eq!(field, "mask");
                assert_eq!(len, 33);
                assert_eq!(max, 32);
            }
            other => panic!("expected SizeViolation, got {other:?}"),
        }
        // Nothing was written
        assert!(buf.is_empty());
    }

    #[test]
    fn test_capacity_overflow() {
        let mut buf = WireBuffer::new(3);
        buf.put_u16(1).unwrap();
        assert!(matches!(
            buf.put_u16(2),
            Err(Error::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_truncated_decode() {
        let mut rd = WireBuffer::from_slice(&[0x01, 0x02]);
        assert!(matches!(rd.get_u32(), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_truncated_bounded_field() {
        // Length prefix promises more bytes than present
        let mut rd = WireBuffer::from_slice(&[0x05, 0x01]);
        assert!(matches!(
            rd.get_bounded_bytes("epc"),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_string_roundtrip() {
        let mut buf = WireBuffer::new(64);
        buf.put_bounded_str("uri", "tmr://reader", 32).unwrap();
        let mut rd = WireBuffer::from_slice(buf.as_slice());
        assert_eq!(rd.get_bounded_str("uri").unwrap(), "tmr://reader");
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let mut rd = WireBuffer::from_slice(&[0x02, 0xFF, 0xFE]);
        assert!(matches!(
            rd.get_bounded_str("uri"),
            Err(Error::Malformed { field: "uri", .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_bounded_bytes_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..=64)) {
            let mut buf = WireBuffer::new(128);
            buf.put_bounded_bytes("data", &data, 64).unwrap();
            let mut rd = WireBuffer::from_slice(buf.as_slice());
            prop_assert_eq!(rd.get_bounded_bytes("data").unwrap(), data);
        }

        #[test]
        fn prop_over_max_never_truncates(extra in 1usize..32) {
            let data = vec![0xAAu8; 16 + extra];
            let mut buf = WireBuffer::new(256);
            prop_assert!(buf.put_bounded_bytes("data", &data, 16).is_err());
            prop_assert_eq!(buf.len(), 0);
        }
    }
}
