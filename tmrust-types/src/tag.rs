//! Tag observations, tag operations, and selection filters

use std::fmt;

use crate::error::{Error, Result};
use crate::plan::TagProtocol;

/// Maximum EPC length in bytes
pub const MAX_EPC_BYTES: usize = 62;

/// Maximum data length for a tag write, in bytes
pub const MAX_TAGOP_DATA: usize = 64;

/// Maximum select-mask length in bytes
pub const MAX_FILTER_MASK: usize = 32;

/// Tag memory bank
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MemBank {
    Reserved = 0,
    Epc = 1,
    Tid = 2,
    User = 3,
}

impl TryFrom<u8> for MemBank {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Reserved),
            1 => Ok(Self::Epc),
            2 => Ok(Self::Tid),
            3 => Ok(Self::User),
            other => Err(Error::Parse(format!("unknown memory bank: {other}"))),
        }
    }
}

/// One tag observation from a timed search
///
/// Produced only by the read protocol; a plain value owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct TagReadRecord {
    /// Tag identifier (EPC) bytes
    pub epc: Vec<u8>,

    /// Antenna port the tag was seen on
    pub antenna: u8,

    /// Signal strength, dBm
    pub rssi: i8,

    /// How many times the tag was seen during the search
    pub read_count: u32,

    /// Reader timestamp, milliseconds
    pub timestamp_ms: u64,

    /// Air protocol the tag answered under
    pub protocol: TagProtocol,

    /// RF phase of the backscattered signal
    pub phase: u16,

    /// Carrier frequency during the read, kHz
    pub frequency_khz: u32,

    /// Embedded per-membank payloads requested by the read plan
    pub embedded_data: Vec<(MemBank, Vec<u8>)>,
}

impl fmt::Display for TagReadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tag[epc={:02X?} ant={} rssi={} reads={}]",
            self.epc, self.antenna, self.rssi, self.read_count
        )
    }
}

/// Gen2 lock action
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LockAction {
    /// Which lock bits to change
    pub mask: u16,
    /// New values for the masked bits
    pub action: u16,
}

/// A single operation targeted at one tag
#[derive(Debug, Clone, PartialEq)]
pub enum TagOp {
    /// Read `word_count` 16-bit words from `bank` at `word_address`
    Read {
        bank: MemBank,
        word_address: u32,
        word_count: u8,
    },
    /// Write `data` into `bank` at `word_address`
    Write {
        bank: MemBank,
        word_address: u32,
        data: Vec<u8>,
    },
    /// Apply a lock action using the access password
    Lock {
        action: LockAction,
        access_password: u32,
    },
    /// Permanently kill the tag
    Kill { kill_password: u32 },
}

impl TagOp {
    /// Short operation name for error context
    pub fn name(&self) -> &'static str {
        match self {
            TagOp::Read { .. } => "readTagMemBytes",
            TagOp::Write { .. } => "writeTagMemBytes",
            TagOp::Lock { .. } => "lockTag",
            TagOp::Kill { .. } => "killTag",
        }
    }
}

/// Selection predicate narrowing which tag answers a tag operation
#[derive(Debug, Clone, PartialEq)]
pub struct TagFilter {
    /// Memory bank the mask is matched against
    pub bank: MemBank,

    /// Bit offset the comparison starts at
    pub bit_offset: u32,

    /// Mask bytes (at most [`MAX_FILTER_MASK`])
    pub mask: Vec<u8>,

    /// Select tags that do NOT match
    pub invert: bool,
}

impl TagFilter {
    /// Match tags whose EPC begins with the given bytes
    ///
    /// EPC memory starts with CRC and PC words; the EPC proper begins at
    /// bit 32.
    pub fn epc_prefix(epc: Vec<u8>) -> Self {
        Self {
            bank: MemBank::Epc,
            bit_offset: 32,
            mask: epc,
            invert: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membank_conversion() {
        assert_eq!(MemBank::try_from(1).unwrap(), MemBank::Epc);
        assert_eq!(MemBank::try_from(3).unwrap(), MemBank::User);
        assert!(MemBank::try_from(9).is_err());
    }

    #[test]
    fn test_tagop_names() {
        let op = TagOp::Read {
            bank: MemBank::User,
            word_address: 0,
            word_count: 2,
        };
        assert_eq!(op.name(), "readTagMemBytes");
        assert_eq!(TagOp::Kill { kill_password: 0 }.name(), "killTag");
    }

    #[test]
    fn test_epc_prefix_filter() {
        let filter = TagFilter::epc_prefix(vec![0xE2, 0x80]);
        assert_eq!(filter.bank, MemBank::Epc);
        assert_eq!(filter.bit_offset, 32);
        assert!(!filter.invert);
    }

    #[test]
    fn test_record_display() {
        let record = TagReadRecord {
            epc: vec![0xE2, 0x00],
            antenna: 1,
            rssi: -40,
            read_count: 3,
            timestamp_ms: 0,
            protocol: TagProtocol::Gen2,
            phase: 0,
            frequency_khz: 915_250,
            embedded_data: Vec::new(),
        };
        let s = record.to_string();
        assert!(s.contains("ant=1"));
        assert!(s.contains("rssi=-40"));
    }
}
