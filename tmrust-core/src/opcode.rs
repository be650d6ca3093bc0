//! Protocol opcode definitions

use std::fmt;

use crate::error::{Error, Result};

/// Frame opcodes
///
/// Responses echo the opcode of the request they answer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Firmware version query; also the connect-time device verification
    Version = 0x03,

    /// Set a reader parameter
    SetParam = 0x06,

    /// Get a reader parameter
    GetParam = 0x07,

    /// Timed tag search; response data is the tag count
    SearchTags = 0x22,

    /// Write data into a tag memory bank
    WriteTagData = 0x24,

    /// Apply a lock action to a tag
    LockTag = 0x25,

    /// Kill a tag
    KillTag = 0x26,

    /// Read data out of a tag memory bank
    ReadTagData = 0x28,

    /// Tag buffer access: remaining-count query or fetch-next
    TagBuffer = 0x29,

    /// Discard any buffered tag records
    ClearTagBuffer = 0x2A,

    /// Best-effort shutdown notice sent on destroy
    Shutdown = 0x60,
}

impl Opcode {
    /// Opcode name for logs and error context
    pub fn name(self) -> &'static str {
        match self {
            Self::Version => "OP_VERSION",
            Self::SetParam => "OP_SET_PARAM",
            Self::GetParam => "OP_GET_PARAM",
            Self::SearchTags => "OP_SEARCH_TAGS",
            Self::WriteTagData => "OP_WRITE_TAG_DATA",
            Self::LockTag => "OP_LOCK_TAG",
            Self::KillTag => "OP_KILL_TAG",
            Self::ReadTagData => "OP_READ_TAG_DATA",
            Self::TagBuffer => "OP_TAG_BUFFER",
            Self::ClearTagBuffer => "OP_CLEAR_TAG_BUFFER",
            Self::Shutdown => "OP_SHUTDOWN",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x03 => Ok(Self::Version),
            0x06 => Ok(Self::SetParam),
            0x07 => Ok(Self::GetParam),
            0x22 => Ok(Self::SearchTags),
            0x24 => Ok(Self::WriteTagData),
            0x25 => Ok(Self::LockTag),
            0x26 => Ok(Self::KillTag),
            0x28 => Ok(Self::ReadTagData),
            0x29 => Ok(Self::TagBuffer),
            0x2A => Ok(Self::ClearTagBuffer),
            0x60 => Ok(Self::Shutdown),
            _ => Err(Error::UnknownOpcode(value)),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}
