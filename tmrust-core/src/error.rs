//! Error types for tmrust-core

/// Result type alias for wire-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wire-level protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame is too short to be valid
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort { expected: usize, actual: usize },

    /// Frame does not start with the SOH byte
    #[error("Invalid frame start byte: 0x{0:02X}")]
    InvalidSoh(u8),

    /// CRC verification failed
    #[error("CRC mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    CrcMismatch { expected: u16, received: u16 },

    /// Unknown opcode
    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Payload too large for a single frame
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { size: usize, max: usize },

    /// A bounded field exceeded its declared maximum
    #[error("Field '{field}' too long: {len} bytes (max: {max} bytes)")]
    SizeViolation {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Ran out of bytes while decoding
    #[error("Truncated data: needed {needed} more bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// Decoded bytes are not valid for their declared type
    #[error("Malformed field '{field}': {reason}")]
    Malformed { field: &'static str, reason: String },
}
