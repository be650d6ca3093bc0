//! # tmrust-core
//!
//! Wire-level primitives for Mercury-series UHF RFID readers.
//!
//! This crate provides the low-level protocol pieces:
//! - Frame structure and encoding/decoding
//! - CRC calculation
//! - Opcode definitions
//! - The packed 32-bit status word
//! - Bounded wire buffer for parameter and tag-op payloads

pub mod constants;
pub mod crc;
pub mod error;
pub mod frame;
pub mod opcode;
pub mod status;
pub mod wire;

pub use error::{Error, Result};
pub use frame::Frame;
pub use opcode::Opcode;
pub use status::{Category, StatusWord};
pub use wire::WireBuffer;

/// Protocol version information
pub const PROTOCOL_VERSION: &str = "1.0";

/// Default TCP port for `tmr://` readers
pub const DEFAULT_PORT: u16 = 8086;

/// Frame start byte
pub const FRAME_SOH: u8 = 0xFF;

/// Frame overhead: SOH + length + opcode + CRC
pub const FRAME_OVERHEAD: usize = 5;

/// Maximum frame payload (length is a single byte)
pub const MAX_PAYLOAD_SIZE: usize = 250;
