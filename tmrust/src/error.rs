//! High-level error types
//!
//! Three failure classes reach callers, and all are structured values:
//! host I/O failures (errno + URI), device protocol failures (category +
//! code + message + operation context + URI), and binding-local misuse
//! (unimplemented parameter, type mismatch, size violation). Nothing in
//! this layer retries.

use tmrust_core::Category;
use tmrust_types::{Param, WireType};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The OS failed the transport call
    #[error("Host I/O error on {uri}: errno {errno}")]
    Io { errno: i32, uri: String },

    /// The device answered with a non-success status
    #[error("Device error in {op}{}: {message} ({category}:0x{code:06X}) [{uri}]",
            .param.map(|p| format!(" ({p})")).unwrap_or_default())]
    Device {
        category: Category,
        code: u32,
        message: String,
        /// Operation that failed, e.g. `paramSet`
        op: &'static str,
        /// Parameter or field context, when one applies
        param: Option<&'static str>,
        uri: String,
    },

    /// Operation attempted on a destroyed handle
    #[error("Reader already destroyed")]
    AlreadyDestroyed,

    /// Protocol operation attempted before `connect`
    #[error("Reader not connected")]
    NotConnected,

    /// `connect` called twice
    #[error("Reader already connected")]
    AlreadyConnected,

    /// Parameter is cataloged but has no codec in this binding
    #[error("Parameter {0} is not implemented")]
    Unimplemented(Param),

    /// Value's runtime type disagrees with the catalog's declared type
    #[error("Type mismatch for {param}: expected {expected}, got {actual}")]
    TypeMismatch {
        param: Param,
        expected: WireType,
        actual: WireType,
    },

    /// URI scheme this binding does not understand
    #[error("Invalid reader URI: {0}")]
    InvalidUri(String),

    /// Wire-level error (framing, CRC, bounded-field size violation)
    #[error("Protocol error: {0}")]
    Core(#[from] tmrust_core::Error),

    /// Value-level error (unknown enumerated byte in a response)
    #[error("Type error: {0}")]
    Types(#[from] tmrust_types::Error),
}
