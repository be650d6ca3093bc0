//! # tmrust
//!
//! Rust binding for Mercury-series UHF RFID readers.
//!
//! ## Features
//!
//! - Typed parameter catalog with runtime type checks
//! - Timed tag search with device-buffer drain
//! - Tag operations (read/write memory, lock, kill) with selection filters
//! - Transport listeners for raw frame diagnostics
//! - In-process simulated reader (`test://` URIs) for development
//!
//! ## Quick Start
//!
//! ```no_run
//! use tmrust::Reader;
//!
//! fn main() -> tmrust::Result<()> {
//!     // Connect to a network-attached reader
//!     let mut reader = Reader::create("tmr://192.168.1.50")?;
//!     reader.connect()?;
//!
//!     // Search for 500 ms
//!     for tag in reader.read(500)? {
//!         println!("{}", tag);
//!     }
//!
//!     reader.destroy()?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod listener;
pub mod params;
pub mod read;
pub mod reader;
pub mod tagop;

mod dispatch;

// Re-exports
pub use error::{Error, Result};
pub use listener::{ListenerId, TransportDirection};
pub use params::{MAX_PARAM_BYTES, MAX_PARAM_STRING};
pub use reader::{Reader, ReaderState};

// Re-export types
pub use tmrust_core::{Category, StatusWord};
pub use tmrust_types::{
    LockAction, MemBank, Param, ParamValue, ReadPlan, Region, TagFilter, TagOp, TagProtocol,
    TagReadRecord, WireType,
};
