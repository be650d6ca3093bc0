//! Read-plan value objects
//!
//! A read plan tells the reader which antennas to search, under which air
//! protocol, and when to stop. Antenna and GPI trigger lists are bounded;
//! the parameter codec enforces the bounds at encode time and refuses to
//! truncate.

use std::fmt;

use crate::error::{Error, Result};

/// Maximum number of antenna ports a plan may name
pub const MAX_ANTENNAS: usize = 16;

/// Maximum number of GPI trigger pins a plan may name
pub const MAX_GPI_PINS: usize = 4;

/// Tag air protocol
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagProtocol {
    Gen2 = 0x05,
    Iso180006b = 0x03,
    Ipx64 = 0x07,
    Ipx256 = 0x08,
}

impl TryFrom<u8> for TagProtocol {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x05 => Ok(Self::Gen2),
            0x03 => Ok(Self::Iso180006b),
            0x07 => Ok(Self::Ipx64),
            0x08 => Ok(Self::Ipx256),
            other => Err(Error::Parse(format!("unknown tag protocol: 0x{other:02X}"))),
        }
    }
}

impl fmt::Display for TagProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Which antennas to read, with what protocol, with optional early stop
/// and GPI trigger
///
/// # Examples
///
/// ```
/// use tmrust_types::{ReadPlan, TagProtocol};
///
/// let plan = ReadPlan::new(vec![1, 2], TagProtocol::Gen2)
///     .with_stop_on_count(10);
/// assert_eq!(plan.antennas, vec![1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPlan {
    /// Antenna ports to search, in order (at most [`MAX_ANTENNAS`])
    pub antennas: Vec<u8>,

    /// Air protocol for the search
    pub protocol: TagProtocol,

    /// Stop the search early once this many tags were seen
    pub stop_on_count: Option<u32>,

    /// GPI pins that must be asserted before the search starts
    /// (at most [`MAX_GPI_PINS`])
    pub gpi_trigger: Vec<u8>,
}

impl ReadPlan {
    /// Create a plan over the given antennas
    pub fn new(antennas: Vec<u8>, protocol: TagProtocol) -> Self {
        Self {
            antennas,
            protocol,
            stop_on_count: None,
            gpi_trigger: Vec::new(),
        }
    }

    /// Stop the search once `count` tags were observed
    pub fn with_stop_on_count(mut self, count: u32) -> Self {
        self.stop_on_count = Some(count);
        self
    }

    /// Gate the search on the given GPI pins
    pub fn with_gpi_trigger(mut self, pins: Vec<u8>) -> Self {
        self.gpi_trigger = pins;
        self
    }
}

impl Default for ReadPlan {
    /// Antenna 1, GEN2, no early stop, no trigger
    fn default() -> Self {
        Self::new(vec![1], TagProtocol::Gen2)
    }
}

impl fmt::Display for ReadPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReadPlan[{:?} antennas={:?}",
            self.protocol, self.antennas
        )?;
        if let Some(count) = self.stop_on_count {
            write!(f, " stopOnCount={count}")?;
        }
        if !self.gpi_trigger.is_empty() {
            write!(f, " gpiTrigger={:?}", self.gpi_trigger)?;
        }
        write!(f, "]")
    }
}
