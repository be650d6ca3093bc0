//! Runtime-typed parameter values
//!
//! The binding cannot statically know which Rust type a given [`Param`]
//! carries, so values cross the `set`/`get` boundary as a closed tagged
//! union. The [`WireType`] discriminator is checked against the catalog's
//! declared type before anything is encoded.
//!
//! [`Param`]: crate::param::Param

use std::fmt;

use crate::error::{Error, Result};
use crate::plan::ReadPlan;

/// Declared wire type of a parameter
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Unsigned 32-bit scalar
    Uint32,
    /// Signed 32-bit scalar
    Int32,
    /// Single-byte boolean
    Bool,
    /// Length-prefixed UTF-8 string
    String,
    /// Length-prefixed byte list
    Bytes,
    /// Enumerated regulatory region
    Region,
    /// Read-plan structure
    Plan,
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Uint32 => "uint32",
            WireType::Int32 => "int32",
            WireType::Bool => "bool",
            WireType::String => "string",
            WireType::Bytes => "bytes",
            WireType::Region => "region",
            WireType::Plan => "readPlan",
        };
        f.write_str(name)
    }
}

/// Regulatory region the radio operates under
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Region {
    Unspecified = 0,
    NorthAmerica = 1,
    Europe = 2,
    Korea = 3,
    India = 4,
    Japan = 5,
    China = 6,
    Australia = 7,
    NewZealand = 8,
}

impl TryFrom<u8> for Region {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Unspecified),
            1 => Ok(Self::NorthAmerica),
            2 => Ok(Self::Europe),
            3 => Ok(Self::Korea),
            4 => Ok(Self::India),
            5 => Ok(Self::Japan),
            6 => Ok(Self::China),
            7 => Ok(Self::Australia),
            8 => Ok(Self::NewZealand),
            other => Err(Error::Parse(format!("unknown region code: {other}"))),
        }
    }
}

/// A parameter value with its runtime type tag
///
/// # Examples
///
/// ```
/// use tmrust_types::{ParamValue, WireType};
///
/// let v = ParamValue::Uint32(115200);
/// assert_eq!(v.wire_type(), WireType::Uint32);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Uint32(u32),
    Int32(i32),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Region(Region),
    Plan(ReadPlan),
}

impl ParamValue {
    /// Runtime type discriminator
    pub fn wire_type(&self) -> WireType {
        match self {
            ParamValue::Uint32(_) => WireType::Uint32,
            ParamValue::Int32(_) => WireType::Int32,
            ParamValue::Bool(_) => WireType::Bool,
            ParamValue::String(_) => WireType::String,
            ParamValue::Bytes(_) => WireType::Bytes,
            ParamValue::Region(_) => WireType::Region,
            ParamValue::Plan(_) => WireType::Plan,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Uint32(v) => write!(f, "{v}"),
            ParamValue::Int32(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::String(v) => write!(f, "{v:?}"),
            ParamValue::Bytes(v) => write!(f, "{v:02X?}"),
            ParamValue::Region(v) => write!(f, "{v:?}"),
            ParamValue::Plan(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_tags() {
        assert_eq!(ParamValue::Uint32(1).wire_type(), WireType::Uint32);
        assert_eq!(ParamValue::Int32(-1).wire_type(), WireType::Int32);
        assert_eq!(ParamValue::Bool(true).wire_type(), WireType::Bool);
        assert_eq!(ParamValue::String("x".into()).wire_type(), WireType::String);
        assert_eq!(ParamValue::Bytes(vec![1]).wire_type(), WireType::Bytes);
        assert_eq!(
            ParamValue::Region(Region::Europe).wire_type(),
            WireType::Region
        );
        assert_eq!(
            ParamValue::Plan(ReadPlan::default()).wire_type(),
            WireType::Plan
        );
    }

    #[test]
    fn test_region_conversion() {
        assert_eq!(Region::try_from(1).unwrap(), Region::NorthAmerica);
        assert_eq!(Region::try_from(5).unwrap(), Region::Japan);
        assert!(Region::try_from(200).is_err());
    }

    #[test]
    fn test_wire_type_display() {
        assert_eq!(WireType::Uint32.to_string(), "uint32");
        assert_eq!(WireType::Plan.to_string(), "readPlan");
    }
}
