//! Type definitions for tmrust

pub mod error;
pub mod param;
pub mod plan;
pub mod tag;
pub mod value;

pub use error::{Error, Result};
pub use param::Param;
pub use plan::{ReadPlan, TagProtocol, MAX_ANTENNAS, MAX_GPI_PINS};
pub use tag::{
    LockAction, MemBank, TagFilter, TagOp, TagReadRecord, MAX_EPC_BYTES, MAX_FILTER_MASK,
    MAX_TAGOP_DATA,
};
pub use value::{ParamValue, Region, WireType};
