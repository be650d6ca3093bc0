//! The packed 32-bit status word
//!
//! Every device command resolves to a status word. The top byte is the
//! category, the low 24 bits are a specific code. Within the Comm
//! category, bit 23 flags "this is a host errno, not a device code"; the
//! remaining low bits then hold the raw errno.
//!
//! Decoding is pure and total: every 32-bit value maps to *some*
//! category/code pair. Unknown categories degrade to
//! [`Category::Unknown`], never an error — downstream code must be able
//! to classify whatever a future firmware sends back.

use std::fmt;

use crate::constants::fault;

/// Status category (top byte of the word)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Command completed; no further decoding needed
    Success,
    /// Transport-level failure (may carry a host errno)
    Comm,
    /// Device protocol fault (module status code)
    Code,
    /// Binding-local misuse detected before dispatch
    Binding,
    /// Category byte this binding does not know
    Unknown(u8),
}

impl Category {
    const SUCCESS: u8 = 0x00;
    const COMM: u8 = 0x01;
    const CODE: u8 = 0x02;
    const BINDING: u8 = 0x03;

    fn from_byte(byte: u8) -> Self {
        match byte {
            Self::SUCCESS => Category::Success,
            Self::COMM => Category::Comm,
            Self::CODE => Category::Code,
            Self::BINDING => Category::Binding,
            other => Category::Unknown(other),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Success => f.write_str("success"),
            Category::Comm => f.write_str("comm"),
            Category::Code => f.write_str("code"),
            Category::Binding => f.write_str("binding"),
            Category::Unknown(byte) => write!(f, "unknown(0x{byte:02X})"),
        }
    }
}

/// Packed status word
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StatusWord(u32);

/// Comm-category codes not carrying an errno
pub mod comm {
    /// Receive timed out
    pub const TIMEOUT: u32 = 0x000001;
    /// Connection closed by the remote end
    pub const CLOSED: u32 = 0x000002;
    /// Transport was never opened or already shut down
    pub const NOT_OPEN: u32 = 0x000003;
    /// Response frame failed validation
    pub const BAD_FRAME: u32 = 0x000004;
    /// Device address could not be resolved
    pub const BAD_ADDRESS: u32 = 0x000005;
    /// Host I/O failure with no errno available
    pub const IO: u32 = 0x000006;
}

impl StatusWord {
    const CATEGORY_SHIFT: u32 = 24;
    const CODE_MASK: u32 = 0x00FF_FFFF;
    const ERRNO_FLAG: u32 = 0x0080_0000;
    const ERRNO_MASK: u32 = 0x007F_FFFF;

    /// Success word (all zero)
    pub const fn success() -> Self {
        Self(0)
    }

    /// Wrap a raw 32-bit word
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Comm-category word carrying a host errno
    pub fn comm_errno(errno: i32) -> Self {
        let errno = (errno as u32) & Self::ERRNO_MASK;
        Self(((Category::COMM as u32) << Self::CATEGORY_SHIFT) | Self::ERRNO_FLAG | errno)
    }

    /// Comm-category word with a transport code (no errno)
    pub const fn comm(code: u32) -> Self {
        Self(((Category::COMM as u32) << Self::CATEGORY_SHIFT) | (code & Self::ERRNO_MASK))
    }

    /// Code-category word from a 16-bit module status
    pub const fn device_fault(module_status: u16) -> Self {
        Self(((Category::CODE as u32) << Self::CATEGORY_SHIFT) | module_status as u32)
    }

    /// Binding-category word for misuse detected before dispatch
    pub const fn binding(code: u32) -> Self {
        Self(((Category::BINDING as u32) << Self::CATEGORY_SHIFT) | (code & Self::CODE_MASK))
    }

    /// Map a module status from a response payload onto a status word
    pub const fn from_module_status(module_status: u16) -> Self {
        if module_status == fault::OK {
            Self::success()
        } else {
            Self::device_fault(module_status)
        }
    }

    /// Raw 32-bit value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Decode into (category, code). Total over all 32-bit inputs.
    pub fn decode(self) -> (Category, u32) {
        let category = Category::from_byte((self.0 >> Self::CATEGORY_SHIFT) as u8);
        (category, self.0 & Self::CODE_MASK)
    }

    /// Category alone
    pub fn category(self) -> Category {
        self.decode().0
    }

    /// Specific code (low 24 bits)
    pub fn code(self) -> u32 {
        self.0 & Self::CODE_MASK
    }

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    /// True only for a Comm-category word with the errno flag set
    pub fn is_errno(self) -> bool {
        self.category() == Category::Comm && self.0 & Self::ERRNO_FLAG != 0
    }

    /// Host errno, if this word carries one
    pub fn errno(self) -> Option<i32> {
        if self.is_errno() {
            Some((self.0 & Self::ERRNO_MASK) as i32)
        } else {
            None
        }
    }

    /// Human-readable description of the status
    ///
    /// Known codes get stable messages; unknown codes degrade to a
    /// generic description, never a failure.
    pub fn describe(self) -> String {
        match self.decode() {
            (Category::Success, _) => "success".to_string(),
            (Category::Comm, _) if self.is_errno() => {
                format!("host I/O error (errno {})", (self.0 & Self::ERRNO_MASK) as i32)
            }
            (Category::Comm, code) => match code {
                comm::TIMEOUT => "transport timeout".to_string(),
                comm::CLOSED => "connection closed by device".to_string(),
                comm::NOT_OPEN => "transport not open".to_string(),
                comm::BAD_FRAME => "malformed response frame".to_string(),
                comm::BAD_ADDRESS => "device address could not be resolved".to_string(),
                comm::IO => "host I/O error".to_string(),
                other => format!("transport error 0x{other:06X}"),
            },
            (Category::Code, code) => match code as u16 {
                fault::WRONG_DATA_LENGTH => "wrong data length in command".to_string(),
                fault::INVALID_OPCODE => "invalid opcode".to_string(),
                fault::UNIMPLEMENTED_OPCODE => "opcode not implemented by firmware".to_string(),
                fault::INVALID_PARAMETER => "invalid parameter identifier".to_string(),
                fault::UNSUPPORTED_PARAMETER => "parameter not supported by device".to_string(),
                fault::NO_TAGS_FOUND => "no tags found".to_string(),
                fault::TAG_OPERATION_FAILED => "tag operation failed".to_string(),
                fault::GEN2_PROTOCOL_ERROR => "GEN2 protocol error".to_string(),
                fault::TAG_MEMORY_LOCKED => "tag memory locked".to_string(),
                other => format!("device fault 0x{other:04X}"),
            },
            (Category::Binding, code) => format!("binding error 0x{code:06X}"),
            (Category::Unknown(byte), code) => {
                format!("unknown status (category 0x{byte:02X}, code 0x{code:06X})")
            }
        }
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (category, code) = self.decode();
        write!(f, "{category}:0x{code:06X}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_success() {
        let status = StatusWord::success();
        assert!(status.is_success());
        assert_eq!(status.category(), Category::Success);
        assert_eq!(status.errno(), None);
    }

    #[test]
    fn test_errno_roundtrip() {
        let status = StatusWord::comm_errno(110); // ETIMEDOUT
        assert!(!status.is_success());
        assert_eq!(status.category(), Category::Comm);
        assert!(status.is_errno());
        assert_eq!(status.errno(), Some(110));
    }

    #[test]
    fn test_comm_without_errno() {
        let status = StatusWord::comm(comm::TIMEOUT);
        assert_eq!(status.category(), Category::Comm);
        assert!(!status.is_errno());
        assert_eq!(status.errno(), None);
        assert_eq!(status.describe(), "transport timeout");
    }

    #[test]
    fn test_device_fault() {
        let status = StatusWord::from_module_status(fault::NO_TAGS_FOUND);
        assert_eq!(status.category(), Category::Code);
        assert_eq!(status.code(), fault::NO_TAGS_FOUND as u32);
        assert_eq!(status.describe(), "no tags found");
    }

    #[test]
    fn test_module_ok_is_success() {
        assert!(StatusWord::from_module_status(fault::OK).is_success());
    }

    #[test]
    fn test_binding_word() {
        let status = StatusWord::binding(0x000001);
        assert_eq!(status.category(), Category::Binding);
        assert_eq!(status.code(), 1);
        assert!(!status.is_errno());
    }

    #[test]
    fn test_unknown_category_degrades() {
        let status = StatusWord::from_raw(0xA7_00_00_01);
        assert_eq!(status.category(), Category::Unknown(0xA7));
        assert!(status.describe().contains("unknown status"));
    }

    #[test]
    fn test_errno_flag_only_in_comm() {
        // Code category with bit 23 set must not read as an errno
        let status = StatusWord::from_raw(0x02_80_00_05);
        assert!(!status.is_errno());
        assert_eq!(status.errno(), None);
    }

    proptest! {
        #[test]
        fn prop_decode_is_total(raw in any::<u32>()) {
            let status = StatusWord::from_raw(raw);
            let (_category, code) = status.decode();
            prop_assert!(code <= 0x00FF_FFFF);
            // describe never panics either
            let _ = status.describe();
        }

        #[test]
        fn prop_errno_roundtrip(errno in 0i32..0x0040_0000) {
            let status = StatusWord::comm_errno(errno);
            prop_assert_eq!(status.errno(), Some(errno));
        }
    }
}
