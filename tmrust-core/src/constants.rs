//! Protocol constants

/// Default command timeout (milliseconds)
pub const DEFAULT_COMMAND_TIMEOUT_MS: u32 = 1000;

/// Default transport timeout (milliseconds)
pub const DEFAULT_TRANSPORT_TIMEOUT_MS: u32 = 5000;

/// 16-bit module status codes carried in response payloads
pub mod fault {
    /// Command completed
    pub const OK: u16 = 0x0000;

    /// Payload length does not match the opcode's expectation
    pub const WRONG_DATA_LENGTH: u16 = 0x0100;

    /// Opcode not recognized by the module
    pub const INVALID_OPCODE: u16 = 0x0101;

    /// Opcode recognized but not implemented on this firmware
    pub const UNIMPLEMENTED_OPCODE: u16 = 0x0102;

    /// Parameter identifier not recognized
    pub const INVALID_PARAMETER: u16 = 0x0105;

    /// Parameter recognized but not supported on this device
    pub const UNSUPPORTED_PARAMETER: u16 = 0x010A;

    /// No tags in the buffer / no tag found during the timeout
    pub const NO_TAGS_FOUND: u16 = 0x0400;

    /// Tag answered but the operation failed
    pub const TAG_OPERATION_FAILED: u16 = 0x0402;

    /// GEN2 air-protocol error reported by the tag
    pub const GEN2_PROTOCOL_ERROR: u16 = 0x0423;

    /// Tag memory is locked against the attempted access
    pub const TAG_MEMORY_LOCKED: u16 = 0x0426;
}

/// Tag-buffer subcommands (first payload byte of OP_TAG_BUFFER)
pub mod tag_buffer {
    /// Query how many records remain buffered
    pub const REMAINING: u8 = 0x00;

    /// Fetch the next buffered record
    pub const FETCH: u8 = 0x01;
}
