//! Frame CRC algorithm
//!
//! Frames carry a CRC-16/CCITT-FALSE (polynomial 0x1021, initial value
//! 0xFFFF, no reflection, no final XOR) computed over the length byte, the
//! opcode byte, and the payload. The SOH byte is not covered.

/// Calculate the frame CRC
///
/// # Examples
///
/// ```
/// use tmrust_core::crc;
///
/// let crc = crc::calculate(0x03, &[]);
/// println!("CRC: 0x{:04X}", crc);
/// ```
pub fn calculate(opcode: u8, payload: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;

    let mut update = |byte: u8| {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    };

    update(payload.len() as u8);
    update(opcode);
    for &byte in payload {
        update(byte);
    }

    crc
}

/// Verify a received CRC
pub fn verify(opcode: u8, payload: &[u8], expected: u16) -> bool {
    calculate(opcode, payload) == expected
}
