//! Tag operations
//!
//! A tag operation targets a single tag, optionally narrowed by a
//! [`TagFilter`]. Every operation shares the same wire shape — filter
//! first, then the operation fields — and every response carries a
//! result byte field, empty for operations that only succeed or fail.
//!
//! Filter masks and write data are bounded fields: an over-length value
//! is refused before anything is sent.

use tmrust_core::{Opcode, WireBuffer, MAX_PAYLOAD_SIZE};
use tmrust_types::{LockAction, MemBank, TagFilter, TagOp, MAX_FILTER_MASK, MAX_TAGOP_DATA};

use crate::error::Result;
use crate::reader::Reader;

fn encode_filter(out: &mut WireBuffer, filter: Option<&TagFilter>) -> tmrust_core::Result<()> {
    match filter {
        None => out.put_u8(0)?,
        Some(f) => {
            out.put_u8(1)?;
            out.put_u8(f.bank as u8)?;
            out.put_u32(f.bit_offset)?;
            out.put_bounded_bytes("filterMask", &f.mask, MAX_FILTER_MASK)?;
            out.put_u8(f.invert as u8)?;
        }
    }
    Ok(())
}

impl Reader {
    /// Execute a tag operation against the first tag matching `filter`
    ///
    /// Returns the operation's result bytes — the memory contents for a
    /// read, empty for write, lock, and kill. A filter matching no tag
    /// is a device error, not an empty result.
    pub fn execute_tag_op(&mut self, op: &TagOp, filter: Option<&TagFilter>) -> Result<Vec<u8>> {
        self.ensure_connected()?;

        let mut out = WireBuffer::new(MAX_PAYLOAD_SIZE);
        encode_filter(&mut out, filter)?;

        let opcode = match op {
            TagOp::Read {
                bank,
                word_address,
                word_count,
            } => {
                out.put_u8(*bank as u8)?;
                out.put_u32(*word_address)?;
                out.put_u8(*word_count)?;
                Opcode::ReadTagData
            }
            TagOp::Write {
                bank,
                word_address,
                data,
            } => {
                out.put_u8(*bank as u8)?;
                out.put_u32(*word_address)?;
                out.put_bounded_bytes("data", data, MAX_TAGOP_DATA)?;
                Opcode::WriteTagData
            }
            TagOp::Lock {
                action,
                access_password,
            } => {
                out.put_u16(action.mask)?;
                out.put_u16(action.action)?;
                out.put_u32(*access_password)?;
                Opcode::LockTag
            }
            TagOp::Kill { kill_password } => {
                out.put_u32(*kill_password)?;
                Opcode::KillTag
            }
        };

        let data = self.invoke(op.name(), None, |r| r.transact(opcode, out.as_slice()))?;
        let mut rd = WireBuffer::from_slice(&data);
        Ok(rd.get_bounded_bytes("result")?)
    }

    /// Read words from a tag memory bank
    pub fn read_tag_mem_bytes(
        &mut self,
        filter: Option<&TagFilter>,
        bank: MemBank,
        word_address: u32,
        word_count: u8,
    ) -> Result<Vec<u8>> {
        self.execute_tag_op(
            &TagOp::Read {
                bank,
                word_address,
                word_count,
            },
            filter,
        )
    }

    /// Write bytes into a tag memory bank
    pub fn write_tag_mem_bytes(
        &mut self,
        filter: Option<&TagFilter>,
        bank: MemBank,
        word_address: u32,
        data: &[u8],
    ) -> Result<()> {
        self.execute_tag_op(
            &TagOp::Write {
                bank,
                word_address,
                data: data.to_vec(),
            },
            filter,
        )?;
        Ok(())
    }

    /// Apply a Gen2 lock action to a tag
    pub fn lock_tag(
        &mut self,
        filter: Option<&TagFilter>,
        action: LockAction,
        access_password: u32,
    ) -> Result<()> {
        self.execute_tag_op(
            &TagOp::Lock {
                action,
                access_password,
            },
            filter,
        )?;
        Ok(())
    }

    /// Permanently kill a tag
    pub fn kill_tag(&mut self, filter: Option<&TagFilter>, kill_password: u32) -> Result<()> {
        self.execute_tag_op(&TagOp::Kill { kill_password }, filter)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tmrust_core::constants::fault;
    use tmrust_core::Category;
    use tmrust_transport::{SimDeviceHandle, SimTag, SimTransport};

    use crate::error::Error;

    fn seeded(tags: Vec<SimTag>) -> (Reader, SimDeviceHandle) {
        let transport = SimTransport::new("test:///dev/tagop");
        let device = transport.device_handle();
        for tag in tags {
            device.add_tag(tag);
        }
        let mut reader = Reader::with_transport("test:///dev/tagop", Box::new(transport));
        reader.connect().unwrap();
        (reader, device)
    }

    #[test]
    fn test_read_tid_bank() {
        let (mut reader, _) = seeded(vec![SimTag::new(vec![0xE2, 0x00, 0x01])]);

        let tid = reader
            .read_tag_mem_bytes(None, MemBank::Tid, 0, 2)
            .unwrap();
        assert_eq!(tid, vec![0xE2, 0x00, 0x34, 0x12]);
    }

    #[test]
    fn test_write_then_read_user_memory() {
        let (mut reader, _) = seeded(vec![SimTag::new(vec![0xE2, 0x00, 0x01])]);

        reader
            .write_tag_mem_bytes(None, MemBank::User, 0, &[0xDE, 0xAD, 0xBE, 0xEF])
            .unwrap();
        let data = reader
            .read_tag_mem_bytes(None, MemBank::User, 0, 2)
            .unwrap();
        assert_eq!(data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_filter_selects_target() {
        let (mut reader, _) = seeded(vec![
            SimTag::new(vec![0xE2, 0x00, 0x01]).with_user_data(vec![0x11; 8]),
            SimTag::new(vec![0xE2, 0x99, 0x02]).with_user_data(vec![0x22; 8]),
        ]);

        let filter = TagFilter::epc_prefix(vec![0xE2, 0x99]);
        let data = reader
            .read_tag_mem_bytes(Some(&filter), MemBank::User, 0, 1)
            .unwrap();
        assert_eq!(data, vec![0x22, 0x22]);
    }

    #[test]
    fn test_no_match_is_device_error() {
        let (mut reader, _) = seeded(vec![SimTag::new(vec![0xE2, 0x00, 0x01])]);

        let filter = TagFilter::epc_prefix(vec![0xAA]);
        let err = reader
            .read_tag_mem_bytes(Some(&filter), MemBank::User, 0, 1)
            .unwrap_err();
        match err {
            Error::Device { category, code, op, .. } => {
                assert_eq!(category, Category::Code);
                assert_eq!(code, fault::NO_TAGS_FOUND as u32);
                assert_eq!(op, "readTagMemBytes");
            }
            other => panic!("expected Device error, got {other:?}"),
        }
    }

    #[test]
    fn test_write_outside_user_bank_faults() {
        let (mut reader, _) = seeded(vec![SimTag::new(vec![0xE2, 0x00, 0x01])]);

        let err = reader
            .write_tag_mem_bytes(None, MemBank::Epc, 0, &[0x00, 0x01])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Device {
                code,
                ..
            } if code == fault::TAG_MEMORY_LOCKED as u32
        ));
    }

    #[test]
    fn test_lock_tag() {
        let (mut reader, _) = seeded(vec![SimTag::new(vec![0xE2, 0x00, 0x01])]);

        let action = LockAction {
            mask: 0x0003,
            action: 0x0002,
        };
        reader.lock_tag(None, action, 0x1234_5678).unwrap();
    }

    #[test]
    fn test_kill_removes_tag_from_field() {
        let (mut reader, device) = seeded(vec![SimTag::new(vec![0xE2, 0x00, 0x01])]);
        assert_eq!(device.field_len(), 1);

        reader.kill_tag(None, 0xDEAD_BEEF).unwrap();
        assert_eq!(device.field_len(), 0);

        // A second kill has nothing left to target
        assert!(reader.kill_tag(None, 0xDEAD_BEEF).is_err());
    }

    #[test]
    fn test_oversized_write_data_refused() {
        let (mut reader, _) = seeded(vec![SimTag::new(vec![0xE2, 0x00, 0x01])]);

        let data = vec![0u8; MAX_TAGOP_DATA + 1];
        let err = reader
            .write_tag_mem_bytes(None, MemBank::User, 0, &data)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(tmrust_core::Error::SizeViolation { field: "data", .. })
        ));
    }

    #[test]
    fn test_oversized_filter_mask_refused() {
        let (mut reader, _) = seeded(vec![SimTag::new(vec![0xE2, 0x00, 0x01])]);

        let filter = TagFilter::epc_prefix(vec![0u8; MAX_FILTER_MASK + 1]);
        let err = reader
            .read_tag_mem_bytes(Some(&filter), MemBank::User, 0, 1)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(tmrust_core::Error::SizeViolation {
                field: "filterMask",
                ..
            })
        ));
    }
}
