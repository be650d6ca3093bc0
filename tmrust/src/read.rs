//! Timed tag search and buffer drain
//!
//! A read is two protocol phases: a timed search that fills the device's
//! tag buffer and reports how many records landed there, then a fetch
//! loop draining one record per exchange until the device says the buffer
//! is empty. The reported count is advisory only — the drain trusts the
//! device's empty signal, not the number.
//!
//! "No tags found" is a normal outcome of a read, not an error, even
//! though the device signals it with a fault status.

use std::time::Duration;

use tracing::debug;

use tmrust_core::{
    constants::{fault, tag_buffer},
    Category, Opcode, StatusWord, WireBuffer,
};
use tmrust_types::{MemBank, TagProtocol, TagReadRecord, MAX_EPC_BYTES};

use crate::error::Result;
use crate::reader::Reader;

fn is_no_tags(status: StatusWord) -> bool {
    status.category() == Category::Code && status.code() == fault::NO_TAGS_FOUND as u32
}

impl Reader {
    /// Search for tags for `timeout_ms`, then drain the device buffer
    ///
    /// Blocks until the search window elapses and every buffered record
    /// has been fetched. An empty field yields `Ok(vec![])`.
    pub fn read(&mut self, timeout_ms: u32) -> Result<Vec<TagReadRecord>> {
        self.ensure_connected()?;

        let mut out = WireBuffer::new(8);
        out.put_u32(timeout_ms)?;

        // The device holds the response until its search window closes,
        // so the blocking receive must outlast timeout_ms.
        let deadline = self.transport_timeout + Duration::from_millis(timeout_ms as u64);
        let (status, data) =
            self.transact_with_timeout(Opcode::SearchTags, out.as_slice(), deadline)?;
        if is_no_tags(status) {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(self.classify(status, "read", None));
        }

        let mut rd = WireBuffer::from_slice(&data);
        let reported = rd.get_u32()?;
        debug!(reported, timeout_ms, "search complete");

        // The remaining-count query is the loop bound; the search's
        // reported count is advisory and only logged.
        let mut records = Vec::new();
        loop {
            let (status, data) = self.transact(Opcode::TagBuffer, &[tag_buffer::REMAINING])?;
            if is_no_tags(status) {
                break;
            }
            if !status.is_success() {
                return Err(self.classify(status, "read", None));
            }
            let mut rd = WireBuffer::from_slice(&data);
            if rd.get_u32()? == 0 {
                break;
            }

            let (status, data) = self.transact(Opcode::TagBuffer, &[tag_buffer::FETCH])?;
            if is_no_tags(status) {
                break;
            }
            if !status.is_success() {
                return Err(self.classify(status, "read", None));
            }
            // Fresh cursor per record; nothing carries over between fetches
            let mut rd = WireBuffer::from_slice(&data);
            records.push(decode_record(&mut rd)?);
        }

        if reported as usize != records.len() {
            debug!(reported, fetched = records.len(), "device count was stale");
        }

        Ok(records)
    }

    /// Number of records still buffered on the device
    pub fn buffered_tag_count(&mut self) -> Result<u32> {
        self.ensure_connected()?;

        let (status, data) = self.transact(Opcode::TagBuffer, &[tag_buffer::REMAINING])?;
        if is_no_tags(status) {
            return Ok(0);
        }
        if !status.is_success() {
            return Err(self.classify(status, "read", None));
        }
        let mut rd = WireBuffer::from_slice(&data);
        Ok(rd.get_u32()?)
    }
}

fn decode_record(rd: &mut WireBuffer) -> Result<TagReadRecord> {
    let epc = rd.get_bounded_bytes("epc")?;
    if epc.len() > MAX_EPC_BYTES {
        return Err(tmrust_core::Error::SizeViolation {
            field: "epc",
            len: epc.len(),
            max: MAX_EPC_BYTES,
        }
        .into());
    }
    let antenna = rd.get_u8()?;
    let rssi = rd.get_i8()?;
    let read_count = rd.get_u32()?;
    let timestamp_ms = rd.get_u64()?;
    let protocol = TagProtocol::try_from(rd.get_u8()?)?;
    let phase = rd.get_u16()?;
    let frequency_khz = rd.get_u32()?;

    let embedded_count = rd.get_u8()? as usize;
    let mut embedded_data = Vec::with_capacity(embedded_count);
    for _ in 0..embedded_count {
        let bank = MemBank::try_from(rd.get_u8()?)?;
        let data = rd.get_bounded_bytes("embeddedData")?;
        embedded_data.push((bank, data));
    }

    Ok(TagReadRecord {
        epc,
        antenna,
        rssi,
        read_count,
        timestamp_ms,
        protocol,
        phase,
        frequency_khz,
        embedded_data,
    })
}
