//! Simulated reader
//!
//! [`SimTransport`] satisfies the [`Transport`] trait without hardware by
//! running a [`SimDevice`] in-process: `send` parses the request frame and
//! computes the response synchronously on the calling thread, `receive`
//! hands that response back. Because the device logic runs inside `send`,
//! transport listeners observing a simulated reader are invoked
//! re-entrantly with respect to the dispatching call — the same hazard a
//! loopback serial driver has.
//!
//! The device model is deliberately small: an echoing parameter store, a
//! field of seedable tags, and a tag buffer filled by each search. Tag
//! filters are honored as EPC-prefix matches; offset/invert subtleties of
//! real silicon are out of scope.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::BytesMut;
use parking_lot::Mutex;
use tracing::{debug, trace};

use tmrust_core::{
    constants::{fault, tag_buffer},
    Frame, Opcode, WireBuffer, MAX_PAYLOAD_SIZE,
};
use tmrust_types::{MemBank, Param, TagProtocol};

use crate::{error::*, Transport};

/// Simulated firmware version string
pub const SIM_FIRMWARE: &str = "SIM-1.0.3";

/// One tag sitting in the simulated reader's field
#[derive(Debug, Clone)]
pub struct SimTag {
    pub epc: Vec<u8>,
    pub antenna: u8,
    pub rssi: i8,
    pub tid: Vec<u8>,
    pub user_data: Vec<u8>,
}

impl SimTag {
    /// Tag with the given EPC on antenna 1
    pub fn new(epc: Vec<u8>) -> Self {
        Self {
            epc,
            antenna: 1,
            rssi: -45,
            tid: vec![0xE2, 0x00, 0x34, 0x12],
            user_data: vec![0u8; 16],
        }
    }

    pub fn with_antenna(mut self, antenna: u8) -> Self {
        self.antenna = antenna;
        self
    }

    pub fn with_rssi(mut self, rssi: i8) -> Self {
        self.rssi = rssi;
        self
    }

    pub fn with_user_data(mut self, data: Vec<u8>) -> Self {
        self.user_data = data;
        self
    }

    fn bank(&self, bank: MemBank) -> &[u8] {
        match bank {
            MemBank::Reserved => &[0u8; 8],
            MemBank::Epc => &self.epc,
            MemBank::Tid => &self.tid,
            MemBank::User => &self.user_data,
        }
    }

    fn matches(&self, filter: &Option<SimFilter>) -> bool {
        match filter {
            None => true,
            Some(f) => {
                let matched = match f.bank {
                    // Byte-aligned EPC-prefix comparison
                    MemBank::Epc => self.epc.starts_with(&f.mask),
                    other => self.bank(other).starts_with(&f.mask),
                };
                matched != f.invert
            }
        }
    }
}

#[derive(Debug, Clone)]
struct SimFilter {
    bank: MemBank,
    #[allow(dead_code)]
    bit_offset: u32,
    mask: Vec<u8>,
    invert: bool,
}

/// Buffered tag observation awaiting fetch
#[derive(Debug, Clone)]
struct BufferedRead {
    tag: SimTag,
    read_count: u32,
    timestamp_ms: u64,
}

/// In-process device model behind a [`SimTransport`]
#[derive(Debug)]
pub struct SimDevice {
    params: HashMap<u16, Vec<u8>>,
    field: Vec<SimTag>,
    buffer: VecDeque<BufferedRead>,
}

impl SimDevice {
    fn new(uri: &str) -> Self {
        let mut device = Self {
            params: HashMap::new(),
            field: Vec::new(),
            buffer: VecDeque::new(),
        };
        device.seed_defaults(uri);
        device
    }

    fn seed_defaults(&mut self, uri: &str) {
        self.seed_u32(Param::BaudRate, 115_200);
        self.seed_u32(Param::CommandTimeout, 1000);
        self.seed_u32(Param::TransportTimeout, 5000);
        self.seed_u8(Param::RegionId, 1); // NorthAmerica
        self.seed_str(Param::Uri, uri);
        self.seed_str(Param::VersionHardware, "SIM-HW-A");
        self.seed_str(Param::VersionSoftware, SIM_FIRMWARE);
        self.seed_str(Param::VersionModel, "SimReader");
        self.seed_str(Param::VersionSerial, "00000000");
    }

    fn seed_u32(&mut self, param: Param, value: u32) {
        self.params.insert(param.id(), value.to_be_bytes().to_vec());
    }

    fn seed_u8(&mut self, param: Param, value: u8) {
        self.params.insert(param.id(), vec![value]);
    }

    fn seed_str(&mut self, param: Param, value: &str) {
        let mut bytes = vec![value.len() as u8];
        bytes.extend_from_slice(value.as_bytes());
        self.params.insert(param.id(), bytes);
    }

    /// Place a tag in the field; the next search will see it
    pub fn add_tag(&mut self, tag: SimTag) {
        self.field.push(tag);
    }

    /// Tags currently in the field
    pub fn field_len(&self) -> usize {
        self.field.len()
    }

    /// Raw encoded bytes stored for a parameter id
    pub fn raw_param(&self, id: u16) -> Option<&[u8]> {
        self.params.get(&id).map(Vec::as_slice)
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Answer one request frame
    fn handle(&mut self, request: &Frame) -> Frame {
        trace!(request = %request, "sim device handling");
        match self.try_handle(request) {
            Ok(frame) => frame,
            // Malformed payload: a real module answers with a fault status
            Err(_) => fault_frame(request.opcode, fault::WRONG_DATA_LENGTH),
        }
    }

    fn try_handle(&mut self, request: &Frame) -> tmrust_core::Result<Frame> {
        let mut rd = WireBuffer::from_slice(&request.payload);

        let frame = match request.opcode {
            Opcode::Version => {
                let mut out = ok_payload()?;
                out.put_bounded_str("version", SIM_FIRMWARE, 32)?;
                data_frame(Opcode::Version, out)
            }

            Opcode::SetParam => {
                let id = rd.get_u16()?;
                let mut value = Vec::with_capacity(rd.remaining());
                while rd.remaining() > 0 {
                    value.push(rd.get_u8()?);
                }
                self.params.insert(id, value);
                fault_frame(Opcode::SetParam, fault::OK)
            }

            Opcode::GetParam => {
                let id = rd.get_u16()?;
                match self.params.get(&id) {
                    Some(value) => {
                        let mut out = ok_payload()?;
                        for &byte in value {
                            out.put_u8(byte)?;
                        }
                        data_frame(Opcode::GetParam, out)
                    }
                    None => fault_frame(Opcode::GetParam, fault::INVALID_PARAMETER),
                }
            }

            Opcode::SearchTags => {
                let _timeout_ms = rd.get_u32()?;
                let timestamp_ms = Self::now_ms();
                self.buffer.clear();
                for tag in &self.field {
                    self.buffer.push_back(BufferedRead {
                        tag: tag.clone(),
                        read_count: 1,
                        timestamp_ms,
                    });
                }
                let mut out = ok_payload()?;
                out.put_u32(self.buffer.len() as u32)?;
                data_frame(Opcode::SearchTags, out)
            }

            Opcode::TagBuffer => match rd.get_u8()? {
                tag_buffer::REMAINING => {
                    if self.buffer.is_empty() {
                        fault_frame(Opcode::TagBuffer, fault::NO_TAGS_FOUND)
                    } else {
                        let mut out = ok_payload()?;
                        out.put_u32(self.buffer.len() as u32)?;
                        data_frame(Opcode::TagBuffer, out)
                    }
                }
                tag_buffer::FETCH => match self.buffer.pop_front() {
                    Some(read) => {
                        let mut out = ok_payload()?;
                        encode_record(&mut out, &read)?;
                        data_frame(Opcode::TagBuffer, out)
                    }
                    None => fault_frame(Opcode::TagBuffer, fault::NO_TAGS_FOUND),
                },
                _ => fault_frame(Opcode::TagBuffer, fault::WRONG_DATA_LENGTH),
            },

            Opcode::ClearTagBuffer => {
                self.buffer.clear();
                fault_frame(Opcode::ClearTagBuffer, fault::OK)
            }

            Opcode::ReadTagData => {
                let filter = decode_filter(&mut rd)?;
                let bank = MemBank::try_from(rd.get_u8()?)
                    .map_err(|_| malformed("bank"))?;
                let word_address = rd.get_u32()? as usize;
                let word_count = rd.get_u8()? as usize;

                match self.field.iter().find(|t| t.matches(&filter)) {
                    Some(tag) => {
                        let memory = tag.bank(bank);
                        let start = word_address * 2;
                        let end = start + word_count * 2;
                        if end > memory.len() {
                            fault_frame(Opcode::ReadTagData, fault::TAG_OPERATION_FAILED)
                        } else {
                            let mut out = ok_payload()?;
                            out.put_bounded_bytes("result", &memory[start..end], 128)?;
                            data_frame(Opcode::ReadTagData, out)
                        }
                    }
                    None => fault_frame(Opcode::ReadTagData, fault::NO_TAGS_FOUND),
                }
            }

            Opcode::WriteTagData => {
                let filter = decode_filter(&mut rd)?;
                let bank = MemBank::try_from(rd.get_u8()?)
                    .map_err(|_| malformed("bank"))?;
                let word_address = rd.get_u32()? as usize;
                let data = rd.get_bounded_bytes("data")?;

                match self.field.iter_mut().find(|t| t.matches(&filter)) {
                    Some(tag) => {
                        if bank != MemBank::User {
                            return Ok(fault_frame(
                                Opcode::WriteTagData,
                                fault::TAG_MEMORY_LOCKED,
                            ));
                        }
                        let start = word_address * 2;
                        let end = start + data.len();
                        if end > tag.user_data.len() {
                            tag.user_data.resize(end, 0);
                        }
                        tag.user_data[start..end].copy_from_slice(&data);
                        let mut out = ok_payload()?;
                        out.put_bounded_bytes("result", &[], 128)?;
                        data_frame(Opcode::WriteTagData, out)
                    }
                    None => fault_frame(Opcode::WriteTagData, fault::NO_TAGS_FOUND),
                }
            }

            Opcode::LockTag => {
                let filter = decode_filter(&mut rd)?;
                let _mask = rd.get_u16()?;
                let _action = rd.get_u16()?;
                let _access_password = rd.get_u32()?;

                if self.field.iter().any(|t| t.matches(&filter)) {
                    let mut out = ok_payload()?;
                    out.put_bounded_bytes("result", &[], 128)?;
                    data_frame(Opcode::LockTag, out)
                } else {
                    fault_frame(Opcode::LockTag, fault::NO_TAGS_FOUND)
                }
            }

            Opcode::KillTag => {
                let filter = decode_filter(&mut rd)?;
                let _kill_password = rd.get_u32()?;

                let before = self.field.len();
                if let Some(pos) = self.field.iter().position(|t| t.matches(&filter)) {
                    self.field.remove(pos);
                }
                if self.field.len() < before {
                    let mut out = ok_payload()?;
                    out.put_bounded_bytes("result", &[], 128)?;
                    data_frame(Opcode::KillTag, out)
                } else {
                    fault_frame(Opcode::KillTag, fault::NO_TAGS_FOUND)
                }
            }

            Opcode::Shutdown => fault_frame(Opcode::Shutdown, fault::OK),
        };

        Ok(frame)
    }
}

fn malformed(field: &'static str) -> tmrust_core::Error {
    tmrust_core::Error::Malformed {
        field,
        reason: "invalid enumerated value".to_string(),
    }
}

fn ok_payload() -> tmrust_core::Result<WireBuffer> {
    let mut out = WireBuffer::new(MAX_PAYLOAD_SIZE);
    out.put_u16(fault::OK)?;
    Ok(out)
}

fn data_frame(opcode: Opcode, payload: WireBuffer) -> Frame {
    Frame::with_payload(opcode, payload.as_slice().to_vec())
}

fn fault_frame(opcode: Opcode, status: u16) -> Frame {
    Frame::with_payload(opcode, status.to_be_bytes().to_vec())
}

fn decode_filter(rd: &mut WireBuffer) -> tmrust_core::Result<Option<SimFilter>> {
    if rd.get_u8()? == 0 {
        return Ok(None);
    }
    let bank = MemBank::try_from(rd.get_u8()?).map_err(|_| malformed("filter"))?;
    let bit_offset = rd.get_u32()?;
    let mask = rd.get_bounded_bytes("mask")?;
    let invert = rd.get_u8()? != 0;
    Ok(Some(SimFilter {
        bank,
        bit_offset,
        mask,
        invert,
    }))
}

fn encode_record(out: &mut WireBuffer, read: &BufferedRead) -> tmrust_core::Result<()> {
    out.put_bounded_bytes("epc", &read.tag.epc, 62)?;
    out.put_u8(read.tag.antenna)?;
    out.put_i8(read.tag.rssi)?;
    out.put_u32(read.read_count)?;
    out.put_u64(read.timestamp_ms)?;
    out.put_u8(TagProtocol::Gen2 as u8)?;
    out.put_u16(0)?; // phase
    out.put_u32(915_250)?; // kHz
    out.put_u8(0)?; // no embedded data
    Ok(())
}

/// Shared handle for seeding and inspecting a [`SimDevice`] while the
/// transport that owns it is inside a reader
#[derive(Clone)]
pub struct SimDeviceHandle(Arc<Mutex<SimDevice>>);

impl SimDeviceHandle {
    /// Place a tag in the simulated field
    pub fn add_tag(&self, tag: SimTag) {
        self.0.lock().add_tag(tag);
    }

    /// Number of tags currently in the field
    pub fn field_len(&self) -> usize {
        self.0.lock().field_len()
    }

    /// Raw encoded bytes stored for a parameter id
    pub fn raw_param(&self, id: u16) -> Option<Vec<u8>> {
        self.0.lock().raw_param(id).map(<[u8]>::to_vec)
    }
}

/// Transport backed by an in-process [`SimDevice`]
pub struct SimTransport {
    device: Arc<Mutex<SimDevice>>,
    uri: String,
    open: bool,
    pending: Option<BytesMut>,
}

impl SimTransport {
    /// Create a simulated reader for the given URI
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            device: Arc::new(Mutex::new(SimDevice::new(&uri))),
            uri,
            open: false,
            pending: None,
        }
    }

    /// Handle for seeding tags and inspecting device state
    pub fn device_handle(&self) -> SimDeviceHandle {
        SimDeviceHandle(Arc::clone(&self.device))
    }
}

impl Transport for SimTransport {
    fn open(&mut self) -> Result<()> {
        if self.open {
            return Err(Error::AlreadyOpen);
        }
        debug!("Opening simulated reader {}", self.uri);
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        self.pending = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(Error::NotOpen);
        }

        // Device logic runs synchronously here, on the caller's thread
        match Frame::decode(BytesMut::from(data)) {
            Ok(request) => {
                let response = self.device.lock().handle(&request);
                match response.encode() {
                    Ok(bytes) => self.pending = Some(bytes),
                    Err(_) => self.pending = None,
                }
            }
            // Garbage on the wire: a real module stays silent
            Err(_) => self.pending = None,
        }

        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> Result<BytesMut> {
        if !self.open {
            return Err(Error::NotOpen);
        }
        self.pending.take().ok_or(Error::ReadTimeout)
    }

    fn remote_addr(&self) -> String {
        self.uri.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn open_sim() -> SimTransport {
        let mut transport = SimTransport::new("test:///dev/sim");
        transport.open().unwrap();
        transport
    }

    fn exchange(transport: &mut SimTransport, frame: Frame) -> Frame {
        transport.send(&frame.encode().unwrap()).unwrap();
        let response = transport.receive(Duration::from_millis(10)).unwrap();
        Frame::decode(response).unwrap()
    }

    fn status_of(frame: &Frame) -> u16 {
        u16::from_be_bytes([frame.payload[0], frame.payload[1]])
    }

    #[test]
    fn test_version_exchange() {
        let mut transport = open_sim();
        let response = exchange(&mut transport, Frame::new(Opcode::Version));
        assert_eq!(response.opcode, Opcode::Version);
        assert_eq!(status_of(&response), fault::OK);
    }

    #[test]
    fn test_set_get_echo() {
        let mut transport = open_sim();

        let mut payload = WireBuffer::new(16);
        payload.put_u16(Param::BaudRate.id()).unwrap();
        payload.put_u32(921_600).unwrap();
        let response = exchange(
            &mut transport,
            Frame::with_payload(Opcode::SetParam, payload.as_slice().to_vec()),
        );
        assert_eq!(status_of(&response), fault::OK);

        let mut payload = WireBuffer::new(16);
        payload.put_u16(Param::BaudRate.id()).unwrap();
        let response = exchange(
            &mut transport,
            Frame::with_payload(Opcode::GetParam, payload.as_slice().to_vec()),
        );
        assert_eq!(status_of(&response), fault::OK);
        assert_eq!(&response.payload[2..], &921_600u32.to_be_bytes()[..]);
    }

    #[test]
    fn test_unknown_param_faults() {
        let mut transport = open_sim();
        let mut payload = WireBuffer::new(16);
        payload.put_u16(0xBEEF).unwrap();
        let response = exchange(
            &mut transport,
            Frame::with_payload(Opcode::GetParam, payload.as_slice().to_vec()),
        );
        assert_eq!(status_of(&response), fault::INVALID_PARAMETER);
    }

    #[test]
    fn test_search_and_drain_buffer() {
        let mut transport = open_sim();
        transport
            .device_handle()
            .add_tag(SimTag::new(vec![0xE2, 0x00, 0x01]));

        let mut payload = WireBuffer::new(8);
        payload.put_u32(250).unwrap();
        let response = exchange(
            &mut transport,
            Frame::with_payload(Opcode::SearchTags, payload.as_slice().to_vec()),
        );
        assert_eq!(status_of(&response), fault::OK);
        assert_eq!(&response.payload[2..6], &1u32.to_be_bytes()[..]);

        // Fetch the one record, then the buffer reports empty
        let response = exchange(
            &mut transport,
            Frame::with_payload(Opcode::TagBuffer, vec![tag_buffer::FETCH]),
        );
        assert_eq!(status_of(&response), fault::OK);

        let response = exchange(
            &mut transport,
            Frame::with_payload(Opcode::TagBuffer, vec![tag_buffer::REMAINING]),
        );
        assert_eq!(status_of(&response), fault::NO_TAGS_FOUND);
    }

    #[test]
    fn test_garbage_gets_no_answer() {
        let mut transport = open_sim();
        transport.send(&[0x00, 0x01, 0x02]).unwrap();
        assert!(matches!(
            transport.receive(Duration::from_millis(10)),
            Err(Error::ReadTimeout)
        ));
    }

    #[test]
    fn test_not_open() {
        let mut transport = SimTransport::new("test:///dev/sim");
        assert!(matches!(transport.send(&[0xFF]), Err(Error::NotOpen)));
    }
}
