//! Typed parameter access
//!
//! `set_param`/`get_param` marshal [`ParamValue`]s against the catalog's
//! declared wire types. Both checks happen before any bytes move: a
//! cataloged-but-unimplemented parameter fails with `Unimplemented`, and
//! a value whose runtime tag disagrees with the declared type fails with
//! `TypeMismatch`. Bounded fields (strings, byte lists, plan antenna and
//! GPI lists) are refused when over-length, never truncated.
//!
//! Parameters may be set before `connect`: the value is validated and
//! held on the handle, then replayed to the device when the connection
//! comes up. Timeouts additionally take effect on the handle right away.

use tmrust_core::{Opcode, WireBuffer, MAX_PAYLOAD_SIZE};
use tmrust_types::{
    Param, ParamValue, ReadPlan, Region, TagProtocol, WireType, MAX_ANTENNAS, MAX_GPI_PINS,
};

use crate::error::{Error, Result};
use crate::reader::{Reader, ReaderState};

/// Longest string value a parameter may carry
pub const MAX_PARAM_STRING: usize = 32;

/// Longest byte-list value a parameter may carry
pub const MAX_PARAM_BYTES: usize = 64;

impl Reader {
    /// Set a reader parameter
    ///
    /// The value's runtime type must match the catalog's declared type
    /// for `param`; nothing is sent otherwise. On an unconnected handle
    /// the validated value is held and replayed at connect.
    pub fn set_param(&mut self, param: Param, value: &ParamValue) -> Result<()> {
        self.ensure_alive()?;
        let expected = param.wire_type().ok_or(Error::Unimplemented(param))?;
        if value.wire_type() != expected {
            return Err(Error::TypeMismatch {
                param,
                expected,
                actual: value.wire_type(),
            });
        }

        // Encode up front so size violations surface even before connect
        let mut out = WireBuffer::new(MAX_PAYLOAD_SIZE);
        out.put_u16(param.id())?;
        encode_value(&mut out, param, value)?;

        if self.state() == ReaderState::Connected {
            self.invoke("paramSet", Some(param.name()), |r| {
                r.transact(Opcode::SetParam, out.as_slice())
            })?;
        } else {
            self.stash_pending(param, value.clone());
        }

        // Timeouts also steer the handle's own blocking receive
        if let ParamValue::Uint32(ms) = value {
            self.apply_timeout_side_effects(param, *ms);
        }

        Ok(())
    }

    /// Get a reader parameter
    ///
    /// The returned value is decoded as the catalog's declared type; a
    /// response that does not parse as that type is an error, not a
    /// best-effort value. On an unconnected handle only values set since
    /// create (and the handle's timeout copies) are visible; everything
    /// else needs the device.
    pub fn get_param(&mut self, param: Param) -> Result<ParamValue> {
        self.ensure_alive()?;
        let expected = param.wire_type().ok_or(Error::Unimplemented(param))?;

        if self.state() != ReaderState::Connected {
            return self.pending_param(param).ok_or(Error::NotConnected);
        }

        let mut out = WireBuffer::new(MAX_PAYLOAD_SIZE);
        out.put_u16(param.id())?;

        let data = self.invoke("paramGet", Some(param.name()), |r| {
            r.transact(Opcode::GetParam, out.as_slice())
        })?;

        decode_value(param, expected, &data)
    }
}

fn encode_value(out: &mut WireBuffer, param: Param, value: &ParamValue) -> Result<()> {
    match value {
        ParamValue::Uint32(v) => out.put_u32(*v)?,
        ParamValue::Int32(v) => out.put_i32(*v)?,
        ParamValue::Bool(v) => out.put_u8(*v as u8)?,
        ParamValue::String(s) => out.put_bounded_str(param.name(), s, MAX_PARAM_STRING)?,
        ParamValue::Bytes(b) => out.put_bounded_bytes(param.name(), b, MAX_PARAM_BYTES)?,
        ParamValue::Region(r) => out.put_u8(*r as u8)?,
        ParamValue::Plan(p) => encode_plan(out, p)?,
    }
    Ok(())
}

fn decode_value(param: Param, expected: WireType, data: &[u8]) -> Result<ParamValue> {
    let mut rd = WireBuffer::from_slice(data);
    let value = match expected {
        WireType::Uint32 => ParamValue::Uint32(rd.get_u32()?),
        WireType::Int32 => ParamValue::Int32(rd.get_i32()?),
        WireType::Bool => match rd.get_u8()? {
            0 => ParamValue::Bool(false),
            1 => ParamValue::Bool(true),
            other => {
                return Err(Error::Types(tmrust_types::Error::Parse(format!(
                    "invalid boolean byte for {param}: 0x{other:02X}"
                ))));
            }
        },
        WireType::String => ParamValue::String(rd.get_bounded_str(param.name())?),
        WireType::Bytes => ParamValue::Bytes(rd.get_bounded_bytes(param.name())?),
        WireType::Region => ParamValue::Region(Region::try_from(rd.get_u8()?)?),
        WireType::Plan => ParamValue::Plan(decode_plan(&mut rd)?),
    };
    Ok(value)
}

fn encode_plan(out: &mut WireBuffer, plan: &ReadPlan) -> tmrust_core::Result<()> {
    out.put_bounded_bytes("antennas", &plan.antennas, MAX_ANTENNAS)?;
    out.put_u8(plan.protocol as u8)?;
    match plan.stop_on_count {
        Some(count) => {
            out.put_u8(1)?;
            out.put_u32(count)?;
        }
        None => out.put_u8(0)?,
    }
    out.put_bounded_bytes("gpiTrigger", &plan.gpi_trigger, MAX_GPI_PINS)?;
    Ok(())
}

fn decode_plan(rd: &mut WireBuffer) -> Result<ReadPlan> {
    let antennas = rd.get_bounded_bytes("antennas")?;
    let protocol = TagProtocol::try_from(rd.get_u8()?)?;
    let stop_on_count = if rd.get_u8()? != 0 {
        Some(rd.get_u32()?)
    } else {
        None
    };
    let gpi_trigger = rd.get_bounded_bytes("gpiTrigger")?;
    Ok(ReadPlan {
        antennas,
        protocol,
        stop_on_count,
        gpi_trigger,
    })
}
