//! Reader parameter catalog
//!
//! Every configurable reader setting is identified by a [`Param`]. The set
//! is closed and known at build time; each identifier carries a stable name
//! string (the same `/reader/...` path the device itself reports) and a
//! declared wire type. A few identifiers are cataloged but not implemented
//! by this binding — they have names but no codec, and `set`/`get` reject
//! them up front.

use crate::value::WireType;

/// Reader parameter identifiers
///
/// The `u16` discriminant is the identifier sent on the wire in
/// SetParam/GetParam payloads.
///
/// # Examples
///
/// ```
/// use tmrust_types::Param;
///
/// assert_eq!(Param::TransportTimeout.name(), "/reader/transportTimeout");
/// assert_eq!(Param::from_name("/reader/transportTimeout"), Some(Param::TransportTimeout));
/// assert_eq!(Param::from_name("/reader/bogus"), None);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Param {
    // Link configuration
    BaudRate = 0x0001,
    CommandTimeout = 0x0002,
    TransportTimeout = 0x0003,
    Uri = 0x0004,

    // Region & radio
    RegionId = 0x0010,
    ReadPower = 0x0011,
    WritePower = 0x0012,
    EnablePowerSave = 0x0013,

    // Antennas & GPIO
    AntennaPortList = 0x0020,
    AntennaCheckPort = 0x0021,
    GpioInputList = 0x0022,
    GpioOutputList = 0x0023,

    // Read configuration
    ReadPlan = 0x0030,
    EnableReadFilter = 0x0031,
    UniqueByAntenna = 0x0032,
    ReadAsyncOnTime = 0x0033,
    ReadAsyncOffTime = 0x0034,

    // Tag operations
    TagopAntenna = 0x0040,
    TagopProtocol = 0x0041,
    Gen2Session = 0x0042,
    Gen2AccessPassword = 0x0043,

    // Identity (read-only on real hardware, still plain params here)
    VersionHardware = 0x0050,
    VersionSoftware = 0x0051,
    VersionModel = 0x0052,
    VersionSerial = 0x0053,

    // Cataloged but not implemented by this binding
    LicenseKey = 0x0060,
    UserConfig = 0x0061,
    CurrentTime = 0x0062,
}

impl Param {
    /// All catalog identifiers, implemented or not.
    pub const ALL: &'static [Param] = &[
        Param::BaudRate,
        Param::CommandTimeout,
        Param::TransportTimeout,
        Param::Uri,
        Param::RegionId,
        Param::ReadPower,
        Param::WritePower,
        Param::EnablePowerSave,
        Param::AntennaPortList,
        Param::AntennaCheckPort,
        Param::GpioInputList,
        Param::GpioOutputList,
        Param::ReadPlan,
        Param::EnableReadFilter,
        Param::UniqueByAntenna,
        Param::ReadAsyncOnTime,
        Param::ReadAsyncOffTime,
        Param::TagopAntenna,
        Param::TagopProtocol,
        Param::Gen2Session,
        Param::Gen2AccessPassword,
        Param::VersionHardware,
        Param::VersionSoftware,
        Param::VersionModel,
        Param::VersionSerial,
        Param::LicenseKey,
        Param::UserConfig,
        Param::CurrentTime,
    ];

    /// Iterate over the full catalog.
    pub fn iter() -> impl Iterator<Item = Param> {
        Self::ALL.iter().copied()
    }

    /// Stable parameter name, matching the device's own naming.
    ///
    /// Total: every catalog identifier has a name, including the
    /// unimplemented ones.
    pub fn name(self) -> &'static str {
        match self {
            Param::BaudRate => "/reader/baudRate",
            Param::CommandTimeout => "/reader/commandTimeout",
            Param::TransportTimeout => "/reader/transportTimeout",
            Param::Uri => "/reader/uri",
            Param::RegionId => "/reader/region/id",
            Param::ReadPower => "/reader/radio/readPower",
            Param::WritePower => "/reader/radio/writePower",
            Param::EnablePowerSave => "/reader/radio/enablePowerSave",
            Param::AntennaPortList => "/reader/antenna/portList",
            Param::AntennaCheckPort => "/reader/antenna/checkPort",
            Param::GpioInputList => "/reader/gpio/inputList",
            Param::GpioOutputList => "/reader/gpio/outputList",
            Param::ReadPlan => "/reader/read/plan",
            Param::EnableReadFilter => "/reader/tagReadData/enableReadFilter",
            Param::UniqueByAntenna => "/reader/tagReadData/uniqueByAntenna",
            Param::ReadAsyncOnTime => "/reader/read/asyncOnTime",
            Param::ReadAsyncOffTime => "/reader/read/asyncOffTime",
            Param::TagopAntenna => "/reader/tagop/antenna",
            Param::TagopProtocol => "/reader/tagop/protocol",
            Param::Gen2Session => "/reader/gen2/session",
            Param::Gen2AccessPassword => "/reader/gen2/accessPassword",
            Param::VersionHardware => "/reader/version/hardware",
            Param::VersionSoftware => "/reader/version/software",
            Param::VersionModel => "/reader/version/model",
            Param::VersionSerial => "/reader/version/serial",
            Param::LicenseKey => "/reader/licenseKey",
            Param::UserConfig => "/reader/userConfig",
            Param::CurrentTime => "/reader/currentTime",
        }
    }

    /// Look up a parameter by name.
    ///
    /// Unknown names yield `None`; this never fails.
    pub fn from_name(name: &str) -> Option<Param> {
        Self::iter().find(|p| p.name() == name)
    }

    /// Declared wire type, or `None` for cataloged-but-unimplemented
    /// parameters.
    pub fn wire_type(self) -> Option<WireType> {
        match self {
            Param::BaudRate
            | Param::CommandTimeout
            | Param::TransportTimeout
            | Param::ReadAsyncOnTime
            | Param::ReadAsyncOffTime
            | Param::TagopAntenna
            | Param::TagopProtocol
            | Param::Gen2Session
            | Param::Gen2AccessPassword => Some(WireType::Uint32),

            Param::ReadPower | Param::WritePower => Some(WireType::Int32),

            Param::EnablePowerSave
            | Param::AntennaCheckPort
            | Param::EnableReadFilter
            | Param::UniqueByAntenna => Some(WireType::Bool),

            Param::Uri
            | Param::VersionHardware
            | Param::VersionSoftware
            | Param::VersionModel
            | Param::VersionSerial => Some(WireType::String),

            Param::AntennaPortList | Param::GpioInputList | Param::GpioOutputList => {
                Some(WireType::Bytes)
            }

            Param::RegionId => Some(WireType::Region),

            Param::ReadPlan => Some(WireType::Plan),

            Param::LicenseKey | Param::UserConfig | Param::CurrentTime => None,
        }
    }

    /// Wire identifier for SetParam/GetParam payloads.
    pub fn id(self) -> u16 {
        self as u16
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        // Bijection over the whole catalog, unimplemented ids included
        for param in Param::iter() {
            assert_eq!(Param::from_name(param.name()), Some(param));
        }
    }

    #[test]
    fn test_names_unique() {
        for a in Param::iter() {
            for b in Param::iter() {
                if a != b {
                    assert_ne!(a.name(), b.name());
                }
            }
        }
    }

    #[test]
    fn test_unknown_name_is_none() {
        assert_eq!(Param::from_name("/reader/doesNotExist"), None);
        assert_eq!(Param::from_name(""), None);
    }

    #[test]
    fn test_unimplemented_have_names_but_no_type() {
        for param in [Param::LicenseKey, Param::UserConfig, Param::CurrentTime] {
            assert!(!param.name().is_empty());
            assert_eq!(param.wire_type(), None);
        }
    }

    #[test]
    fn test_wire_ids_unique() {
        for a in Param::iter() {
            for b in Param::iter() {
                if a != b {
                    assert_ne!(a.id(), b.id());
                }
            }
        }
    }

    #[test]
    fn test_display_is_name() {
        assert_eq!(Param::ReadPlan.to_string(), "/reader/read/plan");
    }
}
