//! ZCL cluster and attribute identifiers used by the capability catalog.
//!
//! Clusters are a closed enumeration so dispatch tables can be keyed on a
//! validated identifier instead of free-form names.

use crate::error::ConverterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

/// Zigbee Cluster Library clusters known to the bridge.
///
/// Names follow the conventional camelCase spelling (`genOnOff`,
/// `msTemperatureMeasurement`, ...), both for display and serialization.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    FromRepr,
    EnumString,
    EnumIter,
    Display,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Cluster {
    GenBasic = 0x0000,
    GenPowerCfg = 0x0001,
    GenIdentify = 0x0003,
    GenOnOff = 0x0006,
    GenAnalogInput = 0x000C,
    GenAnalogOutput = 0x000D,
    GenAnalogValue = 0x000E,
    GenBinaryInput = 0x000F,
    GenBinaryOutput = 0x0010,
    GenBinaryValue = 0x0011,
    GenMultistateInput = 0x0012,
    GenMultistateOutput = 0x0013,
    GenMultistateValue = 0x0014,
    MsIlluminanceMeasurement = 0x0400,
    MsTemperatureMeasurement = 0x0402,
    MsRelativeHumidity = 0x0405,
    SsIasZone = 0x0500,
}

impl Cluster {
    /// Numeric cluster identifier on the wire.
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Resolve a cluster from its numeric identifier.
    pub fn from_id(id: u16) -> Result<Self, ConverterError> {
        Self::from_repr(id).ok_or_else(|| ConverterError::UnknownCluster(format!("0x{:04X}", id)))
    }

    /// Resolve a cluster from either its name (`genOnOff`) or a numeric
    /// identifier in decimal or `0x` hex form.
    pub fn parse(s: &str) -> Result<Self, ConverterError> {
        if let Ok(cluster) = Self::from_str(s) {
            return Ok(cluster);
        }
        parse_u16(s)
            .ok_or_else(|| ConverterError::UnknownCluster(s.to_string()))
            .and_then(Self::from_id)
    }
}

/// Parse a `u16` written in decimal or `0x` hexadecimal.
pub fn parse_u16(s: &str) -> Option<u16> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Attribute identifiers, grouped by the cluster they belong to.
pub mod attr {
    /// presentValue of the genAnalog*/genBinary*/genMultistate* clusters.
    pub const PRESENT_VALUE: u16 = 0x0055;

    /// measuredValue of the ms* measurement clusters.
    pub const MEASURED_VALUE: u16 = 0x0000;

    /// Vendor extension carrying extra temperature precision in 0.1 °C.
    pub const TEMPERATURE_EXTENDED_PRECISION: u16 = 0xF001;

    pub const ON_OFF: u16 = 0x0000;
    pub const START_UP_ON_OFF: u16 = 0x4003;

    /// Battery voltage in units of 100 mV.
    pub const BATTERY_VOLTAGE: u16 = 0x0020;
    /// Remaining battery in units of 0.5 %.
    pub const BATTERY_PERCENTAGE_REMAINING: u16 = 0x0021;
    pub const BATTERY_ALARM_STATE: u16 = 0x003E;

    pub const IDENTIFY_TIME: u16 = 0x0000;

    pub const ZONE_STATUS: u16 = 0x0002;
}

/// Cluster-specific command identifiers.
pub mod cmd {
    pub const OFF: u8 = 0x00;
    pub const ON: u8 = 0x01;
    pub const TOGGLE: u8 = 0x02;

    pub const IDENTIFY: u8 = 0x00;
}

/// Where a value lives on the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireAddress {
    pub cluster: Cluster,
    pub attribute: u16,
}

impl WireAddress {
    pub const fn new(cluster: Cluster, attribute: u16) -> Self {
        Self { cluster, attribute }
    }
}

impl fmt::Display for WireAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/0x{:04X}", self.cluster, self.attribute)
    }
}
