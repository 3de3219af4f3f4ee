//! Inbound events and outbound wire operations exchanged with the transport.

use super::cluster::{Cluster, WireAddress};
use crate::error::ConverterError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum::{Display, EnumString};

/// Kind of message an attribute value arrived in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    /// Unsolicited report pushed by the device.
    AttributeReport,
    /// Answer to a read request.
    ReadResponse,
    /// Echo of a value after a write attempt.
    WriteEcho,
}

/// Raw attribute value as narrowed by the protocol layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl WireValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            WireValue::Bool(b) => f64::from(u8::from(b)),
            WireValue::Int(i) => i as f64,
            WireValue::Float(f) => f,
        }
    }

    /// Integral code carried by this value, if any.
    pub fn as_code(&self) -> Option<i64> {
        match *self {
            WireValue::Bool(b) => Some(i64::from(b)),
            WireValue::Int(i) => Some(i),
            WireValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
            WireValue::Float(_) => None,
        }
    }

    /// Integral values become `Int`, everything else `Float`.
    pub fn from_number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            WireValue::Int(value as i64)
        } else {
            WireValue::Float(value)
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::Bool(b) => write!(f, "{}", b),
            WireValue::Int(i) => write!(f, "{}", i),
            WireValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Attribute identifier → raw value, as parsed from one message.
pub type AttributePayload = BTreeMap<u16, WireValue>;

/// A parsed message from a device, delivered by the transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub cluster: Cluster,
    pub attribute: u16,
    pub kind: MessageKind,
    #[serde(default)]
    pub payload: AttributePayload,
}

impl InboundEvent {
    /// Build an event from a full payload. The primary attribute is the
    /// lowest attribute identifier present.
    pub fn new(cluster: Cluster, kind: MessageKind, payload: AttributePayload) -> Self {
        let attribute = payload.keys().next().copied().unwrap_or_default();
        Self {
            cluster,
            attribute,
            kind,
            payload,
        }
    }

    /// Shorthand for an attribute report.
    pub fn report<I>(cluster: Cluster, values: I) -> Self
    where
        I: IntoIterator<Item = (u16, WireValue)>,
    {
        Self::new(cluster, MessageKind::AttributeReport, values.into_iter().collect())
    }

    /// Every wire address this event carries a value for, primary first.
    pub fn addresses(&self) -> impl Iterator<Item = WireAddress> + '_ {
        std::iter::once(self.attribute)
            .chain(self.payload.keys().copied().filter(|a| *a != self.attribute))
            .map(|attribute| WireAddress::new(self.cluster, attribute))
    }

    /// Value of `attribute` in this event, if present.
    pub fn value(&self, attribute: u16) -> Option<WireValue> {
        self.payload.get(&attribute).copied()
    }

    /// Value of `attribute`, or `MissingField` attributed to `capability`.
    pub fn require(&self, capability: &str, attribute: u16) -> Result<WireValue, ConverterError> {
        self.value(attribute).ok_or_else(|| ConverterError::MissingField {
            capability: capability.to_string(),
            address: WireAddress::new(self.cluster, attribute),
        })
    }
}

/// An operation for the transport to perform against the device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum WireOperation {
    Write {
        address: WireAddress,
        value: WireValue,
    },
    Read {
        address: WireAddress,
    },
    #[serde(rename_all = "camelCase")]
    ConfigureReporting {
        address: WireAddress,
        min_interval: u16,
        max_interval: u16,
        reportable_change: f64,
    },
    /// Cluster-specific command (on/off, identify, ...).
    Command {
        cluster: Cluster,
        command: u8,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<WireValue>,
    },
}

impl WireOperation {
    /// Cluster the operation targets.
    pub fn cluster(&self) -> Cluster {
        match self {
            WireOperation::Write { address, .. }
            | WireOperation::Read { address }
            | WireOperation::ConfigureReporting { address, .. } => address.cluster,
            WireOperation::Command { cluster, .. } => *cluster,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zcl::attr;

    #[test]
    fn test_wire_value_codes() {
        assert_eq!(WireValue::Int(3).as_code(), Some(3));
        assert_eq!(WireValue::Bool(true).as_code(), Some(1));
        assert_eq!(WireValue::Float(2.0).as_code(), Some(2));
        assert_eq!(WireValue::Float(2.5).as_code(), None);
        assert_eq!(WireValue::Float(f64::NAN).as_code(), None);
    }

    #[test]
    fn test_wire_value_from_number() {
        assert_eq!(WireValue::from_number(45.0), WireValue::Int(45));
        assert_eq!(WireValue::from_number(0.3), WireValue::Float(0.3));
    }

    #[test]
    fn test_event_deserializes_numeric_payload_keys() {
        let json = r#"{
            "cluster": "msTemperatureMeasurement",
            "attribute": 0,
            "kind": "attributeReport",
            "payload": {"0": 2350, "61441": 4}
        }"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.cluster, Cluster::MsTemperatureMeasurement);
        assert_eq!(event.kind, MessageKind::AttributeReport);
        assert_eq!(event.value(attr::MEASURED_VALUE), Some(WireValue::Int(2350)));
        assert_eq!(
            event.value(attr::TEMPERATURE_EXTENDED_PRECISION),
            Some(WireValue::Int(4))
        );
    }

    #[test]
    fn test_event_addresses_cover_primary_and_payload() {
        let mut event = InboundEvent::report(
            Cluster::GenPowerCfg,
            [
                (attr::BATTERY_VOLTAGE, WireValue::Int(30)),
                (attr::BATTERY_PERCENTAGE_REMAINING, WireValue::Int(200)),
            ],
        );
        event.attribute = attr::BATTERY_PERCENTAGE_REMAINING;
        let attributes: Vec<u16> = event.addresses().map(|a| a.attribute).collect();
        assert_eq!(
            attributes,
            vec![attr::BATTERY_PERCENTAGE_REMAINING, attr::BATTERY_VOLTAGE]
        );
    }

    #[test]
    fn test_require_reports_missing_field() {
        let event = InboundEvent::report(Cluster::GenOnOff, []);
        let err = event.require("state", attr::ON_OFF).unwrap_err();
        assert!(matches!(err, ConverterError::MissingField { .. }));
    }

    #[test]
    fn test_operation_serialization() {
        let op = WireOperation::ConfigureReporting {
            address: WireAddress::new(Cluster::GenPowerCfg, attr::BATTERY_VOLTAGE),
            min_interval: 10,
            max_interval: 3600,
            reportable_change: 1.0,
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "configureReporting");
        assert_eq!(json["minInterval"], 10);
        assert_eq!(json["address"]["cluster"], "genPowerCfg");
    }
}
