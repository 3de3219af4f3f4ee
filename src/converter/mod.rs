//! Capability-to-protocol converter compiler.
//!
//! A [`CapabilityDescriptor`] is compiled by [`compile`] into a
//! [`Capability`]: a decoder, an optional encoder, the schema entries and
//! the report/read targets. Capabilities that cannot be described
//! declaratively are assembled with [`CustomConverter`]. Both kinds share
//! the [`Decoder`] signature, which always receives the full inbound event.

pub mod capability;
pub mod custom;
pub mod descriptor;
pub mod expose;
pub mod generator;
pub mod lookup;
pub mod reporting;

pub use capability::{Capability, CapabilityOrigin, ReportTarget};
pub use custom::{CustomConverter, CustomDecode, FieldRole};
pub use descriptor::{
    AccessMode, BinaryArgs, BinaryValue, CapabilityDescriptor, EnumLookupArgs, NumericArgs,
    NumericDomain, ReportingPolicy, Scale, ValueDomain,
};
pub use expose::{Expose, ExposeKind};
pub use generator::compile;
pub use lookup::LookupTable;
pub use reporting::{ReportConfig, ReportingDefaults, StaticReporting};

use crate::error::ConverterError;
use crate::zcl::{InboundEvent, MessageKind, WireAddress, WireOperation};
use serde_json::Value;

/// Application state fragment produced by one decoder.
pub type PartialState = serde_json::Map<String, Value>;

/// Wire → application conversion for one capability.
pub trait Decoder: Send + Sync {
    /// Name of the capability this decoder belongs to.
    fn capability(&self) -> &str;

    /// Every wire address this decoder consumes.
    fn addresses(&self) -> Vec<WireAddress>;

    /// Message kinds this decoder is dispatched for.
    fn message_kinds(&self) -> &[MessageKind];

    /// Decode the event. Simple decoders read only their own attribute;
    /// an event lacking it yields an empty state.
    fn decode(&self, event: &InboundEvent) -> Result<PartialState, ConverterError>;
}

/// Application → wire conversion for one capability.
pub trait Encoder: Send + Sync {
    fn capability(&self) -> &str;

    /// Validate `value` and produce the wire operations setting it.
    fn encode(&self, value: &Value) -> Result<Vec<WireOperation>, ConverterError>;
}

/// JSON number for `value`, integral values without a fraction.
pub fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}
