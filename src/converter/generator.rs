//! Compiles a [`CapabilityDescriptor`] into its converter pair and schema.

use super::capability::{Capability, CapabilityOrigin, ReportTarget};
use super::descriptor::{CapabilityDescriptor, ValueDomain};
use super::expose::Expose;
use super::{Decoder, Encoder, PartialState, number};
use crate::error::ConverterError;
use crate::zcl::{InboundEvent, MessageKind, WireAddress, WireOperation, WireValue};
use serde_json::Value;
use std::sync::Arc;

/// Compile a descriptor.
///
/// The decoder exists for readable access modes, the encoder for writable
/// ones; a report target is added only when the mode reports and the
/// reporting policy is not disabled. Never fails: descriptors are validated
/// when they are built.
pub fn compile(descriptor: CapabilityDescriptor) -> Capability {
    let expose = Expose::from(&descriptor);
    let address = descriptor.address;
    let access = descriptor.access;
    let report_targets = if descriptor.wants_reporting() {
        vec![ReportTarget {
            address,
            scale: descriptor.scale(),
        }]
    } else {
        Vec::new()
    };

    let name = descriptor.name.clone();
    let descriptor = Arc::new(descriptor);

    let decoder: Option<Arc<dyn Decoder>> = access
        .readable()
        .then(|| Arc::new(DescriptorDecoder::new(descriptor.clone())) as Arc<dyn Decoder>);
    let encoder: Option<Arc<dyn Encoder>> = access
        .writable()
        .then(|| Arc::new(DescriptorEncoder::new(descriptor.clone())) as Arc<dyn Encoder>);

    Capability {
        name,
        origin: CapabilityOrigin::Declarative,
        decoder,
        encoder,
        exposes: vec![expose],
        report_targets,
        read_addresses: if access.readable() {
            vec![address]
        } else {
            Vec::new()
        },
    }
}

/// Convert one raw wire value according to the descriptor's domain.
pub fn decode_value(descriptor: &CapabilityDescriptor, raw: WireValue) -> Result<Value, ConverterError> {
    match &descriptor.domain {
        ValueDomain::Numeric(domain) => {
            let value = domain.decode(raw.as_f64());
            if !value.is_finite() {
                return Err(ConverterError::DecodeMismatch {
                    capability: descriptor.name.clone(),
                    value: raw.to_string(),
                });
            }
            Ok(number(value))
        }
        ValueDomain::Enumerated(table) => {
            let code = raw.as_code().ok_or_else(|| ConverterError::DecodeMismatch {
                capability: descriptor.name.clone(),
                value: raw.to_string(),
            })?;
            Ok(Value::String(table.decode(code)?.to_string()))
        }
        ValueDomain::Binary { on, off } => match raw.as_code() {
            Some(code) if code == on.code => Ok(Value::String(on.label.clone())),
            Some(code) if code == off.code => Ok(Value::String(off.label.clone())),
            _ => Err(ConverterError::DecodeMismatch {
                capability: descriptor.name.clone(),
                value: raw.to_string(),
            }),
        },
    }
}

/// Validate an application value and convert it to its wire form.
pub fn encode_value(descriptor: &CapabilityDescriptor, value: &Value) -> Result<WireValue, ConverterError> {
    match &descriptor.domain {
        ValueDomain::Numeric(domain) => {
            let requested = value.as_f64().ok_or_else(|| ConverterError::InvalidValue {
                capability: descriptor.name.clone(),
                expected: "number",
                got: value.to_string(),
            })?;
            domain.check(&descriptor.name, requested)?;
            Ok(WireValue::from_number(domain.scale.to_wire(requested)))
        }
        ValueDomain::Enumerated(table) => {
            let label = label_of(descriptor, value)?;
            Ok(WireValue::Int(table.encode(label)?))
        }
        ValueDomain::Binary { on, off } => {
            let label = label_of(descriptor, value)?;
            if label == on.label {
                Ok(WireValue::Int(on.code))
            } else if label == off.label {
                Ok(WireValue::Int(off.code))
            } else {
                Err(ConverterError::UnknownLabel {
                    capability: descriptor.name.clone(),
                    label: label.to_string(),
                })
            }
        }
    }
}

fn label_of<'a>(descriptor: &CapabilityDescriptor, value: &'a Value) -> Result<&'a str, ConverterError> {
    value.as_str().ok_or_else(|| ConverterError::UnknownLabel {
        capability: descriptor.name.clone(),
        label: value.to_string(),
    })
}

/// Decoder generated from a descriptor.
pub struct DescriptorDecoder {
    descriptor: Arc<CapabilityDescriptor>,
}

impl DescriptorDecoder {
    pub fn new(descriptor: Arc<CapabilityDescriptor>) -> Self {
        Self { descriptor }
    }
}

impl Decoder for DescriptorDecoder {
    fn capability(&self) -> &str {
        &self.descriptor.name
    }

    fn addresses(&self) -> Vec<WireAddress> {
        vec![self.descriptor.address]
    }

    fn message_kinds(&self) -> &[MessageKind] {
        self.descriptor.access.message_kinds()
    }

    fn decode(&self, event: &InboundEvent) -> Result<PartialState, ConverterError> {
        let mut state = PartialState::new();
        let address = self.descriptor.address;
        if event.cluster != address.cluster {
            return Ok(state);
        }
        if let Some(raw) = event.value(address.attribute) {
            let value = decode_value(&self.descriptor, raw)?;
            state.insert(self.descriptor.name.clone(), value);
        }
        Ok(state)
    }
}

/// Encoder generated from a descriptor: one attribute write.
pub struct DescriptorEncoder {
    descriptor: Arc<CapabilityDescriptor>,
}

impl DescriptorEncoder {
    pub fn new(descriptor: Arc<CapabilityDescriptor>) -> Self {
        Self { descriptor }
    }
}

impl Encoder for DescriptorEncoder {
    fn capability(&self) -> &str {
        &self.descriptor.name
    }

    fn encode(&self, value: &Value) -> Result<Vec<WireOperation>, ConverterError> {
        let wire = encode_value(&self.descriptor, value)?;
        Ok(vec![WireOperation::Write {
            address: self.descriptor.address,
            value: wire,
        }])
    }
}
