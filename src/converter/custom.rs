//! Hand-written converters for capabilities spanning several attributes.
//!
//! A custom converter declares every attribute it consumes together with its
//! role, so the composition engine can route reports to it and enforce
//! presence rules before the decode hook runs:
//!
//! - [`FieldRole::Trigger`]: if no trigger field is present the converter
//!   contributes nothing to this event.
//! - [`FieldRole::Required`]: absent while a trigger is present →
//!   `MissingField`.
//! - [`FieldRole::Optional`]: read when present, never an error.

use super::capability::{Capability, CapabilityOrigin, ReportTarget};
use super::descriptor::Scale;
use super::expose::Expose;
use super::{Decoder, Encoder, PartialState};
use crate::error::ConverterError;
use crate::zcl::{InboundEvent, MessageKind, WireAddress};
use std::sync::Arc;

const DEFAULT_KINDS: &[MessageKind] = &[MessageKind::AttributeReport, MessageKind::ReadResponse];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldRole {
    Trigger,
    Required,
    Optional,
}

/// Decode hook of a custom converter. Receives the full event.
pub trait CustomDecode: Send + Sync {
    fn decode(&self, event: &InboundEvent) -> Result<PartialState, ConverterError>;
}

impl<F> CustomDecode for F
where
    F: Fn(&InboundEvent) -> Result<PartialState, ConverterError> + Send + Sync,
{
    fn decode(&self, event: &InboundEvent) -> Result<PartialState, ConverterError> {
        self(event)
    }
}

/// Builder for a custom capability.
///
/// # Example
/// ```ignore
/// let temperature = CustomConverter::new("temperature")
///     .field(measured_value, FieldRole::Trigger)
///     .field(extension, FieldRole::Optional)
///     .decode(|event: &InboundEvent| { ... })
///     .expose(Expose::numeric("temperature", AccessMode::ReadReport).with_unit("°C"))
///     .build();
/// ```
pub struct CustomConverter {
    name: String,
    fields: Vec<(WireAddress, FieldRole)>,
    kinds: Vec<MessageKind>,
    decode: Option<Arc<dyn CustomDecode>>,
    encoder: Option<Arc<dyn Encoder>>,
    exposes: Vec<Expose>,
    report_targets: Vec<ReportTarget>,
}

impl CustomConverter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            kinds: DEFAULT_KINDS.to_vec(),
            decode: None,
            encoder: None,
            exposes: Vec::new(),
            report_targets: Vec::new(),
        }
    }

    /// Declare a consumed attribute.
    pub fn field(mut self, address: WireAddress, role: FieldRole) -> Self {
        self.fields.push((address, role));
        self
    }

    /// Message kinds to decode (default: attribute reports and read responses).
    pub fn kinds(mut self, kinds: &[MessageKind]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    pub fn decode(mut self, hook: impl CustomDecode + 'static) -> Self {
        self.decode = Some(Arc::new(hook));
        self
    }

    pub fn encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    pub fn expose(mut self, expose: Expose) -> Self {
        self.exposes.push(expose);
        self
    }

    /// Request a report subscription for `address`.
    pub fn report(mut self, address: WireAddress, scale: Scale) -> Self {
        self.report_targets.push(ReportTarget { address, scale });
        self
    }

    /// Finish the capability.
    ///
    /// Without an encoder every expose is forced read-only. Trigger and
    /// required fields become the read targets of a `get`.
    pub fn build(self) -> Capability {
        let mut exposes = self.exposes;
        if self.encoder.is_none() {
            for expose in &mut exposes {
                expose.access = expose.access.read_only();
            }
        }

        let read_addresses = if self.decode.is_some() {
            self.fields
                .iter()
                .filter(|(_, role)| *role != FieldRole::Optional)
                .map(|(address, _)| *address)
                .collect()
        } else {
            Vec::new()
        };

        let decoder = self.decode.map(|hook| {
            Arc::new(CustomDecoder {
                capability: self.name.clone(),
                fields: self.fields,
                kinds: self.kinds,
                hook,
            }) as Arc<dyn Decoder>
        });

        Capability {
            name: self.name,
            origin: CapabilityOrigin::Custom,
            decoder,
            encoder: self.encoder,
            exposes,
            report_targets: self.report_targets,
            read_addresses,
        }
    }
}

/// Applies the field-role rules, then runs the hook.
struct CustomDecoder {
    capability: String,
    fields: Vec<(WireAddress, FieldRole)>,
    kinds: Vec<MessageKind>,
    hook: Arc<dyn CustomDecode>,
}

impl CustomDecoder {
    fn present(&self, event: &InboundEvent, address: &WireAddress) -> bool {
        event.cluster == address.cluster && event.payload.contains_key(&address.attribute)
    }
}

impl Decoder for CustomDecoder {
    fn capability(&self) -> &str {
        &self.capability
    }

    fn addresses(&self) -> Vec<WireAddress> {
        self.fields.iter().map(|(address, _)| *address).collect()
    }

    fn message_kinds(&self) -> &[MessageKind] {
        &self.kinds
    }

    fn decode(&self, event: &InboundEvent) -> Result<PartialState, ConverterError> {
        let mut triggers = self
            .fields
            .iter()
            .filter(|(_, role)| *role == FieldRole::Trigger)
            .peekable();
        if triggers.peek().is_some() && !triggers.any(|(address, _)| self.present(event, address)) {
            return Ok(PartialState::new());
        }

        if let Some((address, _)) = self
            .fields
            .iter()
            .find(|(address, role)| *role == FieldRole::Required && !self.present(event, address))
        {
            return Err(ConverterError::MissingField {
                capability: self.capability.clone(),
                address: *address,
            });
        }

        self.hook.decode(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::descriptor::AccessMode;
    use crate::converter::number;
    use crate::zcl::{Cluster, WireOperation, WireValue, attr};
    use serde_json::{Value, json};

    fn measured() -> WireAddress {
        WireAddress::new(Cluster::MsTemperatureMeasurement, attr::MEASURED_VALUE)
    }

    fn extension() -> WireAddress {
        WireAddress::new(
            Cluster::MsTemperatureMeasurement,
            attr::TEMPERATURE_EXTENDED_PRECISION,
        )
    }

    fn sum_hook(event: &InboundEvent) -> Result<PartialState, ConverterError> {
        let base = event.require("sum", attr::MEASURED_VALUE)?.as_f64();
        let extra = event
            .value(attr::TEMPERATURE_EXTENDED_PRECISION)
            .map_or(0.0, |v| v.as_f64());
        let mut state = PartialState::new();
        state.insert("sum".into(), number(base + extra));
        Ok(state)
    }

    struct Nop;

    impl Encoder for Nop {
        fn capability(&self) -> &str {
            "sum"
        }

        fn encode(&self, _value: &Value) -> Result<Vec<WireOperation>, ConverterError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_trigger_absent_yields_empty_state() {
        let capability = CustomConverter::new("sum")
            .field(measured(), FieldRole::Trigger)
            .field(extension(), FieldRole::Optional)
            .decode(sum_hook)
            .build();
        let event = InboundEvent::report(
            Cluster::MsTemperatureMeasurement,
            [(attr::TEMPERATURE_EXTENDED_PRECISION, WireValue::Int(4))],
        );
        assert!(capability.decoder().unwrap().decode(&event).unwrap().is_empty());
    }

    #[test]
    fn test_optional_field_is_read_when_present() {
        let capability = CustomConverter::new("sum")
            .field(measured(), FieldRole::Trigger)
            .field(extension(), FieldRole::Optional)
            .decode(sum_hook)
            .build();
        let decoder = capability.decoder().unwrap();

        let base_only = InboundEvent::report(
            Cluster::MsTemperatureMeasurement,
            [(attr::MEASURED_VALUE, WireValue::Int(10))],
        );
        assert_eq!(decoder.decode(&base_only).unwrap().get("sum"), Some(&json!(10)));

        let both = InboundEvent::report(
            Cluster::MsTemperatureMeasurement,
            [
                (attr::MEASURED_VALUE, WireValue::Int(10)),
                (attr::TEMPERATURE_EXTENDED_PRECISION, WireValue::Int(5)),
            ],
        );
        assert_eq!(decoder.decode(&both).unwrap().get("sum"), Some(&json!(15)));
    }

    #[test]
    fn test_required_field_missing_is_an_error() {
        let capability = CustomConverter::new("sum")
            .field(measured(), FieldRole::Trigger)
            .field(extension(), FieldRole::Required)
            .decode(sum_hook)
            .build();
        let event = InboundEvent::report(
            Cluster::MsTemperatureMeasurement,
            [(attr::MEASURED_VALUE, WireValue::Int(10))],
        );
        assert_eq!(
            capability.decoder().unwrap().decode(&event),
            Err(ConverterError::MissingField {
                capability: "sum".into(),
                address: extension(),
            })
        );
    }

    #[test]
    fn test_declared_fields_are_routing_addresses() {
        let capability = CustomConverter::new("sum")
            .field(measured(), FieldRole::Trigger)
            .field(extension(), FieldRole::Optional)
            .decode(sum_hook)
            .build();
        assert_eq!(
            capability.decoder().unwrap().addresses(),
            vec![measured(), extension()]
        );
        assert_eq!(capability.read_addresses(), &[measured()]);
    }

    #[test]
    fn test_without_encoder_exposes_are_read_only() {
        let capability = CustomConverter::new("sum")
            .field(measured(), FieldRole::Trigger)
            .decode(sum_hook)
            .expose(Expose::numeric("sum", AccessMode::ReadWrite))
            .build();
        assert!(!capability.is_writable());
        assert_eq!(capability.exposes()[0].access, AccessMode::ReadReport);
    }

    #[test]
    fn test_with_encoder_keeps_access() {
        let capability = CustomConverter::new("sum")
            .field(measured(), FieldRole::Trigger)
            .decode(sum_hook)
            .encoder(Nop)
            .expose(Expose::numeric("sum", AccessMode::ReadWrite))
            .build();
        assert!(capability.is_writable());
        assert_eq!(capability.exposes()[0].access, AccessMode::ReadWrite);
    }
}
