//! Immutable device definition with pre-resolved dispatch tables.

use crate::converter::reporting::configure_operation;
use crate::converter::{Capability, CapabilityOrigin, Expose, PartialState, ReportingDefaults};
use crate::error::ConverterError;
use crate::zcl::{InboundEvent, MessageKind, WireAddress, WireOperation};
use log::{debug, trace};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Descriptive part of a definition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeviceIdentity {
    pub model: String,
    pub zigbee_models: Vec<String>,
    pub vendor: String,
    pub description: String,
    /// Firmware can be updated over the air.
    pub ota: bool,
    /// Device sleeps between reports and must not be polled.
    pub sleepy: bool,
}

/// Result of dispatching one inbound event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodeOutcome {
    pub state: PartialState,
    /// Per-capability failures; they did not stop sibling decoders.
    pub errors: Vec<ConverterError>,
}

/// One row of the decode dispatch table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Route {
    pub address: WireAddress,
    pub kind: String,
    pub capabilities: Vec<String>,
}

/// Device definition shared read-only by every device of its models.
#[derive(Debug)]
pub struct DeviceDefinition {
    identity: DeviceIdentity,
    capabilities: Vec<Capability>,
    by_name: HashMap<String, usize>,
    decode_table: HashMap<(WireAddress, MessageKind), Vec<usize>>,
    encode_table: HashMap<String, usize>,
}

impl DeviceDefinition {
    /// Resolve the dispatch tables. Fails if two declarative decoders claim
    /// the same address and message kind.
    pub(crate) fn assemble(
        identity: DeviceIdentity,
        capabilities: Vec<Capability>,
    ) -> Result<Self, ConverterError> {
        let mut decode_table: HashMap<(WireAddress, MessageKind), Vec<usize>> = HashMap::new();
        let mut encode_table = HashMap::new();
        let mut by_name = HashMap::new();

        for (index, capability) in capabilities.iter().enumerate() {
            by_name.insert(capability.name.clone(), index);
            if capability.encoder.is_some() {
                encode_table.insert(capability.name.clone(), index);
            }

            let Some(decoder) = &capability.decoder else {
                continue;
            };
            for address in decoder.addresses() {
                for kind in decoder.message_kinds() {
                    let slots = decode_table.entry((address, *kind)).or_default();
                    if capability.origin == CapabilityOrigin::Declarative
                        && let Some(&other) = slots
                            .iter()
                            .find(|&&slot| capabilities[slot].origin == CapabilityOrigin::Declarative)
                    {
                        return Err(ConverterError::AmbiguousDispatch {
                            address,
                            kind: *kind,
                            first: capabilities[other].name.clone(),
                            second: capability.name.clone(),
                        });
                    }
                    if !slots.contains(&index) {
                        slots.push(index);
                    }
                }
            }
        }

        Ok(Self {
            identity,
            capabilities,
            by_name,
            decode_table,
            encode_table,
        })
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn model(&self) -> &str {
        &self.identity.model
    }

    pub fn zigbee_models(&self) -> &[String] {
        &self.identity.zigbee_models
    }

    pub fn vendor(&self) -> &str {
        &self.identity.vendor
    }

    pub fn description(&self) -> &str {
        &self.identity.description
    }

    pub fn ota(&self) -> bool {
        self.identity.ota
    }

    pub fn sleepy(&self) -> bool {
        self.identity.sleepy
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn capability(&self, name: &str) -> Option<&Capability> {
        self.by_name.get(name).map(|&index| &self.capabilities[index])
    }

    /// Combined schema in composition order.
    pub fn exposes(&self) -> impl Iterator<Item = &Expose> {
        self.capabilities.iter().flat_map(|c| c.exposes.iter())
    }

    /// Decode an event into application state, dropping per-capability
    /// failures.
    pub fn decode(&self, event: &InboundEvent) -> PartialState {
        self.decode_with_errors(event).state
    }

    /// Decode an event, keeping per-capability failures.
    ///
    /// Every decoder registered for any address in the event runs once, in
    /// composition order. A failing decoder contributes no fields.
    pub fn decode_with_errors(&self, event: &InboundEvent) -> DecodeOutcome {
        let mut slots: Vec<usize> = event
            .addresses()
            .filter_map(|address| self.decode_table.get(&(address, event.kind)))
            .flatten()
            .copied()
            .collect();
        slots.sort_unstable();
        slots.dedup();

        let mut outcome = DecodeOutcome::default();
        if slots.is_empty() {
            trace!(
                "[{}] ignoring {} on {}/0x{:04X}",
                self.identity.model, event.kind, event.cluster, event.attribute
            );
            return outcome;
        }

        for index in slots {
            let capability = &self.capabilities[index];
            let Some(decoder) = &capability.decoder else {
                continue;
            };
            match decoder.decode(event) {
                Ok(partial) => outcome.state.extend(partial),
                Err(e) => {
                    debug!("[{}] {}", self.identity.model, e);
                    outcome.errors.push(e);
                }
            }
        }
        outcome
    }

    /// Encode a command for capability `name`.
    ///
    /// With `configure` set the call is treated as first-time
    /// configuration: report subscriptions of the capability are appended
    /// unless its reporting is disabled.
    pub fn encode(
        &self,
        name: &str,
        value: &Value,
        configure: Option<&dyn ReportingDefaults>,
    ) -> Result<Vec<WireOperation>, ConverterError> {
        let capability = self
            .encode_table
            .get(name)
            .map(|&index| &self.capabilities[index])
            .ok_or_else(|| ConverterError::CapabilityNotWritable(name.to_string()))?;
        let encoder = capability
            .encoder
            .as_ref()
            .ok_or_else(|| ConverterError::CapabilityNotWritable(name.to_string()))?;

        let mut operations = encoder.encode(value)?;
        if let Some(defaults) = configure {
            operations.extend(report_operations(capability, defaults));
        }
        Ok(operations)
    }

    /// Read operations refreshing capability `name`.
    pub fn read(&self, name: &str) -> Result<Vec<WireOperation>, ConverterError> {
        match self.capability(name) {
            Some(capability) if capability.is_readable() => Ok(capability
                .read_addresses
                .iter()
                .map(|address| WireOperation::Read { address: *address })
                .collect()),
            _ => Err(ConverterError::CapabilityNotReadable(name.to_string())),
        }
    }

    /// Report configuration for every capability, as issued when a device
    /// joins.
    pub fn configure(&self, defaults: &dyn ReportingDefaults) -> Vec<WireOperation> {
        self.capabilities
            .iter()
            .flat_map(|capability| report_operations(capability, defaults))
            .collect()
    }

    /// The decode dispatch table, sorted, for inspection.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .decode_table
            .iter()
            .map(|((address, kind), slots)| Route {
                address: *address,
                kind: kind.to_string(),
                capabilities: slots
                    .iter()
                    .map(|&slot| self.capabilities[slot].name.clone())
                    .collect(),
            })
            .collect();
        routes.sort();
        routes
    }
}

fn report_operations(
    capability: &Capability,
    defaults: &dyn ReportingDefaults,
) -> Vec<WireOperation> {
    capability
        .report_targets
        .iter()
        .filter_map(|target| {
            defaults
                .report_config(target)
                .map(|config| configure_operation(target, config))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::converter::{
        AccessMode, CapabilityDescriptor, EnumLookupArgs, Expose, ExposeKind, NumericArgs,
        ReportingPolicy, Scale, StaticReporting, compile,
    };
    use crate::definition::{DefinitionBuilder, Extend};
    use crate::error::ConverterError;
    use crate::zcl::{
        Cluster, InboundEvent, MessageKind, WireAddress, WireOperation, WireValue, attr,
    };
    use serde_json::json;

    const SECONDARY: u16 = 0x0041;

    fn numeric(name: &str, attribute: u16, access: AccessMode) -> crate::converter::Capability {
        let mut args = NumericArgs::new(name, Cluster::GenAnalogInput, attribute);
        args.access = access;
        compile(CapabilityDescriptor::numeric(args).unwrap())
    }

    fn status() -> crate::converter::Capability {
        compile(
            CapabilityDescriptor::enum_lookup(EnumLookupArgs::new(
                "status",
                Cluster::GenAnalogInput,
                attr::PRESENT_VALUE,
                [("OFF", 0), ("ON", 1)],
            ))
            .unwrap(),
        )
    }

    #[test]
    fn test_later_extend_overrides_in_place() {
        let definition = DefinitionBuilder::new("TEST")
            .extend(numeric("level", attr::PRESENT_VALUE, AccessMode::ReadReport))
            .extend(numeric("other", 0x0010, AccessMode::ReadReport))
            .extend(numeric("level", SECONDARY, AccessMode::ReadReport))
            .build()
            .unwrap();

        let names: Vec<&str> = definition.exposes().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["level", "other"]);

        let old = InboundEvent::report(
            Cluster::GenAnalogInput,
            [(attr::PRESENT_VALUE, WireValue::Int(5))],
        );
        assert!(definition.decode(&old).is_empty());

        let new = InboundEvent::report(Cluster::GenAnalogInput, [(SECONDARY, WireValue::Int(5))]);
        assert_eq!(definition.decode(&new).get("level"), Some(&json!(5)));
    }

    fn bounded_level(attribute: u16, max: f64, unit: &str, description: &str) -> crate::converter::Capability {
        compile(
            CapabilityDescriptor::numeric(NumericArgs {
                description: description.into(),
                unit: Some(unit.into()),
                access: AccessMode::ReadWrite,
                value_min: Some(0.0),
                value_max: Some(max),
                value_step: Some(1.0),
                ..NumericArgs::new("level", Cluster::GenAnalogInput, attribute)
            })
            .unwrap(),
        )
    }

    #[test]
    fn test_override_replaces_encoder_and_schema() {
        let definition = DefinitionBuilder::new("TEST")
            .extend(bounded_level(attr::PRESENT_VALUE, 10.0, "s", "first"))
            .extend(bounded_level(SECONDARY, 100.0, "%", "second"))
            .build()
            .unwrap();

        assert_eq!(
            definition.encode("level", &json!(50), None).unwrap(),
            vec![WireOperation::Write {
                address: WireAddress::new(Cluster::GenAnalogInput, SECONDARY),
                value: WireValue::Int(50),
            }]
        );
        assert!(matches!(
            definition.encode("level", &json!(101), None),
            Err(ConverterError::OutOfRange { max: Some(max), .. }) if max == 100.0
        ));

        let exposes: Vec<&Expose> = definition.exposes().collect();
        assert_eq!(exposes.len(), 1);
        assert_eq!(exposes[0].unit.as_deref(), Some("%"));
        assert_eq!(exposes[0].description, "second");
        assert_eq!(
            exposes[0].kind,
            ExposeKind::Numeric {
                value_min: Some(0.0),
                value_max: Some(100.0),
                value_step: Some(1.0),
            }
        );
        assert_eq!(
            definition.read("level").unwrap(),
            vec![WireOperation::Read {
                address: WireAddress::new(Cluster::GenAnalogInput, SECONDARY),
            }]
        );
    }

    #[test]
    fn test_read_only_override_drops_the_earlier_encoder() {
        let definition = DefinitionBuilder::new("TEST")
            .extend(bounded_level(attr::PRESENT_VALUE, 10.0, "s", "first"))
            .extend(numeric("level", SECONDARY, AccessMode::ReadReport))
            .build()
            .unwrap();
        assert_eq!(
            definition.encode("level", &json!(5), None),
            Err(ConverterError::CapabilityNotWritable("level".into()))
        );
        assert_eq!(definition.exposes().next().map(|e| e.access), Some(AccessMode::ReadReport));
    }

    #[test]
    fn test_duplicate_name_within_one_extend_is_rejected() {
        let result = DefinitionBuilder::new("TEST")
            .extend(
                Extend::new()
                    .with(numeric("level", attr::PRESENT_VALUE, AccessMode::ReadReport))
                    .with(numeric("level", SECONDARY, AccessMode::ReadReport)),
            )
            .build();
        assert_eq!(
            result.unwrap_err(),
            ConverterError::DuplicateCapabilityName("level".into())
        );
    }

    #[test]
    fn test_two_declarative_decoders_on_one_address_are_ambiguous() {
        let result = DefinitionBuilder::new("TEST")
            .extend(numeric("a", attr::PRESENT_VALUE, AccessMode::ReadReport))
            .extend(numeric("b", attr::PRESENT_VALUE, AccessMode::ReadReport))
            .build();
        assert!(matches!(
            result,
            Err(ConverterError::AmbiguousDispatch { ref first, ref second, .. })
                if first == "a" && second == "b"
        ));
    }

    #[test]
    fn test_failing_decoder_does_not_stop_siblings() {
        let definition = DefinitionBuilder::new("TEST")
            .extend(status())
            .extend(numeric("level", SECONDARY, AccessMode::ReadReport))
            .build()
            .unwrap();
        let event = InboundEvent::report(
            Cluster::GenAnalogInput,
            [
                (attr::PRESENT_VALUE, WireValue::Int(9)),
                (SECONDARY, WireValue::Int(12)),
            ],
        );

        let outcome = definition.decode_with_errors(&event);
        assert_eq!(outcome.state.get("level"), Some(&json!(12)));
        assert!(!outcome.state.contains_key("status"));
        assert_eq!(
            outcome.errors,
            vec![ConverterError::UnknownCode {
                capability: "status".into(),
                code: 9,
            }]
        );
    }

    #[test]
    fn test_unrouted_events_are_ignored() {
        let definition = DefinitionBuilder::new("TEST").extend(status()).build().unwrap();
        let event = InboundEvent::report(Cluster::GenBasic, [(0x0005, WireValue::Int(1))]);
        assert!(definition.decode(&event).is_empty());

        let echo = InboundEvent::new(
            Cluster::GenAnalogInput,
            MessageKind::WriteEcho,
            [(attr::PRESENT_VALUE, WireValue::Int(1))].into_iter().collect(),
        );
        assert!(definition.decode(&echo).is_empty());
    }

    #[test]
    fn test_encode_rejects_unknown_and_read_only_capabilities() {
        let definition = DefinitionBuilder::new("TEST").extend(status()).build().unwrap();
        assert_eq!(
            definition.encode("status", &json!("ON"), None),
            Err(ConverterError::CapabilityNotWritable("status".into()))
        );
        assert_eq!(
            definition.encode("missing", &json!(1), None),
            Err(ConverterError::CapabilityNotWritable("missing".into()))
        );
    }

    #[test]
    fn test_encode_with_configuration_appends_reporting() {
        let mut args = NumericArgs::new("setpoint", Cluster::GenAnalogOutput, attr::PRESENT_VALUE);
        args.access = AccessMode::ReadWrite;
        args.scale = Scale::Divide(10.0);
        let definition = DefinitionBuilder::new("TEST")
            .extend(compile(CapabilityDescriptor::numeric(args).unwrap()))
            .build()
            .unwrap();
        let address = WireAddress::new(Cluster::GenAnalogOutput, attr::PRESENT_VALUE);

        let plain = definition.encode("setpoint", &json!(2), None).unwrap();
        assert_eq!(
            plain,
            vec![WireOperation::Write {
                address,
                value: WireValue::Int(20),
            }]
        );

        let configured = definition
            .encode("setpoint", &json!(2), Some(&StaticReporting::default()))
            .unwrap();
        assert_eq!(configured.len(), 2);
        assert_eq!(
            configured[1],
            WireOperation::ConfigureReporting {
                address,
                min_interval: 10,
                max_interval: 3600,
                reportable_change: 10.0,
            }
        );
    }

    #[test]
    fn test_disabled_reporting_is_not_configured() {
        let mut args = NumericArgs::new("level", Cluster::GenAnalogInput, attr::PRESENT_VALUE);
        args.reporting = ReportingPolicy::Disabled;
        let definition = DefinitionBuilder::new("TEST")
            .extend(compile(CapabilityDescriptor::numeric(args).unwrap()))
            .extend(status_on(SECONDARY))
            .build()
            .unwrap();
        let operations = definition.configure(&StaticReporting::default());
        assert_eq!(operations.len(), 1);
        assert_eq!(
            operations[0].cluster(),
            Cluster::GenAnalogInput,
        );
    }

    fn status_on(attribute: u16) -> crate::converter::Capability {
        compile(
            CapabilityDescriptor::enum_lookup(EnumLookupArgs::new(
                "status",
                Cluster::GenAnalogInput,
                attribute,
                [("OFF", 0), ("ON", 1)],
            ))
            .unwrap(),
        )
    }

    #[test]
    fn test_read_requires_a_readable_capability() {
        let definition = DefinitionBuilder::new("TEST")
            .extend(numeric("level", attr::PRESENT_VALUE, AccessMode::ReadReport))
            .extend(numeric("trigger", SECONDARY, AccessMode::WriteOnly))
            .build()
            .unwrap();
        assert_eq!(
            definition.read("level").unwrap(),
            vec![WireOperation::Read {
                address: WireAddress::new(Cluster::GenAnalogInput, attr::PRESENT_VALUE),
            }]
        );
        assert_eq!(
            definition.read("trigger"),
            Err(ConverterError::CapabilityNotReadable("trigger".into()))
        );
    }

    #[test]
    fn test_zigbee_models_default_to_model() {
        let definition = DefinitionBuilder::new("TEST").extend(status()).build().unwrap();
        assert_eq!(definition.zigbee_models(), &["TEST".to_string()]);
        assert!(!definition.sleepy());
    }
}
