//! Switchable output on genOnOff.
//!
//! The onOff attribute is read-only on the wire, so `state` is set through
//! the On/Off/Toggle cluster commands instead of an attribute write.

use crate::converter::{
    AccessMode, BinaryArgs, BinaryValue, CapabilityDescriptor, EnumLookupArgs, Encoder,
    ReportingPolicy, compile,
};
use crate::definition::Extend;
use crate::error::ConverterError;
use crate::zcl::{Cluster, WireOperation, attr, cmd};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
pub struct OnOffArgs {
    /// Also expose the start-up behaviour after power loss.
    pub power_on_behavior: bool,
    pub configure_reporting: bool,
}

impl Default for OnOffArgs {
    fn default() -> Self {
        Self {
            power_on_behavior: true,
            configure_reporting: true,
        }
    }
}

struct StateCommand;

impl Encoder for StateCommand {
    fn capability(&self) -> &str {
        "state"
    }

    fn encode(&self, value: &Value) -> Result<Vec<WireOperation>, ConverterError> {
        let label = value.as_str().ok_or_else(|| ConverterError::InvalidValue {
            capability: "state".to_string(),
            expected: "ON, OFF or TOGGLE",
            got: value.to_string(),
        })?;
        let command = match label.to_ascii_uppercase().as_str() {
            "ON" => cmd::ON,
            "OFF" => cmd::OFF,
            "TOGGLE" => cmd::TOGGLE,
            _ => {
                return Err(ConverterError::UnknownLabel {
                    capability: "state".to_string(),
                    label: label.to_string(),
                });
            }
        };
        Ok(vec![WireOperation::Command {
            cluster: Cluster::GenOnOff,
            command,
            args: Vec::new(),
        }])
    }
}

pub fn on_off(args: OnOffArgs) -> Result<Extend, ConverterError> {
    let mut state = BinaryArgs::new(
        "state",
        Cluster::GenOnOff,
        attr::ON_OFF,
        BinaryValue::new("ON", 1),
        BinaryValue::new("OFF", 0),
    );
    state.description = "On/off state of the switch".to_string();
    state.access = AccessMode::ReadWrite;
    if !args.configure_reporting {
        state.reporting = ReportingPolicy::Disabled;
    }

    let mut extend = Extend::new()
        .with(compile(CapabilityDescriptor::binary(state)?).with_encoder(Arc::new(StateCommand)));

    if args.power_on_behavior {
        let mut behavior = EnumLookupArgs::new(
            "power_on_behavior",
            Cluster::GenOnOff,
            attr::START_UP_ON_OFF,
            [("off", 0), ("on", 1), ("toggle", 2), ("previous", 255)],
        );
        behavior.description = "Controls the behavior when the device is powered on after power loss".to_string();
        behavior.access = AccessMode::ReadWrite;
        behavior.reporting = ReportingPolicy::Disabled;
        extend = extend.with(compile(CapabilityDescriptor::enum_lookup(behavior)?));
    }
    Ok(extend)
}
