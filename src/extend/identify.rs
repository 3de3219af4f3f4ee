//! Identify trigger.

use crate::converter::{AccessMode, CustomConverter, Encoder, Expose};
use crate::definition::Extend;
use crate::error::ConverterError;
use crate::zcl::{Cluster, WireOperation, WireValue, cmd};
use serde_json::Value;

/// Identify time sent with the Identify command.
pub const IDENTIFY_SECONDS: i64 = 3;

#[derive(Clone, Copy, Debug, Default)]
pub struct IdentifyArgs {
    /// The device sleeps between reports.
    pub is_sleepy: bool,
}

struct IdentifyCommand;

impl Encoder for IdentifyCommand {
    fn capability(&self) -> &str {
        "identify"
    }

    fn encode(&self, value: &Value) -> Result<Vec<WireOperation>, ConverterError> {
        match value.as_str() {
            Some("identify") => Ok(vec![WireOperation::Command {
                cluster: Cluster::GenIdentify,
                command: cmd::IDENTIFY,
                args: vec![WireValue::Int(IDENTIFY_SECONDS)],
            }]),
            _ => Err(ConverterError::UnknownLabel {
                capability: "identify".to_string(),
                label: value.as_str().map_or_else(|| value.to_string(), str::to_string),
            }),
        }
    }
}

pub fn identify(args: IdentifyArgs) -> Extend {
    let capability = CustomConverter::new("identify")
        .encoder(IdentifyCommand)
        .expose(
            Expose::enumeration("identify", AccessMode::WriteOnly, ["identify"])
                .with_description("Initiate device identification"),
        )
        .build();
    let extend = Extend::from(capability);
    if args.is_sleepy { extend.sleepy() } else { extend }
}
