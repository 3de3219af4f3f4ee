use crate::zcl::{MessageKind, WireAddress};
use thiserror::Error as ThisError;

/// Errors raised while compiling, composing, decoding or encoding capabilities.
///
/// Construction-time variants (`AmbiguousLookupTable`, `InvalidDescriptor`,
/// `DuplicateCapabilityName`, `AmbiguousDispatch`) abort building a device
/// definition. Decode variants are recovered per capability by the
/// composition engine. Encode variants are returned to the caller before
/// any wire operation exists.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum ConverterError {
    #[error("unknown label '{label}' for capability '{capability}'")]
    UnknownLabel { capability: String, label: String },

    #[error("unknown wire code {code} for capability '{capability}'")]
    UnknownCode { capability: String, code: i64 },

    #[error("value {value} out of range for capability '{capability}' (min {min:?}, max {max:?}, step {step:?})")]
    OutOfRange {
        capability: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },

    #[error("wire value {value} matches neither defined code of capability '{capability}'")]
    DecodeMismatch { capability: String, value: String },

    #[error("capability '{0}' is not writable")]
    CapabilityNotWritable(String),

    #[error("capability '{0}' is not readable")]
    CapabilityNotReadable(String),

    #[error("invalid value for capability '{capability}': expected {expected}, got {got}")]
    InvalidValue {
        capability: String,
        expected: &'static str,
        got: String,
    },

    #[error("report for capability '{capability}' is missing mandatory field {address}")]
    MissingField {
        capability: String,
        address: WireAddress,
    },

    #[error("capability name '{0}' declared twice in one composition item")]
    DuplicateCapabilityName(String),

    #[error("lookup table for '{name}' is not bijective: {reason}")]
    AmbiguousLookupTable { name: String, reason: String },

    #[error("invalid descriptor '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("capabilities '{first}' and '{second}' both decode {address} ({kind})")]
    AmbiguousDispatch {
        address: WireAddress,
        kind: MessageKind,
        first: String,
        second: String,
    },

    #[error("unknown cluster: {0}")]
    UnknownCluster(String),
}

/// Errors raised by the device definition registry.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// A model identifier is already claimed by another definition.
    #[error("model '{model}' is already registered by definition '{existing}'")]
    DuplicateModel { model: String, existing: String },

    #[error(transparent)]
    Definition(#[from] ConverterError),
}

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown device model: {0}")]
    UnknownModel(String),

    #[error("MQTT client error: {0}")]
    MqttClient(#[from] rumqttc::ClientError),

    #[error(transparent)]
    Converter(#[from] ConverterError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
