//! Declarative capability descriptors.
//!
//! Each descriptor kind is built from an explicit argument record with named
//! fields. `*Args::new` fills the documented defaults; override fields with
//! struct update syntax:
//!
//! ```ignore
//! let stall_time = CapabilityDescriptor::numeric(NumericArgs {
//!     value_min: Some(0.0),
//!     value_max: Some(60.0),
//!     value_step: Some(1.0),
//!     access: AccessMode::ReadWrite,
//!     ..NumericArgs::new("stall_time", Cluster::GenMultistateValue, attr::PRESENT_VALUE)
//! })?;
//! ```
//!
//! Descriptors are validated eagerly and immutable afterwards.

use super::lookup::LookupTable;
use crate::error::ConverterError;
use crate::zcl::{Cluster, MessageKind, WireAddress};
use serde::{Serialize, Serializer};

/// Published in application state.
pub const ACCESS_STATE: u8 = 0b001;
/// Writable by the application.
pub const ACCESS_SET: u8 = 0b010;
/// Readable on demand.
pub const ACCESS_GET: u8 = 0b100;

const DECODE_REPORTED: &[MessageKind] = &[MessageKind::AttributeReport, MessageKind::ReadResponse];
const DECODE_POLLED: &[MessageKind] = &[MessageKind::ReadResponse];
const DECODE_ALL: &[MessageKind] = &[
    MessageKind::AttributeReport,
    MessageKind::ReadResponse,
    MessageKind::WriteEcho,
];

/// How the application may interact with a capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Readable, changes pushed by attribute reports.
    ReadReport,
    /// Readable on demand only, never reported autonomously.
    ReadOnlyPolled,
    /// Readable, reported and writable.
    ReadWrite,
    /// Writable only.
    WriteOnly,
}

impl AccessMode {
    /// Message kinds a decoder with this mode is dispatched for.
    pub fn message_kinds(self) -> &'static [MessageKind] {
        match self {
            AccessMode::ReadReport => DECODE_REPORTED,
            AccessMode::ReadOnlyPolled => DECODE_POLLED,
            AccessMode::ReadWrite => DECODE_ALL,
            AccessMode::WriteOnly => &[],
        }
    }

    pub fn readable(self) -> bool {
        !matches!(self, AccessMode::WriteOnly)
    }

    pub fn writable(self) -> bool {
        matches!(self, AccessMode::ReadWrite | AccessMode::WriteOnly)
    }

    /// Whether a report subscription may be established for this mode.
    pub fn reports(self) -> bool {
        matches!(self, AccessMode::ReadReport | AccessMode::ReadWrite)
    }

    /// Same mode with the write capability removed.
    pub fn read_only(self) -> Self {
        match self {
            AccessMode::ReadWrite => AccessMode::ReadReport,
            AccessMode::WriteOnly => AccessMode::ReadOnlyPolled,
            other => other,
        }
    }

    /// Schema bitmask (STATE=1, SET=2, GET=4).
    pub fn bits(self) -> u8 {
        match self {
            AccessMode::ReadReport => ACCESS_STATE | ACCESS_GET,
            AccessMode::ReadOnlyPolled => ACCESS_GET,
            AccessMode::ReadWrite => ACCESS_STATE | ACCESS_SET | ACCESS_GET,
            AccessMode::WriteOnly => ACCESS_SET,
        }
    }
}

impl Serialize for AccessMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

/// Whether the bridge configures autonomous reporting for a capability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportingPolicy {
    /// Use the reporting defaults of the device class.
    #[default]
    Default,
    /// Never configure reporting (sleepy battery devices).
    Disabled,
}

/// Fixed scaling between wire and application values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Scale {
    #[default]
    None,
    /// application = wire / n
    Divide(f64),
    /// application = wire × n
    Multiply(f64),
}

impl Scale {
    pub fn to_app(self, wire: f64) -> f64 {
        match self {
            Scale::None => wire,
            Scale::Divide(n) => wire / n,
            Scale::Multiply(n) => wire * n,
        }
    }

    /// Scaled attributes are integers on the wire, so scaled results are
    /// rounded to the nearest whole wire unit.
    pub fn to_wire(self, app: f64) -> f64 {
        match self {
            Scale::None => app,
            Scale::Divide(n) => (app * n).round(),
            Scale::Multiply(n) => (app / n).round(),
        }
    }

    fn factor(self) -> Option<f64> {
        match self {
            Scale::None => None,
            Scale::Divide(n) | Scale::Multiply(n) => Some(n),
        }
    }
}

/// Bounds and scaling of a numeric capability.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericDomain {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    /// Decimal places decoded values are rounded to.
    pub precision: Option<u32>,
    pub scale: Scale,
}

impl NumericDomain {
    /// Check `value` against bounds and step alignment.
    pub fn check(&self, capability: &str, value: f64) -> Result<(), ConverterError> {
        let out_of_range = || ConverterError::OutOfRange {
            capability: capability.to_string(),
            value,
            min: self.min,
            max: self.max,
            step: self.step,
        };

        if !value.is_finite() {
            return Err(out_of_range());
        }
        if self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max) {
            return Err(out_of_range());
        }
        if let Some(step) = self.step {
            let steps = (value - self.min.unwrap_or(0.0)) / step;
            if (steps - steps.round()).abs() > 1e-6 {
                return Err(out_of_range());
            }
        }
        Ok(())
    }

    /// Apply scale and precision to a raw wire number.
    pub fn decode(&self, raw: f64) -> f64 {
        let value = self.scale.to_app(raw);
        match self.precision {
            Some(places) => round_to(value, places),
            None => value,
        }
    }
}

/// Round `value` to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// One side of a binary capability.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryValue {
    pub label: String,
    pub code: i64,
}

impl BinaryValue {
    pub fn new(label: impl Into<String>, code: i64) -> Self {
        Self {
            label: label.into(),
            code,
        }
    }
}

/// Value domain of a capability.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueDomain {
    Numeric(NumericDomain),
    Enumerated(LookupTable),
    Binary { on: BinaryValue, off: BinaryValue },
}

/// Declarative description of one capability.
#[derive(Clone, Debug, PartialEq)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub address: WireAddress,
    pub domain: ValueDomain,
    pub access: AccessMode,
    pub reporting: ReportingPolicy,
    pub unit: Option<String>,
    pub description: String,
}

/// Arguments for a numeric capability.
///
/// Defaults: empty description, no unit, `ReadReport` access, unbounded,
/// no step, no scaling, no rounding, default reporting.
#[derive(Clone, Debug)]
pub struct NumericArgs {
    pub name: String,
    pub cluster: Cluster,
    pub attribute: u16,
    pub description: String,
    pub unit: Option<String>,
    pub access: AccessMode,
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
    pub value_step: Option<f64>,
    pub scale: Scale,
    pub precision: Option<u32>,
    pub reporting: ReportingPolicy,
}

impl NumericArgs {
    pub fn new(name: impl Into<String>, cluster: Cluster, attribute: u16) -> Self {
        Self {
            name: name.into(),
            cluster,
            attribute,
            description: String::new(),
            unit: None,
            access: AccessMode::ReadReport,
            value_min: None,
            value_max: None,
            value_step: None,
            scale: Scale::None,
            precision: None,
            reporting: ReportingPolicy::Default,
        }
    }
}

/// Arguments for an enumerated capability.
///
/// Defaults: empty description, `ReadReport` access, default reporting.
/// `lookup` must be filled in.
#[derive(Clone, Debug)]
pub struct EnumLookupArgs {
    pub name: String,
    pub cluster: Cluster,
    pub attribute: u16,
    pub lookup: Vec<(String, i64)>,
    pub description: String,
    pub unit: Option<String>,
    pub access: AccessMode,
    pub reporting: ReportingPolicy,
}

impl EnumLookupArgs {
    pub fn new<I, S>(name: impl Into<String>, cluster: Cluster, attribute: u16, lookup: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            cluster,
            attribute,
            lookup: lookup.into_iter().map(|(l, c)| (l.into(), c)).collect(),
            description: String::new(),
            unit: None,
            access: AccessMode::ReadReport,
            reporting: ReportingPolicy::Default,
        }
    }
}

/// Arguments for a binary capability.
///
/// Defaults: empty description, `ReadReport` access, default reporting.
#[derive(Clone, Debug)]
pub struct BinaryArgs {
    pub name: String,
    pub cluster: Cluster,
    pub attribute: u16,
    pub value_on: BinaryValue,
    pub value_off: BinaryValue,
    pub description: String,
    pub access: AccessMode,
    pub reporting: ReportingPolicy,
}

impl BinaryArgs {
    pub fn new(
        name: impl Into<String>,
        cluster: Cluster,
        attribute: u16,
        value_on: BinaryValue,
        value_off: BinaryValue,
    ) -> Self {
        Self {
            name: name.into(),
            cluster,
            attribute,
            value_on,
            value_off,
            description: String::new(),
            access: AccessMode::ReadReport,
            reporting: ReportingPolicy::Default,
        }
    }
}

impl CapabilityDescriptor {
    pub fn numeric(args: NumericArgs) -> Result<Self, ConverterError> {
        let invalid = |reason: String| ConverterError::InvalidDescriptor {
            name: args.name.clone(),
            reason,
        };

        check_name(&args.name)?;
        if let (Some(min), Some(max)) = (args.value_min, args.value_max)
            && min > max
        {
            return Err(invalid(format!("min {} is greater than max {}", min, max)));
        }
        if let Some(step) = args.value_step
            && !(step.is_finite() && step > 0.0)
        {
            return Err(invalid(format!("step {} must be positive", step)));
        }
        if let Some(factor) = args.scale.factor()
            && !(factor.is_finite() && factor > 0.0)
        {
            return Err(invalid(format!("scale factor {} must be positive", factor)));
        }
        for bound in [args.value_min, args.value_max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(invalid(format!("bound {} is not finite", bound)));
            }
        }

        Ok(Self {
            address: WireAddress::new(args.cluster, args.attribute),
            domain: ValueDomain::Numeric(NumericDomain {
                min: args.value_min,
                max: args.value_max,
                step: args.value_step,
                precision: args.precision,
                scale: args.scale,
            }),
            access: args.access,
            reporting: args.reporting,
            unit: args.unit,
            description: args.description,
            name: args.name,
        })
    }

    pub fn enum_lookup(args: EnumLookupArgs) -> Result<Self, ConverterError> {
        check_name(&args.name)?;
        let table = LookupTable::new(args.name.clone(), args.lookup)?;
        Ok(Self {
            address: WireAddress::new(args.cluster, args.attribute),
            domain: ValueDomain::Enumerated(table),
            access: args.access,
            reporting: args.reporting,
            unit: args.unit,
            description: args.description,
            name: args.name,
        })
    }

    pub fn binary(args: BinaryArgs) -> Result<Self, ConverterError> {
        check_name(&args.name)?;
        if args.value_on.code == args.value_off.code || args.value_on.label == args.value_off.label
        {
            return Err(ConverterError::AmbiguousLookupTable {
                name: args.name,
                reason: "on and off values must differ in both label and code".to_string(),
            });
        }
        Ok(Self {
            address: WireAddress::new(args.cluster, args.attribute),
            domain: ValueDomain::Binary {
                on: args.value_on,
                off: args.value_off,
            },
            access: args.access,
            reporting: args.reporting,
            unit: None,
            description: args.description,
            name: args.name,
        })
    }

    /// Whether compiling this descriptor yields a report subscription.
    pub fn wants_reporting(&self) -> bool {
        self.access.reports() && self.reporting == ReportingPolicy::Default
    }

    /// Scale applied between wire and application values.
    pub fn scale(&self) -> Scale {
        match &self.domain {
            ValueDomain::Numeric(domain) => domain.scale,
            _ => Scale::None,
        }
    }
}

fn check_name(name: &str) -> Result<(), ConverterError> {
    if name.trim().is_empty() {
        return Err(ConverterError::InvalidDescriptor {
            name: name.to_string(),
            reason: "name must not be empty".to_string(),
        });
    }
    Ok(())
}
