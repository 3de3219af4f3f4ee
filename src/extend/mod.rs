//! Reusable composition items.
//!
//! Each function returns an [`Extend`] ready to be passed to
//! [`DefinitionBuilder::extend`](crate::definition::DefinitionBuilder::extend).

mod battery;
mod ias_zone;
mod identify;
mod measurement;
mod on_off;

pub use battery::{BatteryArgs, battery};
pub use ias_zone::{IasZoneArgs, IasZoneAttribute, IasZoneType, ias_zone_alarm};
pub use identify::{IDENTIFY_SECONDS, IdentifyArgs, identify};
pub use measurement::{humidity, illuminance, temperature};
pub use on_off::{OnOffArgs, on_off};

use crate::converter::{BinaryArgs, CapabilityDescriptor, EnumLookupArgs, NumericArgs, compile};
use crate::definition::Extend;
use crate::error::ConverterError;

/// Single numeric capability.
pub fn numeric(args: NumericArgs) -> Result<Extend, ConverterError> {
    Ok(compile(CapabilityDescriptor::numeric(args)?).into())
}

/// Single enumerated capability.
pub fn enum_lookup(args: EnumLookupArgs) -> Result<Extend, ConverterError> {
    Ok(compile(CapabilityDescriptor::enum_lookup(args)?).into())
}

/// Single two-valued capability.
pub fn binary(args: BinaryArgs) -> Result<Extend, ConverterError> {
    Ok(compile(CapabilityDescriptor::binary(args)?).into())
}
