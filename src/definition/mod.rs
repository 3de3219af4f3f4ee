//! Composition engine: folds ordered extends into immutable device
//! definitions and keeps them in a shared registry.

mod builder;
mod device;
mod registry;

pub use builder::{DefinitionBuilder, Extend};
pub use device::{DecodeOutcome, DeviceDefinition, DeviceIdentity, Route};
pub use registry::DefinitionRegistry;
