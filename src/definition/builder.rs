//! Ordered composition of capabilities into a device definition.

use super::device::{DeviceDefinition, DeviceIdentity};
use crate::converter::Capability;
use crate::error::ConverterError;
use log::debug;
use std::collections::{HashMap, HashSet};

/// One item of a composition list: one or more capabilities plus
/// pass-through flags.
#[derive(Clone, Debug, Default)]
pub struct Extend {
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) sleepy: bool,
}

impl Extend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Mark devices using this extend as sleepy; upstream code must not
    /// poll them.
    pub fn sleepy(mut self) -> Self {
        self.sleepy = true;
        self
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn is_sleepy(&self) -> bool {
        self.sleepy
    }
}

impl From<Capability> for Extend {
    fn from(capability: Capability) -> Self {
        Self::new().with(capability)
    }
}

/// Folds an ordered list of extends into a [`DeviceDefinition`].
///
/// A capability whose name was already declared by an earlier extend
/// replaces that capability entirely (decoder, encoder, schema and report
/// targets) and keeps its position in the schema.
#[derive(Debug)]
pub struct DefinitionBuilder {
    model: String,
    zigbee_models: Vec<String>,
    vendor: String,
    description: String,
    extends: Vec<Extend>,
    ota: bool,
}

impl DefinitionBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            zigbee_models: Vec::new(),
            vendor: String::new(),
            description: String::new(),
            extends: Vec::new(),
            ota: false,
        }
    }

    /// Model identifiers reported by devices of this definition. Defaults
    /// to the model name when none are given.
    pub fn zigbee_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zigbee_models.extend(models.into_iter().map(Into::into));
        self
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn extend(mut self, extend: impl Into<Extend>) -> Self {
        self.extends.push(extend.into());
        self
    }

    pub fn ota(mut self, ota: bool) -> Self {
        self.ota = ota;
        self
    }

    pub fn build(self) -> Result<DeviceDefinition, ConverterError> {
        let mut capabilities: Vec<Capability> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut sleepy = false;

        for extend in self.extends {
            sleepy |= extend.sleepy;
            let mut declared = HashSet::new();
            for capability in extend.capabilities {
                if !declared.insert(capability.name.clone()) {
                    return Err(ConverterError::DuplicateCapabilityName(capability.name));
                }
                match positions.get(&capability.name) {
                    Some(&position) => {
                        debug!(
                            "[{}] capability '{}' overrides an earlier declaration",
                            self.model, capability.name
                        );
                        capabilities[position] = capability;
                    }
                    None => {
                        positions.insert(capability.name.clone(), capabilities.len());
                        capabilities.push(capability);
                    }
                }
            }
        }

        let zigbee_models = if self.zigbee_models.is_empty() {
            vec![self.model.clone()]
        } else {
            self.zigbee_models
        };

        DeviceDefinition::assemble(
            DeviceIdentity {
                model: self.model,
                zigbee_models,
                vendor: self.vendor,
                description: self.description,
                ota: self.ota,
                sleepy,
            },
            capabilities,
        )
    }
}
