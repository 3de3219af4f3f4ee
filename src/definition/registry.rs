//! Model-id → definition lookup shared by every device session.

use super::device::DeviceDefinition;
use crate::error::RegistryError;
use log::info;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Thread-safe registry of device definitions.
///
/// A definition is registered once and shared through an [`Arc`] by every
/// model id it claims.
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    by_model: RwLock<HashMap<String, Arc<DeviceDefinition>>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition` under every id in its `zigbee_models`.
    ///
    /// Nothing is inserted if any id is already claimed.
    pub fn register(&self, definition: DeviceDefinition) -> Result<Arc<DeviceDefinition>, RegistryError> {
        let definition = Arc::new(definition);
        let mut by_model = self.by_model.write();

        for model in definition.zigbee_models() {
            if let Some(existing) = by_model.get(model) {
                return Err(RegistryError::DuplicateModel {
                    model: model.clone(),
                    existing: existing.model().to_string(),
                });
            }
        }
        for model in definition.zigbee_models() {
            by_model.insert(model.clone(), definition.clone());
        }

        info!(
            "[Registry] Registered {} ({})",
            definition.model(),
            definition.zigbee_models().join(", ")
        );
        Ok(definition)
    }

    pub fn lookup(&self, model: &str) -> Option<Arc<DeviceDefinition>> {
        self.by_model.read().get(model).cloned()
    }

    /// Every registered model id, sorted.
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.by_model.read().keys().cloned().collect();
        models.sort();
        models
    }

    /// Distinct definitions, ordered by their model name.
    pub fn definitions(&self) -> Vec<Arc<DeviceDefinition>> {
        let mut definitions: Vec<Arc<DeviceDefinition>> = Vec::new();
        for definition in self.by_model.read().values() {
            if !definitions.iter().any(|d| Arc::ptr_eq(d, definition)) {
                definitions.push(definition.clone());
            }
        }
        definitions.sort_by(|a, b| a.model().cmp(b.model()));
        definitions
    }

    pub fn len(&self) -> usize {
        self.by_model.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_model.read().is_empty()
    }
}
