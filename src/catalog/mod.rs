//! Built-in device definitions.

pub mod pushok;

use crate::definition::DefinitionRegistry;
use crate::error::RegistryError;

/// Registry holding every built-in definition.
pub fn registry() -> Result<DefinitionRegistry, RegistryError> {
    let registry = DefinitionRegistry::new();
    for definition in pushok::definitions()? {
        registry.register(definition)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_registry_contains_all_models() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), 14);
        assert_eq!(registry.definitions().len(), 13);

        let soil = registry.lookup("POK002").unwrap();
        let twin = registry.lookup("POK007").unwrap();
        assert!(Arc::ptr_eq(&soil, &twin));
        assert_eq!(soil.model(), "POK002_POK007");
        assert!(registry.lookup("POK013").is_none());
    }
}
