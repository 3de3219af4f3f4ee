//! Per-device state kept by the bridge.

use crate::converter::PartialState;
use crate::definition::DeviceDefinition;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// A device known to the bridge, bound to its definition.
#[derive(Debug)]
pub struct DeviceSession {
    id: String,
    definition: Arc<DeviceDefinition>,
    state: PartialState,
    /// Capabilities whose reporting was already configured.
    configured: HashSet<String>,
    last_seen: Option<DateTime<Utc>>,
}

impl DeviceSession {
    pub fn new(id: impl Into<String>, definition: Arc<DeviceDefinition>) -> Self {
        Self {
            id: id.into(),
            definition,
            state: PartialState::new(),
            configured: HashSet::new(),
            last_seen: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn definition(&self) -> &Arc<DeviceDefinition> {
        &self.definition
    }

    pub fn state(&self) -> &PartialState {
        &self.state
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Merge freshly decoded fields into the accumulated state.
    pub fn apply(&mut self, partial: PartialState, now: DateTime<Utc>) {
        self.state.extend(partial);
        self.last_seen = Some(now);
    }

    /// Marks `capability` configured; true if it was not before.
    pub fn mark_configured(&mut self, capability: &str) -> bool {
        self.configured.insert(capability.to_string())
    }

    pub fn is_configured(&self, capability: &str) -> bool {
        self.configured.contains(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::pushok;
    use serde_json::json;

    #[test]
    fn test_apply_merges_state() {
        let mut session = DeviceSession::new("soil", Arc::new(pushok::pok002_pok007().unwrap()));
        let now = Utc::now();

        let mut first = PartialState::new();
        first.insert("temperature".into(), json!(21.5));
        session.apply(first, now);

        let mut second = PartialState::new();
        second.insert("humidity".into(), json!(40));
        second.insert("temperature".into(), json!(22));
        session.apply(second, now);

        assert_eq!(session.state().get("temperature"), Some(&json!(22)));
        assert_eq!(session.state().get("humidity"), Some(&json!(40)));
        assert_eq!(session.last_seen(), Some(now));
    }

    #[test]
    fn test_configured_once() {
        let mut session = DeviceSession::new("soil", Arc::new(pushok::pok002_pok007().unwrap()));
        assert!(!session.is_configured("humidity"));
        assert!(session.mark_configured("humidity"));
        assert!(!session.mark_configured("humidity"));
        assert!(session.is_configured("humidity"));
    }
}
