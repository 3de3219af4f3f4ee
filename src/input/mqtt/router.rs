//! Topic routing between the MQTT transport and device definitions.
//!
//! Topics, relative to the base topic:
//!
//! | topic                  | direction | payload                                   |
//! |------------------------|-----------|-------------------------------------------|
//! | `devices/<id>/event`   | in        | `{model, cluster, attribute, kind, payload}` |
//! | `<id>/set`             | in        | `{capability: value, ...}`                |
//! | `<id>/get`             | in        | `{capability: "", ...}`                   |
//! | `<id>`                 | out       | accumulated state plus `last_seen`        |
//! | `devices/<id>/operations` | out    | array of wire operations                  |

use super::session::DeviceSession;
use crate::converter::{PartialState, ReportingDefaults};
use crate::definition::DefinitionRegistry;
use crate::zcl::{AttributePayload, Cluster, InboundEvent, MessageKind, WireOperation};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A message the bridge wants published.
#[derive(Clone, Debug, PartialEq)]
pub struct Outgoing {
    pub topic: String,
    pub payload: String,
}

/// Device event as delivered by the Zigbee transport.
#[derive(Debug, Deserialize)]
struct EventMessage {
    model: String,
    cluster: Cluster,
    attribute: Option<u16>,
    #[serde(default = "default_kind")]
    kind: MessageKind,
    #[serde(default)]
    payload: AttributePayload,
}

fn default_kind() -> MessageKind {
    MessageKind::AttributeReport
}

impl EventMessage {
    fn into_event(self) -> InboundEvent {
        let mut event = InboundEvent::new(self.cluster, self.kind, self.payload);
        if let Some(attribute) = self.attribute {
            event.attribute = attribute;
        }
        event
    }
}

enum Route<'a> {
    Event(&'a str),
    Set(&'a str),
    Get(&'a str),
}

/// Synchronous core of the bridge: turns one inbound MQTT message into the
/// messages to publish.
pub struct BridgeRouter {
    base_topic: String,
    registry: Arc<DefinitionRegistry>,
    reporting: Arc<dyn ReportingDefaults>,
    sessions: HashMap<String, DeviceSession>,
}

impl BridgeRouter {
    pub fn new(
        base_topic: impl Into<String>,
        registry: Arc<DefinitionRegistry>,
        reporting: Arc<dyn ReportingDefaults>,
    ) -> Self {
        Self {
            base_topic: base_topic.into(),
            registry,
            reporting,
            sessions: HashMap::new(),
        }
    }

    /// Topic filters the bridge must subscribe to.
    pub fn subscriptions(&self) -> Vec<String> {
        vec![
            format!("{}/devices/+/event", self.base_topic),
            format!("{}/+/set", self.base_topic),
            format!("{}/+/get", self.base_topic),
        ]
    }

    pub fn session(&self, id: &str) -> Option<&DeviceSession> {
        self.sessions.get(id)
    }

    pub fn handle(&mut self, topic: &str, payload: &str, now: DateTime<Utc>) -> Vec<Outgoing> {
        match self.route(topic) {
            Some(Route::Event(id)) => self.handle_event(id, payload, now),
            Some(Route::Set(id)) => self.handle_set(id, payload),
            Some(Route::Get(id)) => self.handle_get(id, payload),
            None => {
                debug!("[Bridge] Ignoring message on {}", topic);
                Vec::new()
            }
        }
    }

    fn route<'a>(&self, topic: &'a str) -> Option<Route<'a>> {
        let rest = topic
            .strip_prefix(self.base_topic.as_str())?
            .strip_prefix('/')?;

        if let Some(id) = rest
            .strip_prefix("devices/")
            .and_then(|r| r.strip_suffix("/event"))
        {
            return valid_id(id).map(Route::Event);
        }
        if let Some(id) = rest.strip_suffix("/set") {
            return valid_id(id).map(Route::Set);
        }
        if let Some(id) = rest.strip_suffix("/get") {
            return valid_id(id).map(Route::Get);
        }
        None
    }

    fn handle_event(&mut self, id: &str, payload: &str, now: DateTime<Utc>) -> Vec<Outgoing> {
        let message: EventMessage = match serde_json::from_str(payload) {
            Ok(m) => m,
            Err(e) => {
                warn!("[Bridge] Failed to parse event from {}: {}", id, e);
                return Vec::new();
            }
        };

        let rebind = self
            .sessions
            .get(id)
            .is_none_or(|s| !s.definition().zigbee_models().contains(&message.model));
        if rebind {
            let Some(definition) = self.registry.lookup(&message.model) else {
                warn!("[Bridge] Unknown model '{}' for device {}", message.model, id);
                return Vec::new();
            };
            info!("[Bridge] Device {} bound to {}", id, definition.model());
            self.sessions
                .insert(id.to_string(), DeviceSession::new(id, definition));
        }
        let Some(session) = self.sessions.get_mut(id) else {
            return Vec::new();
        };

        let event = message.into_event();
        let partial = session.definition().decode(&event);
        if partial.is_empty() {
            return Vec::new();
        }
        session.apply(partial, now);

        let mut state = session.state().clone();
        state.insert(
            "last_seen".into(),
            Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        vec![Outgoing {
            topic: format!("{}/{}", self.base_topic, id),
            payload: Value::Object(state).to_string(),
        }]
    }

    fn handle_set(&mut self, id: &str, payload: &str) -> Vec<Outgoing> {
        let Some(command) = parse_object(id, payload) else {
            return Vec::new();
        };
        let Some(session) = self.sessions.get_mut(id) else {
            warn!("[Bridge] Command for unknown device {}", id);
            return Vec::new();
        };

        let mut operations = Vec::new();
        for (name, value) in &command {
            let first_time = !session.is_configured(name);
            let configure = first_time.then_some(self.reporting.as_ref());
            match session.definition().encode(name, value, configure) {
                Ok(ops) => {
                    if first_time {
                        session.mark_configured(name);
                    }
                    operations.extend(ops);
                }
                Err(e) => warn!("[Bridge] Rejected {}.{} = {}: {}", id, name, value, e),
            }
        }
        self.operations(id, operations)
    }

    fn handle_get(&mut self, id: &str, payload: &str) -> Vec<Outgoing> {
        let Some(request) = parse_object(id, payload) else {
            return Vec::new();
        };
        let Some(session) = self.sessions.get(id) else {
            warn!("[Bridge] Read for unknown device {}", id);
            return Vec::new();
        };
        if session.definition().sleepy() {
            debug!("[Bridge] {} is sleepy, reads are answered on wake-up", id);
        }

        let mut operations = Vec::new();
        for name in request.keys() {
            match session.definition().read(name) {
                Ok(ops) => operations.extend(ops),
                Err(e) => warn!("[Bridge] Cannot read {}.{}: {}", id, name, e),
            }
        }
        self.operations(id, operations)
    }

    fn operations(&self, id: &str, operations: Vec<WireOperation>) -> Vec<Outgoing> {
        if operations.is_empty() {
            return Vec::new();
        }
        match serde_json::to_string(&operations) {
            Ok(payload) => vec![Outgoing {
                topic: format!("{}/devices/{}/operations", self.base_topic, id),
                payload,
            }],
            Err(e) => {
                warn!("[Bridge] Failed to serialize operations for {}: {}", id, e);
                Vec::new()
            }
        }
    }
}

fn valid_id(id: &str) -> Option<&str> {
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

fn parse_object(id: &str, payload: &str) -> Option<PartialState> {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            warn!("[Bridge] Expected a JSON object for {}, got {}", id, other);
            None
        }
        Err(e) => {
            warn!("[Bridge] Failed to parse payload for {}: {}", id, e);
            None
        }
    }
}
