//! MQTT surface of the bridge.
//!
//! Device events arrive from the Zigbee transport, are decoded through the
//! device's definition and published as application state; application
//! commands are encoded into wire operations for the transport.

mod client;
mod integration;
mod router;
mod session;

pub use client::{MqttClient, MqttMessage, Publisher};
pub use integration::MqttIntegration;
pub use router::{BridgeRouter, Outgoing};
pub use session::DeviceSession;
