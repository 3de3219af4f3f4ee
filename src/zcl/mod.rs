//! Zigbee Cluster Library identifiers and the message shapes exchanged with
//! the transport layer.
//!
//! The transport is external: it hands the bridge parsed [`InboundEvent`]s
//! and performs the [`WireOperation`]s the converters produce.

mod cluster;
mod message;

pub use cluster::{Cluster, WireAddress, attr, cmd, parse_u16};
pub use message::{AttributePayload, InboundEvent, MessageKind, WireOperation, WireValue};
