//! Input sources feeding the bridge.

pub mod mqtt;
