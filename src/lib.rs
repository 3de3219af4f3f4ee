//! Zigbee capability bridge library.
//!
//! Compiles declarative capability descriptors into converter pairs,
//! composes them into device definitions and bridges devices to
//! applications over MQTT.

pub mod catalog;
pub mod config;
pub mod converter;
pub mod definition;
pub mod error;
pub mod extend;
pub mod input;
pub mod zcl;
