//! The unit the composition engine merges: one named capability with its
//! converters, schema entries and report/read targets.

use super::descriptor::Scale;
use super::expose::Expose;
use super::{Decoder, Encoder};
use crate::zcl::WireAddress;
use std::fmt;
use std::sync::Arc;

/// Where a capability's converters came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapabilityOrigin {
    /// Compiled from a single descriptor.
    Declarative,
    /// Hand-written converter, possibly reading several attributes.
    Custom,
}

/// An attribute the bridge may subscribe to reports for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportTarget {
    pub address: WireAddress,
    /// Scale of the application value, used to express the reportable
    /// change in wire units.
    pub scale: Scale,
}

/// Compiled capability: converter pair plus schema.
#[derive(Clone)]
pub struct Capability {
    pub(crate) name: String,
    pub(crate) origin: CapabilityOrigin,
    pub(crate) decoder: Option<Arc<dyn Decoder>>,
    pub(crate) encoder: Option<Arc<dyn Encoder>>,
    pub(crate) exposes: Vec<Expose>,
    pub(crate) report_targets: Vec<ReportTarget>,
    pub(crate) read_addresses: Vec<WireAddress>,
}

impl Capability {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> CapabilityOrigin {
        self.origin
    }

    pub fn decoder(&self) -> Option<&Arc<dyn Decoder>> {
        self.decoder.as_ref()
    }

    pub fn encoder(&self) -> Option<&Arc<dyn Encoder>> {
        self.encoder.as_ref()
    }

    pub fn exposes(&self) -> &[Expose] {
        &self.exposes
    }

    pub fn report_targets(&self) -> &[ReportTarget] {
        &self.report_targets
    }

    pub fn read_addresses(&self) -> &[WireAddress] {
        &self.read_addresses
    }

    pub fn is_writable(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn is_readable(&self) -> bool {
        !self.read_addresses.is_empty()
    }

    /// Replace the encoder, e.g. to issue cluster commands instead of
    /// attribute writes. The origin describes the decoder and is kept.
    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Drop every report subscription of this capability.
    pub fn without_reporting(mut self) -> Self {
        self.report_targets.clear();
        self
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("decoder", &self.decoder.as_ref().map(|d| d.addresses()))
            .field("writable", &self.encoder.is_some())
            .field("exposes", &self.exposes)
            .field("report_targets", &self.report_targets)
            .field("read_addresses", &self.read_addresses)
            .finish()
    }
}
