//! Schema entries ("exposes") consumed by the presentation layer.

use super::descriptor::{AccessMode, CapabilityDescriptor, ValueDomain};
use serde::Serialize;
use serde_json::Value;

/// Type-specific part of a schema entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExposeKind {
    Numeric {
        #[serde(skip_serializing_if = "Option::is_none")]
        value_min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value_max: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value_step: Option<f64>,
    },
    Enum {
        values: Vec<String>,
    },
    Binary {
        value_on: Value,
        value_off: Value,
    },
}

/// One capability as presented to applications.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Expose {
    pub name: String,
    #[serde(flatten)]
    pub kind: ExposeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub description: String,
    pub access: AccessMode,
}

impl Expose {
    pub fn numeric(name: impl Into<String>, access: AccessMode) -> Self {
        Self {
            name: name.into(),
            kind: ExposeKind::Numeric {
                value_min: None,
                value_max: None,
                value_step: None,
            },
            unit: None,
            description: String::new(),
            access,
        }
    }

    pub fn binary(
        name: impl Into<String>,
        access: AccessMode,
        value_on: impl Into<Value>,
        value_off: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ExposeKind::Binary {
                value_on: value_on.into(),
                value_off: value_off.into(),
            },
            unit: None,
            description: String::new(),
            access,
        }
    }

    pub fn enumeration<I, S>(name: impl Into<String>, access: AccessMode, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: ExposeKind::Enum {
                values: values.into_iter().map(Into::into).collect(),
            },
            unit: None,
            description: String::new(),
            access,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Numeric bounds; ignored for non-numeric exposes.
    pub fn with_value_range(mut self, min: f64, max: f64) -> Self {
        if let ExposeKind::Numeric {
            value_min,
            value_max,
            ..
        } = &mut self.kind
        {
            *value_min = Some(min);
            *value_max = Some(max);
        }
        self
    }

    /// Type name as exported in the schema.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ExposeKind::Numeric { .. } => "numeric",
            ExposeKind::Enum { .. } => "enum",
            ExposeKind::Binary { .. } => "binary",
        }
    }
}

impl From<&CapabilityDescriptor> for Expose {
    fn from(descriptor: &CapabilityDescriptor) -> Self {
        let kind = match &descriptor.domain {
            ValueDomain::Numeric(domain) => ExposeKind::Numeric {
                value_min: domain.min,
                value_max: domain.max,
                value_step: domain.step,
            },
            ValueDomain::Enumerated(table) => ExposeKind::Enum {
                values: table.labels().map(str::to_string).collect(),
            },
            ValueDomain::Binary { on, off } => ExposeKind::Binary {
                value_on: Value::String(on.label.clone()),
                value_off: Value::String(off.label.clone()),
            },
        };
        Self {
            name: descriptor.name.clone(),
            kind,
            unit: descriptor.unit.clone(),
            description: descriptor.description.clone(),
            access: descriptor.access,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::descriptor::{EnumLookupArgs, NumericArgs};
    use crate::zcl::{Cluster, attr};
    use serde_json::json;

    #[test]
    fn test_numeric_expose_from_descriptor() {
        let descriptor = CapabilityDescriptor::numeric(NumericArgs {
            description: "Endstop lag angle".into(),
            unit: Some("°".into()),
            access: AccessMode::ReadWrite,
            value_min: Some(0.0),
            value_max: Some(15.0),
            value_step: Some(1.0),
            ..NumericArgs::new("end_lag", Cluster::GenAnalogValue, attr::PRESENT_VALUE)
        })
        .unwrap();

        let expose = Expose::from(&descriptor);
        assert_eq!(
            serde_json::to_value(&expose).unwrap(),
            json!({
                "name": "end_lag",
                "type": "numeric",
                "value_min": 0.0,
                "value_max": 15.0,
                "value_step": 1.0,
                "unit": "°",
                "description": "Endstop lag angle",
                "access": 7
            })
        );
    }

    #[test]
    fn test_enum_expose_lists_labels_in_order() {
        let descriptor = CapabilityDescriptor::enum_lookup(EnumLookupArgs::new(
            "voltage_type",
            Cluster::GenMultistateOutput,
            attr::PRESENT_VALUE,
            [("AC", 0), ("DC", 1)],
        ))
        .unwrap();
        let expose = Expose::from(&descriptor);
        assert_eq!(expose.type_name(), "enum");
        let json = serde_json::to_value(&expose).unwrap();
        assert_eq!(json["values"], json!(["AC", "DC"]));
        assert_eq!(json["access"], 5);
        assert!(json.get("unit").is_none());
    }

    #[test]
    fn test_builder_helpers() {
        let expose = Expose::binary("battery_low", AccessMode::ReadReport, true, false)
            .with_description("Empty battery indicator");
        let json = serde_json::to_value(&expose).unwrap();
        assert_eq!(json["type"], "binary");
        assert_eq!(json["value_on"], true);

        let ranged = Expose::numeric("battery", AccessMode::ReadReport)
            .with_unit("%")
            .with_value_range(0.0, 100.0);
        assert_eq!(
            ranged.kind,
            ExposeKind::Numeric {
                value_min: Some(0.0),
                value_max: Some(100.0),
                value_step: None
            }
        );
    }
}
