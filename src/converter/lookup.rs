//! Bidirectional label ↔ wire code table for enumerated capabilities.

use crate::error::ConverterError;
use std::collections::HashMap;

/// Immutable bijective mapping between symbolic labels and wire codes.
///
/// Label order is preserved so the exported schema lists values in the
/// order they were declared.
#[derive(Clone, Debug, PartialEq)]
pub struct LookupTable {
    name: String,
    entries: Vec<(String, i64)>,
    by_label: HashMap<String, i64>,
    by_code: HashMap<i64, String>,
}

impl LookupTable {
    /// Build a table from `(label, code)` pairs.
    ///
    /// Fails with `AmbiguousLookupTable` if a label or a code appears twice,
    /// or if the table is empty.
    pub fn new<I, S>(name: impl Into<String>, entries: I) -> Result<Self, ConverterError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut table = Self {
            name,
            entries: Vec::new(),
            by_label: HashMap::new(),
            by_code: HashMap::new(),
        };

        for (label, code) in entries {
            let label = label.into();
            if table.by_label.contains_key(&label) {
                return Err(table.ambiguous(format!("label '{}' appears twice", label)));
            }
            if let Some(other) = table.by_code.get(&code) {
                return Err(table.ambiguous(format!(
                    "code {} is shared by '{}' and '{}'",
                    code, other, label
                )));
            }
            table.by_label.insert(label.clone(), code);
            table.by_code.insert(code, label.clone());
            table.entries.push((label, code));
        }

        if table.entries.is_empty() {
            return Err(table.ambiguous("table has no entries".to_string()));
        }

        Ok(table)
    }

    fn ambiguous(&self, reason: String) -> ConverterError {
        ConverterError::AmbiguousLookupTable {
            name: self.name.clone(),
            reason,
        }
    }

    /// Wire code for `label`.
    pub fn encode(&self, label: &str) -> Result<i64, ConverterError> {
        self.by_label
            .get(label)
            .copied()
            .ok_or_else(|| ConverterError::UnknownLabel {
                capability: self.name.clone(),
                label: label.to_string(),
            })
    }

    /// Label for wire `code`.
    pub fn decode(&self, code: i64) -> Result<&str, ConverterError> {
        self.by_code
            .get(&code)
            .map(String::as_str)
            .ok_or_else(|| ConverterError::UnknownCode {
                capability: self.name.clone(),
                code,
            })
    }

    /// Labels in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn entries(&self) -> &[(String, i64)] {
        &self.entries
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
