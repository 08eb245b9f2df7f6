// Provenance log
// Append-only record of the processing operations applied to a trace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::value::ParamValue;

/// One processing action applied to a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Operation name (e.g., "cut", "resample", "signal_split")
    pub operation: String,

    /// Attributes describing how the operation was applied
    pub attributes: BTreeMap<String, ParamValue>,

    /// When the record was appended
    pub recorded_at: DateTime<Utc>,
}

impl ProvenanceRecord {
    pub fn new(operation: impl Into<String>, attributes: BTreeMap<String, ParamValue>) -> Self {
        ProvenanceRecord {
            operation: operation.into(),
            attributes,
            recorded_at: Utc::now(),
        }
    }
}

/// Ordered provenance history. Records are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    records: Vec<ProvenanceRecord>,
}

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_records(records: Vec<ProvenanceRecord>) -> Self {
        Provenance { records }
    }

    pub fn append(&mut self, record: ProvenanceRecord) {
        self.records.push(record);
    }

    /// All records for an operation, in insertion order
    pub fn get(&self, operation: &str) -> Vec<&ProvenanceRecord> {
        self.records
            .iter()
            .filter(|r| r.operation == operation)
            .collect()
    }

    pub fn records(&self) -> &[ProvenanceRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProvenanceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Names of all operations, in application order
    pub fn operations(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.operation.as_str()).collect()
    }

    /// Attribute values of every record flattened in order
    pub fn attribute_series(&self) -> Vec<&ParamValue> {
        self.records
            .iter()
            .flat_map(|r| r.attributes.values())
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<'a> IntoIterator for &'a Provenance {
    type Item = &'a ProvenanceRecord;
    type IntoIter = std::slice::Iter<'a, ProvenanceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
