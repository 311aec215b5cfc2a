//! Append-only result table with schema-union normalization.
//!
//! Different measurement calls may report different metric sets, so rows
//! drift apart schema-wise. The table reconciles that drift on every
//! append: all rows always expose the same field names, with
//! `Value::Null` standing in for fields a row never had.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grid::Combination;

/// One measurement outcome.
///
/// `timestamp` and `index` are always present and typed; `fields` is the
/// open part, carrying the combination's values and whatever metrics the
/// driver reported for this step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// When the measurement was read back.
    pub timestamp: DateTime<Utc>,

    /// Position in the combination sequence that produced this row.
    pub index: usize,

    /// Combination values plus measured metrics. `Value::Null` marks a
    /// field another row introduced that this row never measured.
    pub fields: BTreeMap<String, Value>,
}

impl ResultRow {
    /// Build a row for `index`, stamped now, seeded with the
    /// combination's values.
    pub fn new(index: usize, combo: &Combination) -> Self {
        Self {
            timestamp: Utc::now(),
            index,
            fields: combo.clone(),
        }
    }

    /// Attach a measured metric.
    pub fn with_metric(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }
}

/// Ordered, append-only sequence of result rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row, reconciling schema drift.
    ///
    /// The field-name union is taken between the first row and the new
    /// row; the first row's field set is the representative baseline for
    /// the whole table, so this is enough to keep every row aligned.
    pub fn append(&mut self, row: ResultRow) {
        if self.rows.is_empty() {
            self.rows.push(row);
            return;
        }
        let union: BTreeSet<String> = self.rows[0]
            .fields
            .keys()
            .chain(row.fields.keys())
            .cloned()
            .collect();
        for existing in &mut self.rows {
            fill_missing(existing, &union);
        }
        let mut row = row;
        fill_missing(&mut row, &union);
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names for tabular projection: the typed core first, then
    /// the shared field names in key order.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = vec!["timestamp".to_string(), "index".to_string()];
        if let Some(first) = self.rows.first() {
            cols.extend(first.fields.keys().cloned());
        }
        cols
    }
}

fn fill_missing(row: &mut ResultRow, union: &BTreeSet<String>) {
    for key in union {
        row.fields.entry(key.clone()).or_insert(Value::Null);
    }
}
