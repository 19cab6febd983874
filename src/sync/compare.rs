// src/sync/compare.rs

//! Comparator: diff one generation's records against the target table.
//!
//! Both sides are keyed by their string-coerced primary key. Every source key
//! lands in exactly one of `missing_in_target`, `changed` or `identical`, and
//! every target key in exactly one of `missing_in_source`, `changed` or
//! `identical`. Sets and maps are ordered, so the result does not depend on
//! the order records arrive in.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::db::table;
use crate::error::{RecordError, Result};
use crate::mapping::{EntityMapping, MappingRegistry};
use crate::record::{values_equal, Record};

/// Outcome of comparing one entity
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonResult {
    pub entity_name: String,
    /// Distinct valid source keys
    pub source_count: usize,
    /// Distinct valid target keys
    pub target_count: usize,
    pub missing_in_target: BTreeSet<String>,
    pub missing_in_source: BTreeSet<String>,
    pub changed: BTreeSet<String>,
    pub identical: BTreeSet<String>,
    /// Changed key -> target columns that differ
    pub field_diffs: BTreeMap<String, Vec<String>>,
    /// Source records excluded for lacking a primary key
    pub dropped_records: usize,
    pub diagnostics: Vec<RecordError>,
    pub warnings: Vec<String>,
}

impl ComparisonResult {
    /// Whether anything needs writing
    pub fn needs_sync(&self) -> bool {
        !self.missing_in_target.is_empty() || !self.changed.is_empty()
    }

    /// All source keys (missing_in_target + changed + identical)
    pub fn source_keys(&self) -> BTreeSet<&str> {
        self.missing_in_target
            .iter()
            .chain(&self.changed)
            .chain(&self.identical)
            .map(|s| s.as_str())
            .collect()
    }

    /// All target keys (missing_in_source + changed + identical)
    pub fn target_keys(&self) -> BTreeSet<&str> {
        self.missing_in_source
            .iter()
            .chain(&self.changed)
            .chain(&self.identical)
            .map(|s| s.as_str())
            .collect()
    }
}

/// Source records indexed by primary key
#[derive(Debug, Default)]
pub struct SourceIndex<'a> {
    pub records: BTreeMap<String, &'a Record>,
    pub dropped: usize,
    pub diagnostics: Vec<RecordError>,
}

impl<'a> SourceIndex<'a> {
    /// Index records by the mapping's source primary key
    ///
    /// Records without a usable key are dropped. When a key repeats, the
    /// later record wins.
    pub fn build(mapping: &EntityMapping, records: &'a [Record]) -> Self {
        let mut index = SourceIndex::default();

        for (position, record) in records.iter().enumerate() {
            match record.key(&mapping.source_primary_key) {
                Some(key) => {
                    if index.records.insert(key.clone(), record).is_some() {
                        index.diagnostics.push(RecordError::DuplicatePrimaryKey {
                            entity: mapping.entity_name.clone(),
                            key,
                        });
                    }
                }
                None => {
                    index.dropped += 1;
                    index.diagnostics.push(RecordError::MissingPrimaryKey {
                        entity: mapping.entity_name.clone(),
                        index: position,
                        field: mapping.source_primary_key.clone(),
                    });
                }
            }
        }

        index
    }

    pub fn get(&self, key: &str) -> Option<&'a Record> {
        self.records.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Mapped target columns whose values differ between a source record and a target row
pub fn differing_columns(mapping: &EntityMapping, source: &Record, target: &Record) -> Vec<String> {
    mapping
        .field_map
        .iter()
        .filter(|f| f.target != mapping.target_primary_key)
        .filter(|f| !values_equal(source.get_or_null(&f.source), target.get_or_null(&f.target)))
        .map(|f| f.target.clone())
        .collect()
}

/// Compare source records against already-loaded target rows
pub fn compare_records(
    mapping: &EntityMapping,
    source_records: &[Record],
    target_rows: &[Record],
) -> ComparisonResult {
    let source = SourceIndex::build(mapping, source_records);
    for diagnostic in &source.diagnostics {
        warn!("{}", diagnostic);
    }

    let mut result = ComparisonResult {
        entity_name: mapping.entity_name.clone(),
        dropped_records: source.dropped,
        ..Default::default()
    };

    let mut target: BTreeMap<String, &Record> = BTreeMap::new();
    for row in target_rows {
        match row.key(&mapping.target_primary_key) {
            Some(key) => {
                target.insert(key, row);
            }
            None => result.warnings.push(format!(
                "{}: target row without a value in '{}' ignored",
                mapping.target_table, mapping.target_primary_key
            )),
        }
    }

    for (key, record) in &source.records {
        match target.get(key) {
            None => {
                result.missing_in_target.insert(key.clone());
            }
            Some(row) => {
                let diffs = differing_columns(mapping, record, row);
                if diffs.is_empty() {
                    result.identical.insert(key.clone());
                } else {
                    result.changed.insert(key.clone());
                    result.field_diffs.insert(key.clone(), diffs);
                }
            }
        }
    }

    result.missing_in_source = target
        .keys()
        .filter(|k| !source.records.contains_key(*k))
        .cloned()
        .collect();

    result.source_count = source.records.len();
    result.target_count = target.len();
    result.diagnostics = source.diagnostics;

    debug!(
        "{}: {} missing in target, {} missing in source, {} changed, {} identical",
        result.entity_name,
        result.missing_in_target.len(),
        result.missing_in_source.len(),
        result.changed.len(),
        result.identical.len()
    );

    result
}

/// Loads target rows and compares them against source records
pub struct Comparator<'a> {
    registry: &'a MappingRegistry,
}

impl<'a> Comparator<'a> {
    pub fn new(registry: &'a MappingRegistry) -> Self {
        Self { registry }
    }

    /// Compare one entity's records with its target table
    ///
    /// Fails with `MappingNotFound` or `TargetTableMissing`; both are
    /// scoped to this entity.
    pub fn compare(
        &self,
        conn: &Connection,
        entity_name: &str,
        source_records: &[Record],
    ) -> Result<ComparisonResult> {
        let mapping = self.registry.get_mapping(entity_name)?;
        let target_rows = table::load_rows(conn, &mapping.target_table)?;
        Ok(compare_records(mapping, source_records, &target_rows))
    }
}
