// src/sync/verify.rs

//! Verification Reporter: recount source and target after execution
//!
//! Counts are recomputed from scratch, reading the source generation again
//! and querying the target table through a fresh connection, so the report
//! reflects what was persisted rather than what the executor believes it
//! wrote.

use serde::Serialize;
use std::path::{Path, PathBuf};
use strum_macros::{AsRefStr, Display};
use tracing::{info, warn};

use super::compare::SourceIndex;
use crate::db;
use crate::db::table;
use crate::error::Result;
use crate::mapping::MappingRegistry;
use crate::source::{Generation, RecordSource};

/// Share of matching entities at or above which a run is "mostly synced"
pub const MOSTLY_SYNCED_PERCENT: f64 = 80.0;

/// Qualitative health of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
pub enum SyncStatus {
    #[serde(rename = "perfect")]
    #[strum(serialize = "perfect")]
    Perfect,
    #[serde(rename = "mostly synced")]
    #[strum(serialize = "mostly synced")]
    MostlySynced,
    #[serde(rename = "sync issues")]
    #[strum(serialize = "sync issues")]
    SyncIssues,
}

impl SyncStatus {
    pub fn classify(perfect_matches: usize, total_entities: usize) -> Self {
        if perfect_matches == total_entities {
            SyncStatus::Perfect
        } else if match_percentage(perfect_matches, total_entities) >= MOSTLY_SYNCED_PERCENT {
            SyncStatus::MostlySynced
        } else {
            SyncStatus::SyncIssues
        }
    }
}

fn match_percentage(perfect_matches: usize, total_entities: usize) -> f64 {
    if total_entities == 0 {
        100.0
    } else {
        perfect_matches as f64 * 100.0 / total_entities as f64
    }
}

/// Recount for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityVerification {
    pub entity_name: String,
    pub source_count: usize,
    pub target_count: usize,
    /// `source_count - target_count`
    pub difference: i64,
    #[serde(rename = "match")]
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntityVerification {
    pub fn new(entity_name: &str, source_count: usize, target_count: usize) -> Self {
        let difference = source_count as i64 - target_count as i64;
        Self {
            entity_name: entity_name.to_string(),
            source_count,
            target_count,
            difference,
            matched: difference == 0,
            error: None,
        }
    }

    /// An entity that could not be recounted
    pub fn failed(entity_name: &str, error: String) -> Self {
        Self {
            entity_name: entity_name.to_string(),
            source_count: 0,
            target_count: 0,
            difference: 0,
            matched: false,
            error: Some(error),
        }
    }
}

/// Post-sync verification of every entity in scope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub generation: Generation,
    pub entities: Vec<EntityVerification>,
    pub total_entities: usize,
    pub perfect_matches: usize,
    pub match_percentage: f64,
    /// Total source records minus total target rows
    pub overall_difference: i64,
    pub sync_status: SyncStatus,
}

impl VerificationReport {
    pub fn from_entities(generation: Generation, entities: Vec<EntityVerification>) -> Self {
        let total_entities = entities.len();
        let perfect_matches = entities.iter().filter(|e| e.matched).count();
        let overall_difference = entities.iter().map(|e| e.difference).sum();

        Self {
            generation,
            total_entities,
            perfect_matches,
            match_percentage: match_percentage(perfect_matches, total_entities),
            overall_difference,
            sync_status: SyncStatus::classify(perfect_matches, total_entities),
            entities,
        }
    }
}

/// Recomputes counts for a generation against the target store
pub struct VerificationReporter<'a> {
    registry: &'a MappingRegistry,
    source: &'a dyn RecordSource,
    db_path: PathBuf,
}

impl<'a> VerificationReporter<'a> {
    pub fn new(
        registry: &'a MappingRegistry,
        source: &'a dyn RecordSource,
        db_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            registry,
            source,
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    /// Count one entity on both sides
    pub fn verify_entity(&self, entity_name: &str, generation: &Generation) -> Result<EntityVerification> {
        let mapping = self.registry.get_mapping(entity_name)?;
        let loaded = self.source.load(entity_name, Some(generation))?;
        let source_count = SourceIndex::build(mapping, &loaded.records).len();

        let conn = db::open(&self.db_path)?;
        let target_count = table::count_rows(&conn, &mapping.target_table)?;

        Ok(EntityVerification::new(entity_name, source_count, target_count))
    }

    /// Verify every listed entity; failures are reported per entity
    pub fn verify(&self, generation: &Generation, entities: &[String]) -> VerificationReport {
        let results = entities
            .iter()
            .map(|entity| match self.verify_entity(entity, generation) {
                Ok(verification) => verification,
                Err(e) => {
                    warn!("Verification of {} failed: {}", entity, e);
                    EntityVerification::failed(entity, e.to_string())
                }
            })
            .collect();

        let report = VerificationReport::from_entities(generation.clone(), results);
        info!(
            "Verification: {}/{} entities match ({:.1}%), status: {}",
            report.perfect_matches,
            report.total_entities,
            report.match_percentage,
            report.sync_status
        );
        report
    }
}
