// src/sync/report.rs

//! Run report assembled by the orchestrator
//!
//! The serialized shape has one section per pipeline stage:
//! `execution_summary`, `data_loading`, `comparison_results`,
//! `sync_recommendations`, `execution_statistics` and `verification_report`
//! (the last two only when the run executed), plus `entity_status` listing
//! every entity in scope. Full key sets and per-recommendation results are
//! kept on the struct for callers but left out of the JSON.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::compare::ComparisonResult;
use super::executor::{ConflictPolicy, SyncResult, SyncStatistics};
use super::orchestrator::Stage;
use super::recommend::SyncRecommendation;
use super::verify::VerificationReport;
use crate::error::Result;
use crate::source::Generation;

/// When and how the run happened
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    /// RFC 3339 start time
    pub timestamp: String,
    pub generation: Generation,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub conflict_policy: ConflictPolicy,
    pub entities_total: usize,
    pub entities_completed: usize,
    pub entities_failed: usize,
}

/// What the load stage produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct DataLoadingSummary {
    pub entities_loaded: usize,
    pub total_records: usize,
    pub record_counts: BTreeMap<String, usize>,
    pub load_errors: BTreeMap<String, String>,
    pub warnings: Vec<String>,
}

/// Key-set sizes for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub source_count: usize,
    pub target_count: usize,
    pub missing_in_target: usize,
    pub missing_in_source: usize,
    pub changed: usize,
    pub identical: usize,
    pub dropped_records: usize,
    pub needs_sync: bool,
    /// Target column -> number of changed records that differ in it
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub changed_columns: BTreeMap<String, usize>,
    /// Per-record problems: dropped keyless records, duplicate keys
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<&ComparisonResult> for ComparisonSummary {
    fn from(result: &ComparisonResult) -> Self {
        let mut changed_columns: BTreeMap<String, usize> = BTreeMap::new();
        for column in result.field_diffs.values().flatten() {
            *changed_columns.entry(column.clone()).or_default() += 1;
        }

        Self {
            source_count: result.source_count,
            target_count: result.target_count,
            missing_in_target: result.missing_in_target.len(),
            missing_in_source: result.missing_in_source.len(),
            changed: result.changed.len(),
            identical: result.identical.len(),
            dropped_records: result.dropped_records,
            needs_sync: result.needs_sync(),
            changed_columns,
            diagnostics: result.diagnostics.iter().map(ToString::to_string).collect(),
            warnings: result.warnings.clone(),
        }
    }
}

/// One recommendation without its key list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationEntry {
    pub action: String,
    pub key_count: usize,
    pub priority: u8,
    pub reason: String,
}

impl From<&SyncRecommendation> for RecommendationEntry {
    fn from(recommendation: &SyncRecommendation) -> Self {
        Self {
            action: recommendation.action.to_string(),
            key_count: recommendation.key_count(),
            priority: recommendation.priority,
            reason: recommendation.reason.clone(),
        }
    }
}

/// Recommendation counts across all entities
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecommendationSummary {
    pub total_recommendations: usize,
    /// Action -> number of keys it covers
    pub action_counts: BTreeMap<String, usize>,
    pub entities: BTreeMap<String, Vec<RecommendationEntry>>,
}

impl RecommendationSummary {
    pub fn add(&mut self, entity_name: &str, recommendations: &[SyncRecommendation]) {
        for recommendation in recommendations {
            *self
                .action_counts
                .entry(recommendation.action.to_string())
                .or_default() += recommendation.key_count();
        }
        self.total_recommendations += recommendations.len();
        self.entities.insert(
            entity_name.to_string(),
            recommendations.iter().map(RecommendationEntry::from).collect(),
        );
    }
}

/// Final state of one entity's pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntityStatus {
    Completed,
    Failed { stage: Stage, reason: String },
}

impl EntityStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, EntityStatus::Failed { .. })
    }
}

/// Everything one orchestrator run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub execution_summary: ExecutionSummary,
    pub data_loading: DataLoadingSummary,
    pub comparison_results: BTreeMap<String, ComparisonSummary>,
    pub sync_recommendations: RecommendationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_statistics: Option<SyncStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_report: Option<VerificationReport>,
    pub entity_status: BTreeMap<String, EntityStatus>,

    #[serde(skip)]
    pub comparisons: BTreeMap<String, ComparisonResult>,
    #[serde(skip)]
    pub recommendations: BTreeMap<String, Vec<SyncRecommendation>>,
    #[serde(skip)]
    pub results: Vec<SyncResult>,
}

impl RunReport {
    /// Entities whose pipeline failed, with stage and reason
    pub fn failed_entities(&self) -> impl Iterator<Item = (&str, &EntityStatus)> {
        self.entity_status
            .iter()
            .filter(|(_, status)| status.is_failed())
            .map(|(name, status)| (name.as_str(), status))
    }

    pub fn has_failures(&self) -> bool {
        self.entity_status.values().any(EntityStatus::is_failed)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        info!("Run report written to {}", path.display());
        Ok(())
    }
}
