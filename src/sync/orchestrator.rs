// src/sync/orchestrator.rs

//! Orchestrator: runs the pipeline for every entity in scope
//!
//! Stages run entity by entity within each stage:
//! `Load -> Compare -> Recommend -> (Execute -> Verify | done)`.
//! A dry run stops after `Recommend`. When one entity fails at a stage it is
//! marked failed with that stage and dropped from later stages; the other
//! entities carry on. Only the absence of a usable generation aborts the run.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use strum_macros::{AsRefStr, Display};
use tracing::{info, warn};

use super::compare::{ComparisonResult, Comparator};
use super::executor::{elapsed_ms, ConflictPolicy, SyncExecutor, SyncResult, SyncStatistics};
use super::recommend::{generate_recommendations, SyncRecommendation};
use super::report::{
    ComparisonSummary, DataLoadingSummary, EntityStatus, ExecutionSummary, RecommendationSummary,
    RunReport,
};
use super::verify::{VerificationReport, VerificationReporter};
use crate::db;
use crate::error::{Error, Result};
use crate::mapping::MappingRegistry;
use crate::progress::{ProgressTracker, SilentProgress};
use crate::record::Record;
use crate::source::{Generation, RecordSource};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Load,
    Compare,
    Recommend,
    Execute,
    Verify,
}

/// Options for one run
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Stop after recommendations
    pub dry_run: bool,
    pub conflict_policy: ConflictPolicy,
    /// Generation to reconcile; newest when `None`
    pub generation: Option<String>,
    /// Entities to process; every registered entity when empty
    pub entities: Vec<String>,
}

/// Pipeline state for one entity
struct EntityRun {
    name: String,
    records: Vec<Record>,
    comparison: Option<ComparisonResult>,
    recommendations: Vec<SyncRecommendation>,
    results: Vec<SyncResult>,
    failure: Option<(Stage, String)>,
}

impl EntityRun {
    fn new(name: String) -> Self {
        Self {
            name,
            records: Vec::new(),
            comparison: None,
            recommendations: Vec::new(),
            results: Vec::new(),
            failure: None,
        }
    }

    fn is_active(&self) -> bool {
        self.failure.is_none()
    }

    fn fail(&mut self, stage: Stage, error: &Error) {
        warn!("{}: {} stage failed: {}", self.name, stage, error);
        self.failure = Some((stage, error.to_string()));
    }
}

/// Sequences load, compare, recommend, execute and verify
pub struct Orchestrator<'a> {
    registry: &'a MappingRegistry,
    source: &'a dyn RecordSource,
    db_path: PathBuf,
    progress: &'a dyn ProgressTracker,
}

static SILENT: SilentProgress = SilentProgress::new();

impl<'a> Orchestrator<'a> {
    pub fn new(
        registry: &'a MappingRegistry,
        source: &'a dyn RecordSource,
        db_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            registry,
            source,
            db_path: db_path.as_ref().to_path_buf(),
            progress: &SILENT,
        }
    }

    /// Report executor progress to `progress`
    pub fn with_progress(mut self, progress: &'a dyn ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    /// Run the pipeline
    ///
    /// Fails only when no generation can be resolved; every other failure is
    /// recorded against its entity in the report.
    pub fn run(&self, options: &SyncOptions) -> Result<RunReport> {
        let started = Instant::now();
        let timestamp = chrono::Utc::now().to_rfc3339();

        let generation = self
            .source
            .resolve_generation(options.generation.as_deref())?;
        info!(
            "Starting {} against generation {} ({} policy)",
            if options.dry_run { "dry run" } else { "sync" },
            generation,
            options.conflict_policy
        );

        let mut runs: Vec<EntityRun> = self
            .entities_in_scope(options)
            .into_iter()
            .map(EntityRun::new)
            .collect();

        let data_loading = self.load_stage(&mut runs, &generation)?;
        self.compare_stage(&mut runs);
        self.recommend_stage(&mut runs);

        let (execution_statistics, verification_report) = if options.dry_run {
            info!("Dry run: stopping before execution");
            (None, None)
        } else {
            let statistics = self.execute_stage(&mut runs, options.conflict_policy);
            let verification = self.verify_stage(&mut runs, &generation);
            (Some(statistics), Some(verification))
        };

        let mut comparison_results = BTreeMap::new();
        let mut sync_recommendations = RecommendationSummary::default();
        let mut entity_status = BTreeMap::new();
        let mut comparisons = BTreeMap::new();
        let mut recommendations = BTreeMap::new();
        let mut results = Vec::new();

        for run in runs {
            let status = match run.failure {
                None => EntityStatus::Completed,
                Some((stage, reason)) => EntityStatus::Failed { stage, reason },
            };
            entity_status.insert(run.name.clone(), status);

            if let Some(comparison) = run.comparison {
                comparison_results.insert(run.name.clone(), ComparisonSummary::from(&comparison));
                sync_recommendations.add(&run.name, &run.recommendations);
                comparisons.insert(run.name.clone(), comparison);
                recommendations.insert(run.name.clone(), run.recommendations);
            }
            results.extend(run.results);
        }

        let entities_failed = entity_status.values().filter(|s| s.is_failed()).count();
        let execution_summary = ExecutionSummary {
            timestamp,
            generation,
            duration_ms: elapsed_ms(started),
            dry_run: options.dry_run,
            conflict_policy: options.conflict_policy,
            entities_total: entity_status.len(),
            entities_completed: entity_status.len() - entities_failed,
            entities_failed,
        };
        info!(
            "Run finished in {} ms: {} entities completed, {} failed",
            execution_summary.duration_ms,
            execution_summary.entities_completed,
            execution_summary.entities_failed
        );

        Ok(RunReport {
            execution_summary,
            data_loading,
            comparison_results,
            sync_recommendations,
            execution_statistics,
            verification_report,
            entity_status,
            comparisons,
            recommendations,
            results,
        })
    }

    /// Requested entities in order without repeats, or every registered one
    fn entities_in_scope(&self, options: &SyncOptions) -> Vec<String> {
        if options.entities.is_empty() {
            return self
                .registry
                .entity_names()
                .into_iter()
                .map(String::from)
                .collect();
        }

        let mut entities: Vec<String> = Vec::new();
        for entity in &options.entities {
            if !entities.contains(entity) {
                entities.push(entity.clone());
            }
        }
        entities
    }

    fn load_stage(&self, runs: &mut [EntityRun], generation: &Generation) -> Result<DataLoadingSummary> {
        info!("Loading {} entities", runs.len());
        let mut summary = DataLoadingSummary::default();

        for run in runs.iter_mut() {
            let loaded = self
                .registry
                .get_mapping(&run.name)
                .and_then(|_| self.source.load(&run.name, Some(generation)));

            match loaded {
                Ok(loaded) => {
                    summary.entities_loaded += 1;
                    summary.total_records += loaded.records.len();
                    summary
                        .record_counts
                        .insert(run.name.clone(), loaded.records.len());
                    summary.warnings.extend(loaded.warnings);
                    run.records = loaded.records;
                }
                Err(e) if e.is_run_fatal() => return Err(e),
                Err(e) => {
                    summary.load_errors.insert(run.name.clone(), e.to_string());
                    run.fail(Stage::Load, &e);
                }
            }
        }

        Ok(summary)
    }

    fn compare_stage(&self, runs: &mut [EntityRun]) {
        let comparator = Comparator::new(self.registry);

        for run in runs.iter_mut().filter(|r| r.is_active()) {
            let compared = db::open(&self.db_path)
                .and_then(|conn| comparator.compare(&conn, &run.name, &run.records));
            match compared {
                Ok(comparison) => run.comparison = Some(comparison),
                Err(e) => run.fail(Stage::Compare, &e),
            }
        }
    }

    fn recommend_stage(&self, runs: &mut [EntityRun]) {
        for run in runs.iter_mut().filter(|r| r.is_active()) {
            if let Some(comparison) = &run.comparison {
                run.recommendations = generate_recommendations(comparison);
            }
        }
    }

    fn execute_stage(&self, runs: &mut [EntityRun], policy: ConflictPolicy) -> SyncStatistics {
        let executor = SyncExecutor::new(self.registry, self.progress);
        let mut statistics = SyncStatistics::new();
        let started = Instant::now();

        for run in runs.iter_mut().filter(|r| r.is_active()) {
            let conn = match db::open(&self.db_path) {
                Ok(conn) => conn,
                Err(e) => {
                    run.fail(Stage::Execute, &e);
                    continue;
                }
            };

            let mut failure = None;
            for recommendation in &run.recommendations {
                match executor.execute(&conn, recommendation, &run.records, policy) {
                    Ok(result) => {
                        statistics.record(&result);
                        run.results.push(result);
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            if let Some(e) = failure {
                run.fail(Stage::Execute, &e);
            }
        }

        statistics.totals.duration_ms = elapsed_ms(started);
        statistics
    }

    fn verify_stage(
        &self,
        runs: &mut [EntityRun],
        generation: &Generation,
    ) -> VerificationReport {
        let reporter = VerificationReporter::new(self.registry, self.source, &self.db_path);
        let entities: Vec<String> = runs
            .iter()
            .filter(|r| r.is_active())
            .map(|r| r.name.clone())
            .collect();

        let report = reporter.verify(generation, &entities);
        for verification in &report.entities {
            if let Some(error) = &verification.error
                && let Some(run) = runs.iter_mut().find(|r| r.name == verification.entity_name)
            {
                warn!("{}: verify stage failed: {}", run.name, error);
                run.failure = Some((Stage::Verify, error.clone()));
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{EntityMapping, FieldMapping};
    use crate::source::MemoryRecordSource;
    use crate::sync::verify::SyncStatus;
    use serde_json::json;
    use tempfile::TempDir;

    const GENERATION: &str = "2024-03-01_12-00-00";

    fn registry() -> MappingRegistry {
        MappingRegistry::new(vec![
            EntityMapping::new(
                "contacts",
                "Contacts",
                "id",
                "ID",
                vec![FieldMapping::new("id", "ID"), FieldMapping::new("name", "Name")],
            ),
            EntityMapping::new(
                "items",
                "Items",
                "item_id",
                "ItemID",
                vec![
                    FieldMapping::new("item_id", "ItemID"),
                    FieldMapping::new("rate", "Rate"),
                ],
            ),
        ])
        .unwrap()
    }

    fn source() -> MemoryRecordSource {
        MemoryRecordSource::new()
            .with_entity(
                GENERATION,
                "contacts",
                vec![
                    [("id", json!(1)), ("name", json!("Acme"))].into_iter().collect(),
                    [("id", json!(2)), ("name", json!("Globex"))].into_iter().collect(),
                ],
            )
            .unwrap()
            .with_entity(
                GENERATION,
                "items",
                vec![[("item_id", json!("A-1")), ("rate", json!(9.5))].into_iter().collect()],
            )
            .unwrap()
    }

    fn setup() -> (TempDir, PathBuf, MappingRegistry) {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("ledger.db");
        let registry = registry();
        db::init(&db_path, &registry).unwrap();
        (temp, db_path, registry)
    }

    #[test]
    fn test_full_run() {
        let (_temp, db_path, registry) = setup();
        let source = source();
        let orchestrator = Orchestrator::new(&registry, &source, &db_path);

        let report = orchestrator.run(&SyncOptions::default()).unwrap();

        assert!(!report.has_failures());
        assert_eq!(report.execution_summary.entities_completed, 2);
        assert_eq!(report.data_loading.total_records, 3);
        assert_eq!(report.comparison_results["contacts"].missing_in_target, 2);

        let stats = report.execution_statistics.as_ref().unwrap();
        assert_eq!(stats.totals.inserts, 3);
        assert_eq!(stats.totals.records_failed, 0);

        let verification = report.verification_report.as_ref().unwrap();
        assert_eq!(verification.sync_status, SyncStatus::Perfect);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let (_temp, db_path, registry) = setup();
        let source = source();
        let orchestrator = Orchestrator::new(&registry, &source, &db_path);

        orchestrator.run(&SyncOptions::default()).unwrap();
        let report = orchestrator.run(&SyncOptions::default()).unwrap();

        for summary in report.comparison_results.values() {
            assert!(!summary.needs_sync);
        }
        assert!(!report.sync_recommendations.action_counts.contains_key("insert"));
        assert!(!report.sync_recommendations.action_counts.contains_key("update"));
        assert_eq!(report.sync_recommendations.action_counts["skip"], 3);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (_temp, db_path, registry) = setup();
        let source = source();
        let orchestrator = Orchestrator::new(&registry, &source, &db_path);

        let options = SyncOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = orchestrator.run(&options).unwrap();

        assert!(report.execution_statistics.is_none());
        assert!(report.verification_report.is_none());
        assert!(report.results.is_empty());
        assert_eq!(report.recommendations["contacts"].len(), 1);

        let conn = db::open(&db_path).unwrap();
        assert_eq!(crate::db::table::count_rows(&conn, "Contacts").unwrap(), 0);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("execution_statistics").is_none());
        assert!(json.get("verification_report").is_none());
        assert_eq!(json["execution_summary"]["dry_run"], true);
    }

    #[test]
    fn test_entity_failure_is_isolated() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("ledger.db");
        let registry = registry();
        let conn = db::open(&db_path).unwrap();
        conn.execute_batch(&crate::db::schema::create_table_sql(
            registry.get_mapping("contacts").unwrap(),
        ))
        .unwrap();
        drop(conn);

        let source = source();
        let orchestrator = Orchestrator::new(&registry, &source, &db_path);
        let options = SyncOptions {
            entities: vec!["contacts".to_string(), "items".to_string(), "widgets".to_string()],
            ..Default::default()
        };
        let report = orchestrator.run(&options).unwrap();

        assert_eq!(report.entity_status["contacts"], EntityStatus::Completed);
        assert!(matches!(
            &report.entity_status["items"],
            EntityStatus::Failed { stage: Stage::Compare, reason } if reason.contains("Items")
        ));
        assert!(matches!(
            &report.entity_status["widgets"],
            EntityStatus::Failed { stage: Stage::Load, .. }
        ));
        assert!(report.data_loading.load_errors.contains_key("widgets"));
        assert_eq!(report.execution_summary.entities_failed, 2);

        let verification = report.verification_report.unwrap();
        assert_eq!(verification.total_entities, 1);
        assert_eq!(verification.sync_status, SyncStatus::Perfect);
    }

    #[test]
    fn test_no_generations_is_fatal() {
        let (_temp, db_path, registry) = setup();
        let source = MemoryRecordSource::new();
        let orchestrator = Orchestrator::new(&registry, &source, &db_path);

        let result = orchestrator.run(&SyncOptions::default());
        assert!(matches!(result, Err(Error::NoGenerationsAvailable(_))));
    }

    #[test]
    fn test_unknown_generation_is_fatal() {
        let (_temp, db_path, registry) = setup();
        let source = source();
        let orchestrator = Orchestrator::new(&registry, &source, &db_path);

        let options = SyncOptions {
            generation: Some("2020-01-01_00-00-00".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            orchestrator.run(&options),
            Err(Error::GenerationNotFound(_))
        ));
    }

    #[test]
    fn test_manual_policy_defers() {
        let (_temp, db_path, registry) = setup();
        let source = source();
        let orchestrator = Orchestrator::new(&registry, &source, &db_path);

        let options = SyncOptions {
            conflict_policy: ConflictPolicy::Manual,
            ..Default::default()
        };
        let report = orchestrator.run(&options).unwrap();

        let stats = report.execution_statistics.unwrap();
        assert_eq!(stats.totals.records_deferred, 3);
        assert_eq!(stats.totals.inserts, 0);
        let verification = report.verification_report.unwrap();
        assert_eq!(verification.overall_difference, 3);
        assert_eq!(verification.sync_status, SyncStatus::SyncIssues);
    }
}
