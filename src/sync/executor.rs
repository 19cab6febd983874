// src/sync/executor.rs

//! Sync Executor: applies recommendations to the target store
//!
//! Writes for one recommendation run inside one transaction that is
//! committed once at the end. Per-record failures are counted and recorded
//! but do not roll back records already written in the same transaction.
//! Rows are never deleted.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use strum_macros::{AsRefStr, Display, EnumString};
use tracing::{debug, info, warn};

use super::compare::SourceIndex;
use super::recommend::{SyncAction, SyncRecommendation};
use crate::db::table;
use crate::error::{RecordError, Result};
use crate::mapping::{EntityMapping, MappingRegistry};
use crate::progress::ProgressTracker;
use crate::record::Record;

/// Which side wins when source and target disagree
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConflictPolicy {
    /// Apply inserts and updates
    #[default]
    SourceWins,
    /// Apply inserts, leave changed rows as they are
    TargetWins,
    /// Write nothing, report only
    Manual,
}

/// Outcome of executing one recommendation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncResult {
    pub entity_name: String,
    pub action: Option<SyncAction>,
    pub records_processed: usize,
    pub records_succeeded: usize,
    pub records_failed: usize,
    /// Left for a human: manual policy or investigate
    pub records_deferred: usize,
    /// Rows actually inserted or updated
    pub records_written: usize,
    pub errors: Vec<String>,
    pub notes: Vec<String>,
    pub duration_ms: u64,
}

impl SyncResult {
    fn new(recommendation: &SyncRecommendation) -> Self {
        Self {
            entity_name: recommendation.entity_name.clone(),
            action: Some(recommendation.action),
            records_processed: recommendation.keys.len(),
            ..Default::default()
        }
    }

    fn fail(&mut self, error: RecordError) {
        warn!("{}", error);
        self.records_failed += 1;
        self.errors.push(error.to_string());
    }
}

/// Counts accumulated over one or more results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncCounts {
    pub records_processed: usize,
    pub records_succeeded: usize,
    pub records_failed: usize,
    pub records_deferred: usize,
    pub inserts: usize,
    pub updates: usize,
    pub skips: usize,
    pub investigations: usize,
    pub duration_ms: u64,
}

impl SyncCounts {
    fn add(&mut self, result: &SyncResult) {
        self.records_processed += result.records_processed;
        self.records_succeeded += result.records_succeeded;
        self.records_failed += result.records_failed;
        self.records_deferred += result.records_deferred;
        self.duration_ms += result.duration_ms;

        match result.action {
            Some(SyncAction::Insert) => self.inserts += result.records_written,
            Some(SyncAction::Update) => {
                self.updates += result.records_written;
                // target_wins turns updates into skips
                self.skips += result
                    .records_succeeded
                    .saturating_sub(result.records_written);
            }
            Some(SyncAction::Skip) => self.skips += result.records_succeeded,
            Some(SyncAction::Investigate) => self.investigations += result.records_processed,
            None => {}
        }
    }

    /// Percentage of attempted records that succeeded; deferred records are not attempted
    pub fn success_rate(&self) -> f64 {
        let attempted = self.records_succeeded + self.records_failed;
        if attempted == 0 {
            100.0
        } else {
            self.records_succeeded as f64 * 100.0 / attempted as f64
        }
    }
}

/// Execution statistics for a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStatistics {
    #[serde(flatten)]
    pub totals: SyncCounts,
    pub success_rate: f64,
    pub errors: Vec<String>,
    pub per_entity: BTreeMap<String, SyncCounts>,
}

impl SyncStatistics {
    pub fn new() -> Self {
        Self {
            success_rate: 100.0,
            ..Default::default()
        }
    }

    /// Fold one result into the totals and its entity's counts
    pub fn record(&mut self, result: &SyncResult) {
        self.totals.add(result);
        self.per_entity
            .entry(result.entity_name.clone())
            .or_default()
            .add(result);
        self.errors.extend(result.errors.iter().cloned());
        self.success_rate = self.totals.success_rate();
    }
}

/// Applies recommendations for entities in the registry
pub struct SyncExecutor<'a> {
    registry: &'a MappingRegistry,
    progress: &'a dyn ProgressTracker,
}

impl<'a> SyncExecutor<'a> {
    pub fn new(registry: &'a MappingRegistry, progress: &'a dyn ProgressTracker) -> Self {
        Self { registry, progress }
    }

    /// Apply one recommendation under a conflict policy
    ///
    /// Returns an error only for entity-level failures (unknown mapping,
    /// missing table, transaction start). Per-record failures are counted in
    /// the result.
    pub fn execute(
        &self,
        conn: &Connection,
        recommendation: &SyncRecommendation,
        source_records: &[Record],
        policy: ConflictPolicy,
    ) -> Result<SyncResult> {
        let start = Instant::now();
        let mapping = self.registry.get_mapping(&recommendation.entity_name)?;
        let mut result = SyncResult::new(recommendation);
        let count = recommendation.keys.len();

        match (recommendation.action, policy) {
            (SyncAction::Skip, _) => {
                result.records_succeeded = count;
            }
            (SyncAction::Investigate, _) => {
                result.records_deferred = count;
                result.notes.push(format!(
                    "{}: {} target row(s) absent from source need manual review: {}",
                    mapping.entity_name,
                    count,
                    recommendation.keys.join(", ")
                ));
            }
            (SyncAction::Insert | SyncAction::Update, ConflictPolicy::Manual) => {
                result.records_deferred = count;
                result.notes.push(format!(
                    "{}: {} {} deferred for manual review",
                    mapping.entity_name, count, recommendation.action
                ));
            }
            (SyncAction::Update, ConflictPolicy::TargetWins) => {
                result.records_succeeded = count;
                result.notes.push(format!(
                    "{}: kept target values for {} changed record(s)",
                    mapping.entity_name, count
                ));
            }
            (SyncAction::Insert | SyncAction::Update, _) => {
                self.apply_writes(conn, mapping, recommendation, source_records, &mut result)?;
            }
        }

        result.duration_ms = elapsed_ms(start);
        info!(
            "{} {}: {} processed, {} succeeded, {} failed, {} deferred",
            result.entity_name,
            recommendation.action,
            result.records_processed,
            result.records_succeeded,
            result.records_failed,
            result.records_deferred
        );
        Ok(result)
    }

    fn apply_writes(
        &self,
        conn: &Connection,
        mapping: &EntityMapping,
        recommendation: &SyncRecommendation,
        source_records: &[Record],
        result: &mut SyncResult,
    ) -> Result<()> {
        table::require_table(conn, &mapping.target_table)?;
        let source = SourceIndex::build(mapping, source_records);

        self.progress.reset(recommendation.keys.len() as u64);
        self.progress.set_message(&format!(
            "{} {}",
            recommendation.action, mapping.entity_name
        ));

        let tx = conn.unchecked_transaction()?;
        for key in &recommendation.keys {
            self.progress.increment(1);

            let Some(record) = source.get(key) else {
                result.fail(RecordError::SourceRecordMissing {
                    entity: mapping.entity_name.clone(),
                    key: key.clone(),
                });
                continue;
            };

            let written = match recommendation.action {
                SyncAction::Insert => {
                    let mut columns = mapping.project(record);
                    for (column, value) in columns.iter_mut() {
                        if *column == mapping.target_primary_key {
                            *value = serde_json::Value::String(key.clone());
                        }
                    }
                    table::insert_row(&tx, &mapping.target_table, &columns)
                }
                _ => {
                    let columns: Vec<_> = mapping
                        .project(record)
                        .into_iter()
                        .filter(|(column, _)| *column != mapping.target_primary_key)
                        .collect();
                    table::update_row(
                        &tx,
                        &mapping.target_table,
                        &mapping.target_primary_key,
                        key,
                        &columns,
                    )
                }
            };

            match written {
                Ok(0) => result.fail(RecordError::NoRowsAffected {
                    entity: mapping.entity_name.clone(),
                    key: key.clone(),
                }),
                Ok(rows) => {
                    debug!("{} {}: wrote key {}", mapping.entity_name, recommendation.action, key);
                    result.records_succeeded += 1;
                    result.records_written += rows;
                }
                Err(e) => result.fail(RecordError::WriteFailure {
                    entity: mapping.entity_name.clone(),
                    key: key.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        if let Err(e) = tx.commit() {
            warn!("{}: commit failed: {}", mapping.entity_name, e);
            result.records_failed += result.records_succeeded;
            result.records_succeeded = 0;
            result.records_written = 0;
            result.errors.push(format!(
                "{}: commit of {} failed: {}",
                mapping.entity_name, recommendation.action, e
            ));
            self.progress.finish_with_error("commit failed");
            return Ok(());
        }

        self.progress.finish_with_message(&format!(
            "{} {}: {} written",
            recommendation.action, mapping.entity_name, result.records_written
        ));
        Ok(())
    }
}

/// Milliseconds since `start`, saturating at `u64::MAX`
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
