// src/commands/run.rs
//! Sync run and diff commands

use anyhow::{Context, Result};
use ledgersync::{ConflictPolicy, EntityStatus, Orchestrator, RunReport, SyncAction, SyncOptions};
use std::path::PathBuf;
use tracing::info;

use super::Settings;
use super::progress;

/// Run the full pipeline
pub fn cmd_run(
    settings: &Settings,
    dry_run: bool,
    policy: Option<ConflictPolicy>,
    generation: Option<String>,
    entities: Vec<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let options = SyncOptions {
        dry_run,
        conflict_policy: policy.unwrap_or(settings.conflict_policy),
        generation,
        entities: settings.entities_or(entities),
    };

    let report = run_pipeline(settings, &options)?;
    print_summary(&report);
    print_failures(&report);

    if let Some(path) = output {
        report
            .write_json(&path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("\nReport written to {}", path.display());
    }

    fail_on_entity_errors(&report)
}

/// Dry run that prints per-entity changes and recommendations
pub fn cmd_diff(
    settings: &Settings,
    generation: Option<String>,
    entities: Vec<String>,
    show_keys: bool,
) -> Result<()> {
    let options = SyncOptions {
        dry_run: true,
        conflict_policy: settings.conflict_policy,
        generation,
        entities: settings.entities_or(entities),
    };

    let report = run_pipeline(settings, &options)?;
    println!("Generation {}", report.execution_summary.generation);

    for (entity, comparison) in &report.comparisons {
        println!(
            "\n{} ({} source, {} target)",
            entity, comparison.source_count, comparison.target_count
        );
        if comparison.dropped_records > 0 {
            println!(
                "  ! {} record(s) without a primary key ignored",
                comparison.dropped_records
            );
        }

        let recommendations = report
            .recommendations
            .get(entity)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if recommendations.is_empty() {
            println!("  (no records on either side)");
        }
        for recommendation in recommendations {
            println!("  {}", recommendation.description());
            if !show_keys || recommendation.action == SyncAction::Skip {
                continue;
            }
            for key in &recommendation.keys {
                match comparison.field_diffs.get(key) {
                    Some(columns) => println!("      {} [{}]", key, columns.join(", ")),
                    None => println!("      {}", key),
                }
            }
        }
    }

    print_failures(&report);
    fail_on_entity_errors(&report)
}

fn run_pipeline(settings: &Settings, options: &SyncOptions) -> Result<RunReport> {
    let source = settings.source();
    let progress = progress::tracker(settings.quiet || options.dry_run);
    let orchestrator = Orchestrator::new(&settings.registry, &source, &settings.db_path)
        .with_progress(progress.as_ref());

    info!(
        "Syncing {} into {}",
        settings.source_dir.display(),
        settings.db_path.display()
    );
    orchestrator.run(options).context("Sync run aborted")
}

fn print_summary(report: &RunReport) {
    let summary = &report.execution_summary;
    println!(
        "Generation {}{} ({} policy, {} ms)",
        summary.generation,
        if summary.dry_run { " [dry run]" } else { "" },
        summary.conflict_policy,
        summary.duration_ms
    );

    println!(
        "\n{:<22} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Entity", "Source", "Target", "Insert", "Update", "Same", "Orphan"
    );
    for (entity, comparison) in &report.comparison_results {
        println!(
            "{:<22} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            entity,
            comparison.source_count,
            comparison.target_count,
            comparison.missing_in_target,
            comparison.changed,
            comparison.identical,
            comparison.missing_in_source
        );
    }

    if let Some(stats) = &report.execution_statistics {
        let totals = &stats.totals;
        println!(
            "\nExecuted: {} inserted, {} updated, {} skipped, {} deferred, {} failed ({:.1}% success)",
            totals.inserts,
            totals.updates,
            totals.skips,
            totals.records_deferred,
            totals.records_failed,
            stats.success_rate
        );
        for error in &stats.errors {
            println!("  ! {}", error);
        }
    }

    if let Some(verification) = &report.verification_report {
        println!(
            "\nVerification: {}/{} entities match ({:.1}%), difference {}, status: {}",
            verification.perfect_matches,
            verification.total_entities,
            verification.match_percentage,
            verification.overall_difference,
            verification.sync_status
        );
        for entity in verification.entities.iter().filter(|e| !e.matched) {
            match &entity.error {
                Some(error) => println!("  x {}: {}", entity.entity_name, error),
                None => println!(
                    "  x {}: source {} / target {} ({:+})",
                    entity.entity_name, entity.source_count, entity.target_count, entity.difference
                ),
            }
        }
    }
}

fn print_failures(report: &RunReport) {
    let failed: Vec<_> = report.failed_entities().collect();
    if failed.is_empty() {
        return;
    }

    println!("\nFailed entities:");
    for (entity, status) in failed {
        if let EntityStatus::Failed { stage, reason } = status {
            println!("  x {} ({}): {}", entity, stage, reason);
        }
    }
}

fn fail_on_entity_errors(report: &RunReport) -> Result<()> {
    let failed = report.execution_summary.entities_failed;
    if failed > 0 {
        anyhow::bail!("{} of {} entities failed", failed, report.execution_summary.entities_total);
    }
    Ok(())
}
