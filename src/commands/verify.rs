// src/commands/verify.rs
//! Standalone verification command

use anyhow::{Context, Result};
use ledgersync::RecordSource;
use ledgersync::sync::VerificationReporter;
use tracing::info;

use super::Settings;

/// Recount source and target for a generation and print the match table
pub fn cmd_verify(settings: &Settings, generation: Option<String>, entities: Vec<String>) -> Result<()> {
    let source = settings.source();
    let generation = source
        .resolve_generation(generation.as_deref())
        .context("No generation to verify against")?;

    let mut entities = settings.entities_or(entities);
    if entities.is_empty() {
        entities = settings
            .registry
            .entity_names()
            .into_iter()
            .map(String::from)
            .collect();
    }

    info!("Verifying {} entities against generation {}", entities.len(), generation);
    let reporter = VerificationReporter::new(&settings.registry, &source, &settings.db_path);
    let report = reporter.verify(&generation, &entities);

    println!("Generation {}", report.generation);
    println!(
        "\n{:<22} {:>8} {:>8} {:>8}  Match",
        "Entity", "Source", "Target", "Diff"
    );
    for entity in &report.entities {
        match &entity.error {
            Some(error) => println!("{:<22} error: {}", entity.entity_name, error),
            None => println!(
                "{:<22} {:>8} {:>8} {:>+8}  {}",
                entity.entity_name,
                entity.source_count,
                entity.target_count,
                entity.difference,
                if entity.matched { "yes" } else { "no" }
            ),
        }
    }

    println!(
        "\n{}/{} entities match ({:.1}%), overall difference {}",
        report.perfect_matches,
        report.total_entities,
        report.match_percentage,
        report.overall_difference
    );
    println!("Status: {}", report.sync_status);
    Ok(())
}
