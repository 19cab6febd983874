// src/commands/generations.rs
//! Generation listing

use anyhow::{Context, Result};
use ledgersync::RecordSource;

use super::Settings;

/// List generations under the source directory, newest first
pub fn cmd_generations(settings: &Settings) -> Result<()> {
    let source = settings.source();
    let generations = source
        .list_generations()
        .with_context(|| format!("Failed to list generations in {}", source.describe()))?;

    if generations.is_empty() {
        println!("No generations found in {}", source.describe());
        return Ok(());
    }

    println!("Generations in {}:", source.describe());
    for (i, generation) in generations.iter().enumerate() {
        let marker = if i == 0 { " (latest)" } else { "" };
        match generation.timestamp() {
            Some(ts) => println!("  {}  {}{}", generation, ts.format("%a %d %b %Y %H:%M:%S"), marker),
            None => println!("  {}{}", generation, marker),
        }
    }
    Ok(())
}
