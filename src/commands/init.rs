// src/commands/init.rs
//! Target store initialization

use anyhow::{Context, Result};
use tracing::info;

use super::Settings;

/// Create the target database and any missing entity tables
pub fn cmd_init(settings: &Settings) -> Result<()> {
    info!("Initializing target store at {}", settings.db_path.display());
    let created = ledgersync::db::init(&settings.db_path, &settings.registry)
        .with_context(|| format!("Failed to initialize {}", settings.db_path.display()))?;

    if created.is_empty() {
        println!(
            "Target store at {} already has all {} tables",
            settings.db_path.display(),
            settings.registry.len()
        );
    } else {
        println!("Created {} table(s) in {}:", created.len(), settings.db_path.display());
        for table in created {
            println!("  {}", table);
        }
    }
    Ok(())
}
