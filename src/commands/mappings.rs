// src/commands/mappings.rs
//! Mapping registry inspection

use anyhow::Result;

use super::Settings;

/// List every registered entity
pub fn cmd_mappings_list(settings: &Settings) -> Result<()> {
    println!("{} entities registered:", settings.registry.len());
    for mapping in settings.registry.iter() {
        println!(
            "  {:<22} -> {:<20} key {} -> {} ({} fields)",
            mapping.entity_name,
            mapping.target_table,
            mapping.source_primary_key,
            mapping.target_primary_key,
            mapping.field_map.len()
        );
    }
    Ok(())
}

/// Show one entity's field map
pub fn cmd_mappings_show(settings: &Settings, entity: &str) -> Result<()> {
    let mapping = settings.registry.get_mapping(entity)?;

    println!("Entity:      {}", mapping.entity_name);
    println!("Table:       {}", mapping.target_table);
    println!(
        "Primary key: {} -> {}",
        mapping.source_primary_key, mapping.target_primary_key
    );
    println!("Fields:");
    for field in &mapping.field_map {
        let marker = if field.target == mapping.target_primary_key {
            " (key)"
        } else {
            ""
        };
        println!("  {:<28} -> {}{}", field.source, field.target, marker);
    }
    Ok(())
}
