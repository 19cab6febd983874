// src/db/schema.rs

//! Target table definitions derived from the mapping registry
//!
//! Each entity gets a table whose primary-key column is `TEXT PRIMARY KEY`
//! and whose remaining mapped columns carry no declared type, so values are
//! stored with the type they were written with.

use rusqlite::Connection;
use tracing::{debug, info};

use super::table::{quote_ident, table_exists};
use crate::error::Result;
use crate::mapping::{EntityMapping, MappingRegistry};

/// `CREATE TABLE` statement for one entity
pub fn create_table_sql(mapping: &EntityMapping) -> String {
    let mut columns = vec![format!(
        "{} TEXT PRIMARY KEY NOT NULL",
        quote_ident(&mapping.target_primary_key)
    )];
    columns.extend(mapping.non_key_columns().map(quote_ident));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_ident(&mapping.target_table),
        columns.join(",\n    ")
    )
}

/// Create every missing target table, returning the names created
pub fn create_target_tables(conn: &Connection, registry: &MappingRegistry) -> Result<Vec<String>> {
    let mut created = Vec::new();

    for mapping in registry.iter() {
        if table_exists(conn, &mapping.target_table)? {
            debug!("Table {} already exists", mapping.target_table);
            continue;
        }

        info!(
            "Creating table {} for entity {}",
            mapping.target_table, mapping.entity_name
        );
        conn.execute_batch(&create_table_sql(mapping))?;
        created.push(mapping.target_table.clone());
    }

    Ok(created)
}
