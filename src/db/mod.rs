// src/db/mod.rs

//! Target store access
//!
//! The target store is a SQLite database with one table per entity, as
//! declared in the mapping registry. Connections are short-lived: callers
//! open one per entity and stage and drop it when done.

pub mod schema;
pub mod table;

use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::Result;
use crate::mapping::MappingRegistry;

/// How long a connection waits on a locked database
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a connection to the target store
pub fn open(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();
    debug!("Opening target store at {}", db_path.display());
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    Ok(conn)
}

/// Create the target store and every table the registry declares
///
/// Existing tables are left untouched. Returns the tables that were created.
pub fn init(db_path: impl AsRef<Path>, registry: &MappingRegistry) -> Result<Vec<String>> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut conn = open(db_path)?;
    let created = transaction(&mut conn, |tx| schema::create_target_tables(tx, registry))?;
    info!(
        "Target store at {} ready ({} table(s) created)",
        db_path.display(),
        created.len()
    );
    Ok(created)
}

/// Run `f` inside a transaction, committing on success and rolling back on error
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}
