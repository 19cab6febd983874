// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use ledgersync::{db, EntityMapping, FieldMapping, FsRecordSource, MappingRegistry};
use rusqlite::OptionalExtension;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Registry with a contacts entity `{id -> ID, name -> Name, email -> Email}`
/// and an items entity `{item_id -> ItemID, rate -> Rate}`.
pub fn test_registry() -> MappingRegistry {
    MappingRegistry::new(vec![
        EntityMapping::new(
            "contacts",
            "Contacts",
            "id",
            "ID",
            vec![
                FieldMapping::new("id", "ID"),
                FieldMapping::new("name", "Name"),
                FieldMapping::new("email", "Email"),
            ],
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

/// A temporary source directory and initialized target database.
///
/// Keep the struct alive for the duration of the test to prevent cleanup.
pub struct TestEnv {
    pub temp: TempDir,
    pub db_path: PathBuf,
    pub source_dir: PathBuf,
    pub registry: MappingRegistry,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_registry(test_registry())
    }

    pub fn with_registry(registry: MappingRegistry) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("ledger.db");
        let source_dir = temp.path().join("exports");
        fs::create_dir_all(&source_dir).unwrap();
        db::init(&db_path, &registry).unwrap();

        Self {
            temp,
            db_path,
            source_dir,
            registry,
        }
    }

    /// Write `{file}` into generation `generation`
    pub fn write_extract(&self, generation: &str, file: &str, content: &str) {
        let dir = self.source_dir.join(generation);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    pub fn source(&self) -> FsRecordSource {
        FsRecordSource::new(&self.source_dir)
    }

    /// Run a statement against the target database
    pub fn execute(&self, sql: &str) {
        let conn = db::open(&self.db_path).unwrap();
        conn.execute_batch(sql).unwrap();
    }

    /// Value of `column` in the row of `table` whose `key_column` is `key`
    pub fn column_text(&self, table: &str, key_column: &str, key: &str, column: &str) -> Option<String> {
        let conn = db::open(&self.db_path).unwrap();
        conn.query_row(
            &format!("SELECT CAST(\"{column}\" AS TEXT) FROM \"{table}\" WHERE \"{key_column}\" = ?1"),
            [key],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()
        .unwrap()
        .flatten()
    }

    pub fn row_count(&self, table: &str) -> usize {
        let conn = db::open(&self.db_path).unwrap();
        db::table::count_rows(&conn, table).unwrap()
    }
}
