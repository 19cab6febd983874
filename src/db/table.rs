// src/db/table.rs

//! Row-level access to entity tables.

use rusqlite::{params_from_iter, Connection};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::record::{from_sql, to_sql, Record};

/// Quote an identifier for use in SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check whether a table (or view) exists
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master
         WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Fail with `TargetTableMissing` unless the table exists
pub fn require_table(conn: &Connection, table: &str) -> Result<()> {
    if table_exists(conn, table)? {
        Ok(())
    } else {
        Err(Error::TargetTableMissing(table.to_string()))
    }
}

/// Load every row of a table as a record keyed by column name
pub fn load_rows(conn: &Connection, table: &str) -> Result<Vec<Record>> {
    require_table(conn, table)?;

    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let rows = stmt
        .query_map([], |row| {
            let mut record = Record::new();
            for (i, column) in columns.iter().enumerate() {
                record.insert(column.clone(), from_sql(row.get_ref(i)?));
            }
            Ok(record)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Number of rows in a table
pub fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    require_table(conn, table)?;

    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Insert one row, returning the number of rows written
pub fn insert_row(conn: &Connection, table: &str, columns: &[(&str, Value)]) -> Result<usize> {
    let names: Vec<String> = columns.iter().map(|(c, _)| quote_ident(c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        names.join(", "),
        placeholders.join(", ")
    );

    let values = columns.iter().map(|(_, v)| to_sql(v));
    Ok(conn.execute(&sql, params_from_iter(values))?)
}

/// Update the row whose `key_column` equals `key`, returning rows affected
pub fn update_row(
    conn: &Connection,
    table: &str,
    key_column: &str,
    key: &str,
    columns: &[(&str, Value)],
) -> Result<usize> {
    if columns.is_empty() {
        return Ok(0);
    }

    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, (c, _))| format!("{} = ?{}", quote_ident(c), i + 1))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_ident(table),
        assignments.join(", "),
        quote_ident(key_column),
        columns.len() + 1
    );

    let values = columns
        .iter()
        .map(|(_, v)| to_sql(v))
        .chain(std::iter::once(to_sql(&Value::String(key.to_string()))));
    Ok(conn.execute(&sql, params_from_iter(values))?)
}
