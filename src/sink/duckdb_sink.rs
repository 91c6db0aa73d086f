//! DuckDB-backed sink

use super::{Predicate, Sink};
use crate::error::{Error, Result};
use crate::frame::{Cell, Frame};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use duckdb::types::{TimeUnit, Value};
use duckdb::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const TIMESTAMP: &str = "TIMESTAMP";

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Sink over a DuckDB database file or in-memory database
pub struct DuckDbSink {
    conn: Mutex<Connection>,
    location: String,
}

impl DuckDbSink {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::config(format!("Failed to open DuckDB at {}: {e}", path.display()))
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
            location: path.display().to_string(),
        })
    }

    /// Open a throwaway in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
            location: ":memory:".to_string(),
        })
    }

    /// Database path, or `:memory:`
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Names of all tables in the main schema
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tables)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::sink(&self.location, "connection lock poisoned"))
    }
}

impl Sink for DuckDbSink {
    fn drop_table(&self, table: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote(table)))?;
        debug!("Dropped table {}", table);
        Ok(())
    }

    fn insert_append_typed(
        &self,
        table: &str,
        frame: &Frame,
        timestamp_columns: &[&str],
    ) -> Result<usize> {
        if frame.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let column_type = |name: &str| {
            if timestamp_columns.contains(&name) {
                Some(TIMESTAMP)
            } else {
                infer_type(frame, name)
            }
        };

        let existing = table_columns(&tx, table)?;
        if existing.is_empty() {
            let columns: Vec<String> = frame
                .columns()
                .iter()
                .map(|name| {
                    let sql_type = column_type(name.as_str()).unwrap_or("VARCHAR");
                    format!("{} {}", quote(name), sql_type)
                })
                .collect();
            tx.execute_batch(&format!(
                "CREATE TABLE {} ({})",
                quote(table),
                columns.join(", ")
            ))?;
        } else {
            for name in frame.columns() {
                let wanted = column_type(name.as_str());
                match existing.iter().find(|(col, _)| col == name) {
                    None => tx.execute_batch(&format!(
                        "ALTER TABLE {} ADD COLUMN {} {}",
                        quote(table),
                        quote(name),
                        wanted.unwrap_or("VARCHAR")
                    ))?,
                    Some((_, current)) => {
                        // A text column that never held a value can still become a timestamp
                        let target = if current == "VARCHAR"
                            && wanted == Some(TIMESTAMP)
                            && is_all_null(&tx, table, name)?
                        {
                            Some(TIMESTAMP)
                        } else {
                            widened_type(current, wanted)
                        };
                        if let Some(target) = target {
                            tx.execute_batch(&format!(
                                "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
                                quote(table),
                                quote(name),
                                target
                            ))?;
                        }
                    }
                }
            }
        }

        let column_list: Vec<String> = frame.columns().iter().map(|c| quote(c)).collect();
        let placeholders = vec!["?"; frame.columns().len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(table),
            column_list.join(", "),
            placeholders
        );

        {
            let mut stmt = tx.prepare(&sql)?;
            for row in frame.rows() {
                stmt.execute(params_from_iter(row.iter().map(cell_to_value)))?;
            }
        }
        tx.commit()?;

        debug!("Inserted {} rows into {}", frame.len(), table);
        Ok(frame.len())
    }

    fn read_table(&self, table: &str) -> Result<Option<Frame>> {
        let conn = self.lock()?;
        let columns: Vec<String> = table_columns(&conn, table)?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        if columns.is_empty() {
            return Ok(None);
        }

        let select: Vec<String> = columns.iter().map(|c| quote(c)).collect();
        let sql = format!("SELECT {} FROM {}", select.join(", "), quote(table));
        let mut stmt = conn.prepare(&sql)?;
        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|idx| row.get::<_, Value>(idx).map(value_to_cell))
                    .collect::<std::result::Result<Vec<Cell>, _>>()
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(Frame::from_rows(columns, rows)?))
    }

    fn delete_where(&self, table: &str, predicate: &Predicate) -> Result<usize> {
        let conn = self.lock()?;
        if table_columns(&conn, table)?.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM {} WHERE {} {} ?",
            quote(table),
            quote(predicate.column()),
            predicate.operator()
        );
        let deleted = conn.execute(&sql, params_from_iter([cell_to_value(predicate.value())]))?;
        debug!("Deleted {} rows from {}", deleted, table);
        Ok(deleted)
    }

    fn max_timestamp(&self, table: &str, column: &str) -> Result<Option<NaiveDateTime>> {
        let conn = self.lock()?;
        if table_columns(&conn, table)?.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT MAX(CAST({} AS TIMESTAMP)) FROM {}",
            quote(column),
            quote(table)
        );
        let value: Value = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(value_to_cell(value).as_timestamp())
    }
}

impl std::fmt::Debug for DuckDbSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbSink")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Column names and types of a table; empty when it does not exist
fn table_columns(conn: &Connection, table: &str) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT column_name, data_type FROM information_schema.columns
         WHERE table_schema = 'main' AND table_name = ? ORDER BY ordinal_position",
    )?;
    let columns = stmt
        .query_map(params![table], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Whether a column holds no values at all
fn is_all_null(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let sql = format!(
        "SELECT COUNT({}) FROM {}",
        quote(column),
        quote(table)
    );
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count == 0)
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// SQL type for a column from the cells it holds; `None` when all null
fn infer_type(frame: &Frame, column: &str) -> Option<&'static str> {
    let cells = frame.column(column).unwrap_or_default();
    let mut kind: Option<&'static str> = None;
    for cell in cells {
        let this = match cell {
            Cell::Null => continue,
            Cell::Bool(_) => "BOOLEAN",
            Cell::Int(_) => "BIGINT",
            Cell::Float(_) => "DOUBLE",
            Cell::Timestamp(_) => TIMESTAMP,
            Cell::Text(_) => "VARCHAR",
        };
        kind = match kind {
            None => Some(this),
            Some(prev) if prev == this => Some(prev),
            Some("BIGINT" | "DOUBLE") if matches!(this, "BIGINT" | "DOUBLE") => Some("DOUBLE"),
            Some(_) => return Some("VARCHAR"),
        };
    }
    kind
}

/// Type an existing column must change to before taking new values
fn widened_type(current: &str, wanted: Option<&str>) -> Option<&'static str> {
    match (current, wanted?) {
        (current, wanted) if current == wanted => None,
        ("VARCHAR", _) | ("DOUBLE", "BIGINT") => None,
        ("BIGINT", "DOUBLE") => Some("DOUBLE"),
        _ => Some("VARCHAR"),
    }
}

fn cell_to_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Bool(b) => Value::Boolean(*b),
        Cell::Int(i) => Value::BigInt(*i),
        Cell::Float(f) => Value::Double(*f),
        Cell::Text(s) => Value::Text(s.clone()),
        Cell::Timestamp(ts) => {
            Value::Timestamp(TimeUnit::Microsecond, ts.and_utc().timestamp_micros())
        }
    }
}

fn value_to_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Boolean(b) => Cell::Bool(b),
        Value::TinyInt(i) => Cell::Int(i.into()),
        Value::SmallInt(i) => Cell::Int(i.into()),
        Value::Int(i) => Cell::Int(i.into()),
        Value::BigInt(i) => Cell::Int(i),
        Value::UTinyInt(i) => Cell::Int(i.into()),
        Value::USmallInt(i) => Cell::Int(i.into()),
        Value::UInt(i) => Cell::Int(i.into()),
        Value::UBigInt(i) => i64::try_from(i).map_or_else(|_| Cell::Text(i.to_string()), Cell::Int),
        Value::HugeInt(i) => Cell::Text(i.to_string()),
        Value::Float(f) => Cell::Float(f.into()),
        Value::Double(f) => Cell::Float(f),
        Value::Text(s) => Cell::Text(s),
        Value::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map_or(Cell::Null, |dt| Cell::Timestamp(dt.naive_utc()))
        }
        Value::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map_or(Cell::Null, Cell::Timestamp),
        other => Cell::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_identifiers() {
        assert_eq!(quote("GoogleClassroom_Courses"), "\"GoogleClassroom_Courses\"");
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_infer_type() {
        let frame = Frame::from_rows(
            ["a", "b", "c", "d", "e"],
            vec![
                vec![Cell::Int(1), Cell::Null, Cell::Bool(true), Cell::text("x"), Cell::Null],
                vec![Cell::Float(1.5), Cell::Null, Cell::Bool(false), Cell::Int(2), Cell::Null],
            ],
        )
        .unwrap();

        assert_eq!(infer_type(&frame, "a"), Some("DOUBLE"));
        assert_eq!(infer_type(&frame, "e"), None);
        assert_eq!(infer_type(&frame, "b"), None);
        assert_eq!(infer_type(&frame, "c"), Some("BOOLEAN"));
        assert_eq!(infer_type(&frame, "d"), Some("VARCHAR"));
    }

    #[test]
    fn test_widened_type() {
        assert_eq!(widened_type("DOUBLE", Some("VARCHAR")), Some("VARCHAR"));
        assert_eq!(widened_type("BOOLEAN", Some("DOUBLE")), Some("VARCHAR"));
        assert_eq!(widened_type("BIGINT", Some("DOUBLE")), Some("DOUBLE"));
        assert_eq!(widened_type("DOUBLE", Some("BIGINT")), None);
        assert_eq!(widened_type("TIMESTAMP", None), None);
        assert_eq!(widened_type("VARCHAR", Some("DOUBLE")), None);
        assert_eq!(widened_type("DOUBLE", Some("DOUBLE")), None);
    }

    #[test]
    fn test_value_to_cell() {
        assert_eq!(value_to_cell(Value::Null), Cell::Null);
        assert_eq!(value_to_cell(Value::Int(42)), Cell::Int(42));
        assert_eq!(value_to_cell(Value::Text("x".into())), Cell::text("x"));
        assert_eq!(
            value_to_cell(Value::Date32(0)),
            Cell::Timestamp(NaiveDateTime::default())
        );

        let ts = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(value_to_cell(cell_to_value(&Cell::Timestamp(ts))), Cell::Timestamp(ts));
    }
}
