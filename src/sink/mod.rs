//! Warehouse sink
//!
//! The storage boundary the pull and sync engines write to and read from.
//! `DuckDbSink` is the production implementation.

mod duckdb_sink;

pub use duckdb_sink::DuckDbSink;

use crate::error::Result;
use crate::frame::{Cell, Frame};
use chrono::NaiveDateTime;

/// Row predicate for targeted deletes
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column >= value`
    AtOrAfter { column: String, value: Cell },
    /// `column > value`
    After { column: String, value: Cell },
    /// `column = value`
    Equals { column: String, value: Cell },
}

impl Predicate {
    /// Rows at or after a timestamp
    pub fn at_or_after(column: impl Into<String>, value: NaiveDateTime) -> Self {
        Self::AtOrAfter {
            column: column.into(),
            value: Cell::Timestamp(value),
        }
    }

    /// Rows strictly after a timestamp
    pub fn after(column: impl Into<String>, value: NaiveDateTime) -> Self {
        Self::After {
            column: column.into(),
            value: Cell::Timestamp(value),
        }
    }

    /// Column the predicate tests
    pub fn column(&self) -> &str {
        match self {
            Self::AtOrAfter { column, .. } | Self::After { column, .. } | Self::Equals { column, .. } => {
                column
            }
        }
    }

    /// Value the column is compared to
    pub fn value(&self) -> &Cell {
        match self {
            Self::AtOrAfter { value, .. } | Self::After { value, .. } | Self::Equals { value, .. } => {
                value
            }
        }
    }

    /// SQL comparison operator
    pub fn operator(&self) -> &'static str {
        match self {
            Self::AtOrAfter { .. } => ">=",
            Self::After { .. } => ">",
            Self::Equals { .. } => "=",
        }
    }
}

/// Relational warehouse the engines load into
pub trait Sink: Send + Sync {
    /// Drop a table; absent tables are fine
    fn drop_table(&self, table: &str) -> Result<()>;

    /// Append rows, creating the table from the frame's columns if needed.
    /// Returns the number of rows written.
    fn insert_append(&self, table: &str, frame: &Frame) -> Result<usize> {
        self.insert_append_typed(table, frame, &[])
    }

    /// Append rows like `insert_append`, but any of `timestamp_columns` the
    /// table does not have yet is created as a timestamp column even when
    /// every value in this frame is null.
    fn insert_append_typed(
        &self,
        table: &str,
        frame: &Frame,
        timestamp_columns: &[&str],
    ) -> Result<usize>;

    /// Read a whole table, or `None` when it does not exist
    fn read_table(&self, table: &str) -> Result<Option<Frame>>;

    /// Delete matching rows. Returns the number deleted; absent tables
    /// delete nothing.
    fn delete_where(&self, table: &str, predicate: &Predicate) -> Result<usize>;

    /// Largest timestamp in a column, if the table exists and has one
    fn max_timestamp(&self, table: &str, column: &str) -> Result<Option<NaiveDateTime>> {
        Ok(self
            .read_table(table)?
            .and_then(|frame| frame.max_timestamp(column)))
    }
}
