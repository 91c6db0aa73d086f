//! Frame implementation
//!
//! Column-ordered table of `Cell` rows.

use super::cell::{compare_cells, Cell};
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use std::cmp::Ordering;

/// An ordered set of named columns and rows of cells
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Borrowed view of one row, addressable by column name
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    /// Get a cell by column name
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.cells.get(idx))
    }

    /// Get a text cell by column name
    pub fn get_str(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Cell::as_str)
    }

    /// All cells in column order
    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }
}

impl Frame {
    /// Create an empty frame with the given columns
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a frame from columns and rows, checking row widths
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self> {
        let mut frame = Self::new(columns);
        for row in rows {
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Other(format!(
                "Row has {} cells but frame has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append every row of another frame with the same columns
    pub fn extend(&mut self, other: Frame) -> Result<()> {
        if other.columns != self.columns {
            return Err(Error::Other(format!(
                "Cannot append frame with columns {:?} to frame with columns {:?}",
                other.columns, self.columns
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw rows
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Consume into raw rows
    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }

    /// Iterate row views
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row {
            columns: &self.columns,
            cells,
        })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the frame has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Whether the column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All cells of one column
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Cell at a row and column
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Conform to exactly `columns`, in order; missing columns become null
    #[must_use]
    pub fn reindex<S: AsRef<str>>(&self, columns: &[S]) -> Frame {
        let positions: Vec<Option<usize>> = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|pos| pos.map_or(Cell::Null, |idx| row[idx].clone()))
                    .collect()
            })
            .collect();

        Frame {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows,
        }
    }

    /// Project onto existing columns, failing on unknown names
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Frame> {
        for column in columns {
            if !self.has_column(column.as_ref()) {
                return Err(Error::Other(format!(
                    "Column '{}' not found in frame",
                    column.as_ref()
                )));
            }
        }
        Ok(self.reindex(columns))
    }

    /// Rename a column in place; unknown names are ignored
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
    }

    /// Keep rows for which the predicate holds
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(Row<'_>) -> bool,
    {
        let columns = &self.columns;
        self.rows.retain(|cells| keep(Row { columns, cells }));
    }

    /// Return a filtered copy
    #[must_use]
    pub fn filter<F>(&self, keep: F) -> Frame
    where
        F: FnMut(Row<'_>) -> bool,
    {
        let mut out = self.clone();
        out.retain(keep);
        out
    }

    /// Replace every cell of one column through `f`
    pub fn map_column<F>(&mut self, column: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&Cell) -> Result<Cell>,
    {
        let idx = self
            .column_index(column)
            .ok_or_else(|| Error::Other(format!("Column '{column}' not found in frame")))?;
        for row in &mut self.rows {
            row[idx] = f(&row[idx])?;
        }
        Ok(())
    }

    /// Add a column filled by `f` for each row
    pub fn add_column<F>(&mut self, name: impl Into<String>, mut f: F)
    where
        F: FnMut(Row<'_>) -> Cell,
    {
        let columns = self.columns.clone();
        for row in &mut self.rows {
            let value = f(Row {
                columns: &columns,
                cells: row,
            });
            row.push(value);
        }
        self.columns.push(name.into());
    }

    /// Convert every non-null cell into text
    #[must_use]
    pub fn to_strings(&self) -> Frame {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| Cell::from(c.to_text())).collect())
            .collect();
        Frame {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Drop columns whose every cell is null
    #[must_use]
    pub fn drop_null_columns(&self) -> Frame {
        let keep: Vec<&String> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.rows.iter().any(|row| !row[*idx].is_null()))
            .map(|(_, name)| name)
            .collect();
        self.reindex(&keep)
    }

    /// Stable sort by the given key columns
    pub fn sort_by_columns<S: AsRef<str>>(&mut self, keys: &[S]) {
        let positions: Vec<usize> = keys
            .iter()
            .filter_map(|k| self.column_index(k.as_ref()))
            .collect();
        self.rows.sort_by(|a, b| {
            positions
                .iter()
                .map(|&idx| compare_cells(&a[idx], &b[idx]))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Largest timestamp in a column, if any
    pub fn max_timestamp(&self, column: &str) -> Option<NaiveDateTime> {
        self.column(column)?
            .into_iter()
            .filter_map(Cell::as_timestamp)
            .max()
    }

    /// Distinct non-null text values of a column, in first-seen order
    pub fn distinct_text(&self, column: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.column(column)
            .unwrap_or_default()
            .into_iter()
            .filter_map(Cell::to_text)
            .filter(|v| seen.insert(v.clone()))
            .collect()
    }
}
