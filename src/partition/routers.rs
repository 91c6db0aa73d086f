//! Partition router implementations
//!
//! Each router handles a specific partitioning strategy.

use super::types::PartitionRouter;
use crate::error::{Error, Result};
use crate::frame::Frame;
use chrono::NaiveDate;

/// Format of date partition values
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Parent Router
// ============================================================================

/// Parent table-based partition router
///
/// Creates partitions from a column of a previously loaded table, for
/// example course ids read back from the Courses table.
#[derive(Debug, Clone)]
pub struct ParentRouter {
    parent: Frame,
    parent_key: String,
}

impl ParentRouter {
    /// Create a new parent router
    pub fn new(parent: Frame, parent_key: impl Into<String>) -> Self {
        Self {
            parent,
            parent_key: parent_key.into(),
        }
    }
}

impl PartitionRouter for ParentRouter {
    fn partitions(&self) -> Result<Vec<String>> {
        if !self.parent.has_column(&self.parent_key) {
            return Err(Error::invalid_value(
                "parent_key",
                format!("parent table has no column '{}'", self.parent_key),
            ));
        }
        Ok(self
            .parent
            .distinct_text(&self.parent_key)
            .into_iter()
            .filter(|v| !v.is_empty())
            .collect())
    }
}

// ============================================================================
// Datetime Router
// ============================================================================

/// Day-by-day partition router
///
/// Creates one partition per day from `start` through `end`, inclusive.
#[derive(Debug, Clone)]
pub struct DatetimeRouter {
    start: NaiveDate,
    end: NaiveDate,
}

impl DatetimeRouter {
    /// Create a new daily router
    pub fn daily(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl PartitionRouter for DatetimeRouter {
    fn partitions(&self) -> Result<Vec<String>> {
        Ok(self
            .start
            .iter_days()
            .take_while(|day| *day <= self.end)
            .map(|day| day.format(DATE_FORMAT).to_string())
            .collect())
    }
}
