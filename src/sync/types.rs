//! Sync configuration, diff and statistics

use crate::engine::QUOTA_COOLDOWN;
use crate::entity::TABLE_PREFIX;
use crate::frame::Frame;
use crate::http::RetryPolicy;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Prefix marking district-owned course aliases
pub const ALIAS_PREFIX: &str = "d:";

/// Configuration for roster sync
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory holding `<entity>.csv` desired-state files
    pub sync_dir: PathBuf,
    /// Requests per batch
    pub batch_size: usize,
    /// Prefix added to every desired alias
    pub alias_prefix: String,
    /// Pause after a batch with at least one quota failure
    pub cooldown: Duration,
    /// Debug mode: whole-batch retries are disabled
    pub debug: bool,
    /// Warehouse table name prefix
    pub table_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_dir: PathBuf::from("sync_files"),
            batch_size: 1000,
            alias_prefix: ALIAS_PREFIX.to_string(),
            cooldown: QUOTA_COOLDOWN,
            debug: false,
            table_prefix: TABLE_PREFIX.to_string(),
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory of desired-state files
    #[must_use]
    pub fn with_sync_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sync_dir = dir.into();
        self
    }

    /// Set batch size
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the quota cooldown
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set debug mode
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the table prefix
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Whole-batch retry policy for the current mode
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::for_mode(self.debug)
    }
}

/// Desired versus current state of one entity
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncDiff {
    /// Desired rows with no current match
    pub to_create: Frame,
    /// Current rows with no desired match
    pub to_delete: Frame,
    /// Rows present on both sides
    pub unchanged: Frame,
}

/// Statistics from one sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Create requests that succeeded
    pub created: usize,
    /// Delete requests that succeeded
    pub deleted: usize,
    /// Deletes found but not submitted
    pub deletes_skipped: usize,
    /// Requests requeued after a 429 or 500
    pub requeued: usize,
    /// Requests that failed permanently
    pub failed: usize,
    /// Batches submitted
    pub batches: usize,
}
