//! Engine configuration and statistics

use crate::entity::{EntityKind, TABLE_PREFIX};
use crate::http::RetryPolicy;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pause after a batch that hit the request quota
pub const QUOTA_COOLDOWN: Duration = Duration::from_secs(20);

/// Configuration for pull and sync runs
#[derive(Debug, Clone)]
pub struct PullConfig {
    /// Batch size overrides by entity
    pub batch_sizes: HashMap<EntityKind, usize>,
    /// Pause after a batch with at least one quota failure
    pub cooldown: Duration,
    /// Debug mode: whole-batch retries are disabled
    pub debug: bool,
    /// Directory for raw JSONL dumps, when enabled
    pub dump_dir: Option<PathBuf>,
    /// Warehouse table name prefix
    pub table_prefix: String,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            batch_sizes: HashMap::new(),
            cooldown: QUOTA_COOLDOWN,
            debug: false,
            dump_dir: None,
            table_prefix: TABLE_PREFIX.to_string(),
        }
    }
}

impl PullConfig {
    /// Create a new pull config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the batch size of one entity
    #[must_use]
    pub fn with_batch_size(mut self, kind: EntityKind, size: usize) -> Self {
        self.batch_sizes.insert(kind, size.max(1));
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

    /// Dump raw batches under this directory
    #[must_use]
    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    /// Set the table prefix
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Effective batch size of an entity
    pub fn batch_size(&self, kind: EntityKind) -> usize {
        self.batch_sizes
            .get(&kind)
            .copied()
            .unwrap_or(kind.descriptor().batch_size)
    }

    /// Warehouse table of an entity
    pub fn table_name(&self, kind: EntityKind) -> String {
        kind.table_name(&self.table_prefix)
    }

    /// Whole-batch retry policy for the current mode
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::for_mode(self.debug)
    }

    /// JSONL dump file of an entity, if dumping is enabled
    pub fn dump_path(&self, kind: EntityKind) -> Option<PathBuf> {
        self.dump_dir
            .as_deref()
            .map(|dir: &Path| dir.join(format!("{}.jsonl", kind.name().to_lowercase())))
    }
}

/// Statistics from one pull
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullStats {
    /// Requests submitted, including resubmissions
    pub requests: usize,
    /// Batches submitted
    pub batches: usize,
    /// Raw records received
    pub records: usize,
    /// Rows written to the warehouse
    pub rows_written: usize,
    /// Work items requeued after a quota failure
    pub requeued: usize,
    /// Work items dropped after a non-retryable failure
    pub dropped: usize,
    /// Responses suppressed as partial data
    pub partial: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PullStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every seeded partition was fully fetched
    pub fn is_complete(&self) -> bool {
        self.dropped == 0
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
