//! Roster sync
//!
//! Reconciles a desired roster (CSV or an in-memory frame) against what
//! the warehouse last pulled, then submits create and delete mutations in
//! batches.
//!
//! # Overview
//!
//! The sync module provides:
//! - `SyncEngine` - diffs and submits one syncable entity
//! - `SyncConfig` - batch size, cooldown, sync file directory
//! - `SyncDiff` / `SyncStats` - what was found and what was done
//! - `read_csv` / `parse_csv` - desired-state input

mod input;
mod types;

pub use input::{parse_csv, read_csv};
pub use types::{SyncConfig, SyncDiff, SyncStats, ALIAS_PREFIX};

use crate::api::{ApiRequest, BatchTransport};
use crate::engine::BatchRunner;
use crate::entity::{self, EntityDescriptor, EntityKind, SyncSpec};
use crate::error::{Error, Result};
use crate::frame::{Cell, Frame};
use crate::sink::Sink;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Columns of the cleaned current course state
const COURSE_SYNC_COLUMNS: &[&str] = &["courseId", "name", "section"];

/// Roster sync engine
pub struct SyncEngine {
    transport: Arc<dyn BatchTransport>,
    sink: Arc<dyn Sink>,
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(transport: Arc<dyn BatchTransport>, sink: Arc<dyn Sink>) -> Self {
        Self {
            transport,
            sink,
            config: SyncConfig::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the sync configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Path of the desired-state file for an entity
    pub fn sync_file(&self, kind: EntityKind) -> PathBuf {
        self.config
            .sync_dir
            .join(format!("{}.csv", kind.name().to_lowercase()))
    }

    /// Sync one entity.
    ///
    /// `desired` defaults to the entity's CSV in the sync directory.
    /// Returns the diff that was acted on.
    pub async fn sync(&self, kind: EntityKind, desired: Option<Frame>) -> Result<SyncDiff> {
        self.run(kind, desired).await.map(|(diff, _)| diff)
    }

    /// Sync one entity, returning both the diff and what was submitted
    pub async fn run(
        &self,
        kind: EntityKind,
        desired: Option<Frame>,
    ) -> Result<(SyncDiff, SyncStats)> {
        let diff = self.diff(kind, desired)?;
        let stats = self.submit(kind, &diff).await?;
        info!(
            "{kind}: sync finished ({} created, {} deleted, {} deletes skipped, {} failed)",
            stats.created, stats.deleted, stats.deletes_skipped, stats.failed
        );
        Ok((diff, stats))
    }

    /// Compute the diff without submitting anything
    pub fn diff(&self, kind: EntityKind, desired: Option<Frame>) -> Result<SyncDiff> {
        let spec = sync_spec(kind)?;

        let desired = match desired {
            Some(frame) => frame,
            None => {
                let path = self.sync_file(kind);
                debug!("{kind}: reading desired state from {}", path.display());
                read_csv(&path)?
            }
        };
        let desired = self.prefix_aliases(kind, desired)?;
        for key in spec.join_keys {
            if !desired.has_column(key) {
                return Err(Error::sync(
                    kind.name(),
                    format!("desired state has no '{key}' column"),
                ));
            }
        }

        let current = self.current_state(kind)?;
        let diff = desired.outer_diff(&current, spec.join_keys)?;

        Ok(SyncDiff {
            to_create: diff.left_only.drop_null_columns(),
            to_delete: diff.right_only.drop_null_columns(),
            unchanged: diff.both,
        })
    }

    /// Submit the mutations a diff calls for
    pub async fn submit(&self, kind: EntityKind, diff: &SyncDiff) -> Result<SyncStats> {
        let spec = sync_spec(kind)?;
        let mut stats = SyncStats::default();

        let mut requests: HashMap<String, ApiRequest> = HashMap::new();
        let mut pending: Vec<String> = Vec::new();

        info!("{kind}: {} new items to create.", diff.to_create.len());
        for (idx, row) in diff.to_create.iter().enumerate() {
            let id = idx.to_string();
            requests.insert(id.clone(), entity::create_request(kind, row)?);
            pending.push(id);
        }
        let creates = pending.len();

        if spec.delete_on_sync {
            info!("{kind}: {} new items to delete.", diff.to_delete.len());
            for (idx, row) in diff.to_delete.iter().enumerate() {
                let id = (creates + idx).to_string();
                requests.insert(id.clone(), entity::delete_request(kind, row)?);
                pending.push(id);
            }
        } else if !diff.to_delete.is_empty() {
            info!(
                "{kind}: {} items missing from the desired state; deletion is disabled.",
                diff.to_delete.len()
            );
            stats.deletes_skipped = diff.to_delete.len();
        }

        let runner = BatchRunner::new(
            self.transport.as_ref(),
            self.config.retry_policy(),
            self.config.cooldown,
        );

        while !pending.is_empty() {
            info!("{kind}: {} requests remaining.", pending.len());
            let take = self.config.batch_size.min(pending.len());
            let batch: Vec<(String, ApiRequest)> = pending
                .split_off(pending.len() - take)
                .into_iter()
                .rev()
                .filter_map(|id| requests.get(&id).map(|r| (id, r.clone())))
                .collect();
            stats.batches += 1;

            let mut quota_exceeded = false;
            for response in runner.submit(kind.name(), batch).await? {
                let is_create = response
                    .id
                    .parse::<usize>()
                    .map_err(|_| Error::request_id(&response.id, "not a sync request index"))?
                    < creates;
                match response.result {
                    Ok(_) if is_create => stats.created += 1,
                    Ok(_) => stats.deleted += 1,
                    Err(error) if error.is_quota_exceeded() => {
                        quota_exceeded = true;
                        stats.requeued += 1;
                        pending.push(response.id);
                    }
                    Err(error) if error.is_internal() => {
                        stats.requeued += 1;
                        pending.push(response.id);
                    }
                    Err(error) => {
                        stats.failed += 1;
                        warn!(
                            "{kind}: request {} failed with {}: {}",
                            response.id, error.status, error.message
                        );
                    }
                }
            }

            if quota_exceeded {
                runner.cool_down(kind.name()).await;
            }
        }

        Ok(stats)
    }

    fn prefix_aliases(&self, kind: EntityKind, mut desired: Frame) -> Result<Frame> {
        let prefix = self.config.alias_prefix.as_str();
        desired
            .map_column("alias", |cell| {
                Ok(match cell.to_text() {
                    Some(alias) => Cell::Text(format!("{prefix}{alias}")),
                    None => Cell::Null,
                })
            })
            .map_err(|_| Error::sync(kind.name(), "desired state has no 'alias' column"))?;
        Ok(desired)
    }

    /// Current state joined with course aliases
    fn current_state(&self, kind: EntityKind) -> Result<Frame> {
        let current = cleaned_current(kind, self.read_strings(kind)?)?;
        let aliases = self.read_strings(EntityKind::CourseAliases)?;
        current.inner_join(&aliases, "courseId")
    }

    /// Read an entity's table as text, empty with its schema when absent
    fn read_strings(&self, kind: EntityKind) -> Result<Frame> {
        let descriptor: &EntityDescriptor = kind.descriptor();
        let table = kind.table_name(&self.config.table_prefix);
        Ok(match self.sink.read_table(&table)? {
            Some(frame) => frame.to_strings(),
            None => {
                debug!("{kind}: table {table} does not exist, treating as empty");
                Frame::new(descriptor.columns.iter().copied())
            }
        })
    }
}

fn sync_spec(kind: EntityKind) -> Result<SyncSpec> {
    kind.descriptor()
        .sync
        .ok_or_else(|| Error::sync(kind.name(), "entity does not support sync"))
}

/// Per-entity cleanup of the pulled table before diffing.
///
/// Courses keep only ACTIVE rows, expose `id` as `courseId` and drop
/// everything but the compared columns.
fn cleaned_current(kind: EntityKind, mut frame: Frame) -> Result<Frame> {
    match kind {
        EntityKind::Courses => {
            frame.retain(|row| row.get_str("courseState") == Some("ACTIVE"));
            frame.rename("id", "courseId");
            frame.select(COURSE_SYNC_COLUMNS)
        }
        _ => Ok(frame),
    }
}

#[cfg(test)]
mod tests;
