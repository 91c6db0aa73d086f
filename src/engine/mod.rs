//! Pull engine module
//!
//! Batched pagination with quota-aware retry.
//!
//! # Overview
//!
//! The engine module provides:
//! - `WorkItem` / `RequestId` - one request and the id that round-trips it
//! - `ResponseOutcome` - classification of a single response
//! - `PullState` - pending stack, record buffer, quota flag and stats
//! - `PullEngine` - drives a pull from seeding to the last flush
//!
//! A pull seeds one work item per partition, then repeatedly pops a batch,
//! submits it, applies each response, normalizes and appends whatever was
//! buffered, and cools down once if any response hit the quota.

mod batch;
mod codec;
mod state;
mod types;

pub(crate) use batch::BatchRunner;
pub use codec::{RequestId, WorkItem};
pub use state::{PullState, ResponseOutcome};
pub use types::{PullConfig, PullStats, QUOTA_COOLDOWN};

use crate::api::{ApiRequest, BatchTransport};
use crate::entity::{self, EntityContext, EntityKind};
use crate::error::Result;
use crate::normalize::normalize;
use crate::partition::PartitionPlan;
use crate::sink::Sink;
use crate::types::WriteMode;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Pull engine for loading entities into the warehouse
pub struct PullEngine {
    transport: Arc<dyn BatchTransport>,
    sink: Arc<dyn Sink>,
    context: EntityContext,
    config: PullConfig,
}

impl PullEngine {
    /// Create a new pull engine
    pub fn new(transport: Arc<dyn BatchTransport>, sink: Arc<dyn Sink>) -> Self {
        Self {
            transport,
            sink,
            context: EntityContext::default(),
            config: PullConfig::default(),
        }
    }

    /// Set pull configuration
    #[must_use]
    pub fn with_config(mut self, config: PullConfig) -> Self {
        self.config = config;
        self
    }

    /// Set entity context
    #[must_use]
    pub fn with_context(mut self, context: EntityContext) -> Self {
        self.context = context;
        self
    }

    /// Get the entity context
    pub fn context(&self) -> &EntityContext {
        &self.context
    }

    /// Get mutable entity context
    pub fn context_mut(&mut self) -> &mut EntityContext {
        &mut self.context
    }

    /// Get the pull configuration
    pub fn config(&self) -> &PullConfig {
        &self.config
    }

    /// Get the warehouse sink
    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Pull every partition of `plan` into the entity's table
    pub async fn pull(
        &self,
        kind: EntityKind,
        plan: &PartitionPlan,
        mode: WriteMode,
    ) -> Result<PullStats> {
        let start = Instant::now();
        let descriptor = kind.descriptor();
        plan.validate(descriptor)?;

        let table = self.config.table_name(kind);
        if mode.drops_table() {
            self.sink.drop_table(&table)?;
        }

        let dump = self.config.dump_path(kind);
        if let Some(path) = &dump {
            remove_dump(path)?;
        }

        let runner = BatchRunner::new(
            self.transport.as_ref(),
            self.config.retry_policy(),
            self.config.cooldown,
        );
        let batch_size = self.config.batch_size(kind);

        info!("{kind}: Generating requests...");
        let mut state = PullState::new(descriptor);
        state.seed(plan);

        while !state.is_drained() {
            info!("{kind}: {} requests remaining.", state.pending());

            let items = state.next_batch(batch_size);
            let requests = self.build_requests(kind, &items)?;
            let responses = runner.submit(kind.name(), requests).await?;

            for response in responses {
                let item = RequestId::from(response.id).decode()?;
                state.handle(item, response.result)?;
            }

            let buffered = state.take_buffer();
            if !buffered.is_empty() {
                if let Some(path) = &dump {
                    append_dump(path, &buffered)?;
                }
                let frame = normalize(descriptor, buffered, &self.context)?;
                debug!("{kind}: inserting {} records into {table}", frame.len());
                let written = self
                    .sink
                    .insert_append_typed(&table, &frame, descriptor.date_columns)?;
                state.add_rows_written(written);
            }

            if state.take_quota_flag() {
                runner.cool_down(kind.name()).await;
            }
        }

        let mut stats = state.into_stats();
        stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            "{kind}: pulled {} records into {table} in {} ms ({} batches, {} requeued, {} dropped)",
            stats.rows_written, stats.duration_ms, stats.batches, stats.requeued, stats.dropped
        );
        Ok(stats)
    }

    fn build_requests(
        &self,
        kind: EntityKind,
        items: &[WorkItem],
    ) -> Result<Vec<(String, ApiRequest)>> {
        items
            .iter()
            .map(|item| {
                let request = entity::list_request(
                    kind,
                    item.partition.course_id.as_deref(),
                    item.partition.date.as_deref(),
                    item.page_token.as_deref(),
                    &self.context,
                )?;
                Ok((item.request_id().into(), request))
            })
            .collect()
    }
}

fn remove_dump(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Append one buffered batch as a JSON line
fn append_dump(path: &Path, records: &[Value]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, records)?;
    file.write_all(b"\n")?;
    Ok(())
}
