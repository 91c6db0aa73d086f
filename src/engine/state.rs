//! Response classification and the mutable pull state

use super::codec::WorkItem;
use super::types::PullStats;
use crate::api::ApiError;
use crate::entity::EntityDescriptor;
use crate::error::{Error, Result};
use crate::partition::PartitionPlan;
use serde_json::Value;
use tracing::{debug, warn};

const PARTIAL_DATA: &str = "PARTIAL_DATA_AVAILABLE";

/// What one response means for the pull
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// Records, possibly none, and an optional continuation token
    Records {
        records: Vec<Value>,
        next_page_token: Option<String>,
    },
    /// The report is incomplete for this partition; records are discarded
    PartialData { next_page_token: Option<String> },
    /// The request failed
    Failed { status: u16, message: String },
}

impl ResponseOutcome {
    /// Classify a response to `item`.
    ///
    /// A successful body that is not an object, or whose record key does not
    /// hold a list, is a malformed response and an error.
    pub fn classify(
        descriptor: &EntityDescriptor,
        item: &WorkItem,
        result: std::result::Result<Value, ApiError>,
    ) -> Result<Self> {
        let body = match result {
            Ok(body) => body,
            Err(e) => {
                return Ok(Self::Failed {
                    status: e.status,
                    message: e.message,
                })
            }
        };

        let Value::Object(mut body) = body else {
            return Err(Error::malformed(
                descriptor.name,
                format!("response body is not an object: {body}"),
            ));
        };

        let next_page_token = body
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(String::from);

        if body.get("warnings").is_some_and(has_partial_data_warning) {
            return Ok(Self::PartialData { next_page_token });
        }

        let mut records = match body.remove(descriptor.request_key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(records)) => records,
            Some(other) => {
                return Err(Error::malformed(
                    descriptor.name,
                    format!("'{}' is not a list: {other}", descriptor.request_key),
                ))
            }
        };

        if descriptor.inject_course_id {
            if let Some(course_id) = &item.partition.course_id {
                for record in &mut records {
                    if let Some(obj) = record.as_object_mut() {
                        obj.insert("courseId".into(), Value::String(course_id.clone()));
                    }
                }
            }
        }

        Ok(Self::Records {
            records,
            next_page_token,
        })
    }
}

fn has_partial_data_warning(warnings: &Value) -> bool {
    let Some(warnings) = warnings.as_array() else {
        return false;
    };
    for warning in warnings {
        if let (Some(code), Some(message)) = (
            warning.get("code").and_then(Value::as_str),
            warning.get("message").and_then(Value::as_str),
        ) {
            debug!("{code}: {message}");
        }
    }
    warnings.iter().any(|warning| {
        warning.get("code").and_then(Value::as_str) == Some(PARTIAL_DATA)
            && warning
                .get("data")
                .and_then(Value::as_array)
                .is_some_and(|data| {
                    data.iter().any(|entry| {
                        entry.get("key").and_then(Value::as_str) == Some("application")
                            && entry.get("value").and_then(Value::as_str) == Some("classroom")
                    })
                })
    })
}

/// Mutable state of one pull.
///
/// Pending work is a stack: seeding pushes the partition cross product in
/// reverse so the first partition is issued first, and continuations and
/// quota retries are pushed on top.
#[derive(Debug)]
pub struct PullState {
    descriptor: &'static EntityDescriptor,
    pending: Vec<WorkItem>,
    buffer: Vec<Value>,
    quota_exceeded: bool,
    stats: PullStats,
}

impl PullState {
    /// Create an empty state
    pub fn new(descriptor: &'static EntityDescriptor) -> Self {
        Self {
            descriptor,
            pending: Vec::new(),
            buffer: Vec::new(),
            quota_exceeded: false,
            stats: PullStats::new(),
        }
    }

    /// Push the first page of every partition of the plan
    pub fn seed(&mut self, plan: &PartitionPlan) {
        let mut keys = plan.keys();
        keys.reverse();
        self.pending.extend(keys.into_iter().map(WorkItem::first_page));
    }

    /// Number of pending work items
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Pending items, bottom of the stack first
    pub fn pending_items(&self) -> &[WorkItem] {
        &self.pending
    }

    /// Whether no work is left
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pop up to `size` items for the next batch
    pub fn next_batch(&mut self, size: usize) -> Vec<WorkItem> {
        let mut batch = Vec::with_capacity(size.min(self.pending.len()));
        while batch.len() < size {
            match self.pending.pop() {
                Some(item) => batch.push(item),
                None => break,
            }
        }
        self.stats.batches += 1;
        self.stats.requests += batch.len();
        batch
    }

    /// Apply one response
    pub fn handle(
        &mut self,
        item: WorkItem,
        result: std::result::Result<Value, ApiError>,
    ) -> Result<()> {
        let name = self.descriptor.name;
        match ResponseOutcome::classify(self.descriptor, &item, result)? {
            ResponseOutcome::Failed { status: 429, .. } => {
                debug!("{name}: quota exceeded for {}, requeueing", item.partition);
                self.pending.push(item);
                self.quota_exceeded = true;
                self.stats.requeued += 1;
            }
            ResponseOutcome::Failed { status, message } => {
                warn!(
                    "{name}: dropping request for {} page {}: HTTP {status}: {message}",
                    item.partition,
                    item.page
                );
                self.stats.dropped += 1;
            }
            ResponseOutcome::PartialData { next_page_token } => {
                debug!("{name}: ignoring partial data for {}", item.partition);
                self.stats.partial += 1;
                if let Some(token) = next_page_token {
                    self.pending.push(item.next_page(token));
                }
            }
            ResponseOutcome::Records {
                records,
                next_page_token,
            } => {
                if let Some(token) = next_page_token {
                    debug!("{name}: queueing next page for {}", item.partition);
                    self.pending.push(item.next_page(token));
                }
                debug!(
                    "{name}: received {} records for {}, page {}",
                    records.len(),
                    item.partition,
                    item.page
                );
                self.stats.records += records.len();
                self.buffer.extend(records);
            }
        }
        Ok(())
    }

    /// Read and clear the quota flag
    pub fn take_quota_flag(&mut self) -> bool {
        std::mem::take(&mut self.quota_exceeded)
    }

    /// Drain the records buffered since the last flush
    pub fn take_buffer(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.buffer)
    }

    /// Current statistics
    pub fn stats(&self) -> &PullStats {
        &self.stats
    }

    /// Record rows written by a flush
    pub fn add_rows_written(&mut self, rows: usize) {
        self.stats.rows_written += rows;
    }

    /// Consume into statistics
    pub fn into_stats(self) -> PullStats {
        self.stats
    }
}
