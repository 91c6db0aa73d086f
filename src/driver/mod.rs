//! Top-level run driver
//!
//! Runs every enabled pull in dependency order, then every enabled sync.
//! A failing step is logged and recorded; later steps still run.

mod summary;

pub use summary::{LogNotifier, Notifier, RunSummary, Step, StepResult};

use crate::api::BatchTransport;
use crate::config::{AppConfig, PullFlags, SyncFlags};
use crate::engine::{PullEngine, PullStats};
use crate::entity::{EntityKind, Partitioning};
use crate::error::{Error, Result};
use crate::partition::{DatetimeRouter, ParentRouter, PartitionPlan};
use crate::sink::{Predicate, Sink};
use crate::sync::SyncEngine;
use crate::types::WriteMode;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Format of the Meet `startTime` parameter
const MEET_START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Drives a full pull and sync run
pub struct Driver {
    pull: PullEngine,
    sync: SyncEngine,
    sink: Arc<dyn Sink>,
    pull_flags: PullFlags,
    sync_flags: SyncFlags,
    school_year_start: Option<NaiveDate>,
    usage_trailing_days: i64,
    notifier: Box<dyn Notifier>,
}

impl Driver {
    /// Build a driver from application settings
    pub fn new(
        transport: Arc<dyn BatchTransport>,
        sink: Arc<dyn Sink>,
        config: &AppConfig,
    ) -> Result<Self> {
        let pull = PullEngine::new(transport.clone(), sink.clone())
            .with_config(config.pull_config()?)
            .with_context(config.entity_context());
        let sync = SyncEngine::new(transport, sink.clone()).with_config(config.sync_config());

        Ok(Self {
            pull,
            sync,
            sink,
            pull_flags: config.pull.clone(),
            sync_flags: config.sync.clone(),
            school_year_start: config.school_year_start,
            usage_trailing_days: config.usage_trailing_days,
            notifier: Box::new(LogNotifier),
        })
    }

    /// Send the run summary somewhere other than the log
    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Pin the import date (defaults to today)
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.pull.context_mut().today = today;
        self
    }

    /// Run every enabled step and notify with the summary
    pub async fn run(&mut self) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        for kind in EntityKind::ALL {
            if kind == EntityKind::OrgUnits || !self.pull_flags.enabled(kind) {
                continue;
            }
            if kind == EntityKind::StudentUsage {
                let org_units = self.pull_org_units().await;
                let failed = org_units.is_err();
                summary.record(
                    Step::Pull(EntityKind::OrgUnits),
                    pulled(EntityKind::OrgUnits, org_units),
                );
                if failed {
                    summary.record(
                        Step::Pull(kind),
                        StepResult::Failed("student org unit could not be resolved".into()),
                    );
                    continue;
                }
            }

            let result = self.pull_entity(kind).await;
            summary.record(Step::Pull(kind), result);
        }

        for kind in self.sync_flags.entities() {
            info!("{kind}: syncing");
            let result = match self.sync.run(kind, None).await {
                Ok((_, stats)) => StepResult::Synced(stats),
                Err(e) => StepResult::Failed(e.to_string()),
            };
            if let StepResult::Failed(message) = &result {
                error!("{kind}: sync failed: {message}");
            }
            summary.record(Step::Sync(kind), result);
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        if let Err(e) = self.notifier.notify(&summary) {
            error!("Failed to send run summary: {e}");
        }
        summary
    }

    /// Pull one entity with its incremental window, never failing the run
    pub async fn pull_entity(&mut self, kind: EntityKind) -> StepResult {
        info!("{kind}: pulling");
        let result = match kind {
            EntityKind::StudentUsage => self.pull_usage().await,
            EntityKind::Meet => self.pull_meet().await.map(StepResult::Pulled),
            _ => self.pull_full(kind).await.map(StepResult::Pulled),
        };
        match result {
            Ok(result) => result,
            Err(e) => {
                error!("{kind}: pull failed: {e}");
                StepResult::Failed(e.to_string())
            }
        }
    }

    /// Pull org units and resolve the student org unit id
    async fn pull_org_units(&mut self) -> Result<PullStats> {
        let stats = self
            .pull
            .pull(
                EntityKind::OrgUnits,
                &PartitionPlan::single(),
                WriteMode::Overwrite,
            )
            .await?;

        let org_unit_id = match self.pull.context().student_org_unit.clone() {
            Some(unit) => {
                let table = self.pull.config().table_name(EntityKind::OrgUnits);
                let id = self.sink.read_table(&table)?.and_then(|frame| {
                    frame
                        .iter()
                        .find(|row| row.get_str("name") == Some(unit.as_str()))
                        .and_then(|row| row.get_str("orgUnitId").map(String::from))
                });
                if id.is_none() {
                    info!("Org unit '{unit}' not found; pulling usage for every user.");
                }
                id
            }
            None => None,
        };
        debug!("Student org unit id: {org_unit_id:?}");
        self.pull.context_mut().org_unit_id = org_unit_id;
        Ok(stats)
    }

    /// Replace the whole table, fanning out over pulled courses when needed
    async fn pull_full(&self, kind: EntityKind) -> Result<PullStats> {
        let plan = match kind.descriptor().partitioning {
            Partitioning::ByCourse => self.course_plan()?,
            _ => PartitionPlan::single(),
        };
        self.pull.pull(kind, &plan, WriteMode::Overwrite).await
    }

    /// Plan over every course id in the Courses table
    fn course_plan(&self) -> Result<PartitionPlan> {
        let table = self.pull.config().table_name(EntityKind::Courses);
        let courses = self
            .sink
            .read_table(&table)?
            .ok_or_else(|| Error::sink(&table, "table does not exist; pull courses first"))?;
        PartitionPlan::single().by_course(&ParentRouter::new(courses, "id"))
    }

    /// Re-pull the trailing usage window and every day since
    async fn pull_usage(&self) -> Result<StepResult> {
        let kind = EntityKind::StudentUsage;
        let school_year_start = self
            .school_year_start
            .ok_or_else(|| Error::missing_field("school_year_start"))?;
        let table = self.pull.config().table_name(kind);
        let yesterday = self.pull.context().today - Duration::days(1);

        let start = match self.sink.max_timestamp(&table, "AsOfDate")? {
            Some(last) => {
                (last.date() - Duration::days(self.usage_trailing_days)).max(school_year_start)
            }
            None => school_year_start,
        };
        if start > yesterday {
            return Ok(StepResult::Skipped(format!("no complete days since {start}")));
        }

        let cutoff = start.and_hms_opt(0, 0, 0).unwrap_or_default();
        let deleted = self
            .sink
            .delete_where(&table, &Predicate::at_or_after("AsOfDate", cutoff))?;
        info!("{kind}: pulling {start} through {yesterday} ({deleted} rows replaced)");

        let plan = PartitionPlan::single().by_date(&DatetimeRouter::daily(start, yesterday))?;
        self.pull
            .pull(kind, &plan, WriteMode::Append)
            .await
            .map(StepResult::Pulled)
    }

    /// Drop the last day of Meet events and pull from there
    async fn pull_meet(&mut self) -> Result<PullStats> {
        let kind = EntityKind::Meet;
        let table = self.pull.config().table_name(kind);

        let start_time = match self.sink.max_timestamp(&table, "item_time")? {
            Some(last) => {
                let cutoff = last - Duration::hours(24);
                let deleted = self
                    .sink
                    .delete_where(&table, &Predicate::after("item_time", cutoff))?;
                let start = cutoff.format(MEET_START_FORMAT).to_string();
                debug!("{kind}: pulling data from {start} ({deleted} rows replaced)");
                Some(start)
            }
            None => None,
        };
        self.pull.context_mut().meet_start_time = start_time;

        self.pull
            .pull(kind, &PartitionPlan::single(), WriteMode::Append)
            .await
    }
}

fn pulled(kind: EntityKind, result: Result<PullStats>) -> StepResult {
    match result {
        Ok(stats) => StepResult::Pulled(stats),
        Err(e) => {
            error!("{kind}: pull failed: {e}");
            StepResult::Failed(e.to_string())
        }
    }
}
