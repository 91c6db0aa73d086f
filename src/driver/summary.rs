//! Run summary and notification

use crate::engine::PullStats;
use crate::entity::EntityKind;
use crate::error::Result;
use crate::sync::SyncStats;
use std::fmt;
use tracing::{error, info};

/// One unit of work in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Pull(EntityKind),
    Sync(EntityKind),
}

impl Step {
    /// Entity the step works on
    pub fn entity(self) -> EntityKind {
        match self {
            Step::Pull(kind) | Step::Sync(kind) => kind,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Pull(kind) => write!(f, "pull {kind}"),
            Step::Sync(kind) => write!(f, "sync {kind}"),
        }
    }
}

/// How a step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Pulled(PullStats),
    Synced(SyncStats),
    /// Nothing to do
    Skipped(String),
    /// The step's error, rendered
    Failed(String),
}

impl StepResult {
    /// Whether the step failed
    pub fn is_failure(&self) -> bool {
        matches!(self, StepResult::Failed(_))
    }
}

/// Everything a run did, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: Vec<(Step, StepResult)>,
    pub duration_ms: u64,
}

impl RunSummary {
    /// Record a finished step
    pub fn record(&mut self, step: Step, result: StepResult) {
        self.steps.push((step, result));
    }

    /// Result of a step, if it ran
    pub fn result(&self, step: Step) -> Option<&StepResult> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, result)| result)
    }

    /// Steps that failed
    pub fn failures(&self) -> impl Iterator<Item = &(Step, StepResult)> {
        self.steps.iter().filter(|(_, result)| result.is_failure())
    }

    /// Whether every step succeeded or was skipped
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Receives the summary when a run ends
pub trait Notifier: Send + Sync {
    fn notify(&self, summary: &RunSummary) -> Result<()>;
}

/// Notifier that writes the summary to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, summary: &RunSummary) -> Result<()> {
        for (step, result) in &summary.steps {
            match result {
                StepResult::Pulled(stats) => info!(
                    "{step}: {} rows in {} ms ({} dropped)",
                    stats.rows_written, stats.duration_ms, stats.dropped
                ),
                StepResult::Synced(stats) => info!(
                    "{step}: {} created, {} deleted, {} failed",
                    stats.created, stats.deleted, stats.failed
                ),
                StepResult::Skipped(reason) => info!("{step}: skipped ({reason})"),
                StepResult::Failed(message) => error!("{step}: failed: {message}"),
            }
        }
        if summary.is_success() {
            info!("Run completed successfully in {} ms.", summary.duration_ms);
        } else {
            error!(
                "Run finished with {} failed step(s) in {} ms.",
                summary.failures().count(),
                summary.duration_ms
            );
        }
        Ok(())
    }
}
