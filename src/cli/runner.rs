//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::AppConfig;
use crate::driver::{Driver, RunSummary, StepResult};
use crate::error::{Error, Result, ResultExt};
use crate::output::export_table;
use crate::sink::DuckDbSink;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        match &self.cli.command {
            Commands::Run | Commands::Pull(_) | Commands::Sync(_) => self.drive(&config).await,
            Commands::Export { table, output } => self.export(&config, table, output),
            Commands::Tables => self.tables(&config),
        }
    }

    /// Config file, then environment, then command line
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.cli.config.as_deref())?;
        self.cli.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Run pulls and syncs, failing when any step failed
    async fn drive(&self, config: &AppConfig) -> Result<()> {
        if !config.pull.any() && config.sync.entities().is_empty() {
            warn!("Nothing to do: no pull or sync entity is enabled");
            return Ok(());
        }

        let sink = Arc::new(open_sink(config)?);
        let transport = Arc::new(config.transport()?);
        let mut driver = Driver::new(transport, sink, config)?;

        let summary = driver.run().await;
        self.output_message(&summary_message(&summary));

        let failed: Vec<String> = summary
            .failures()
            .map(|(step, _)| step.to_string())
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Other(format!("Failed steps: {}", failed.join(", "))))
        }
    }

    /// Write one table to a Parquet file
    fn export(&self, config: &AppConfig, table: &str, output: &Path) -> Result<()> {
        let sink = open_sink(config)?;
        let rows = export_table(&sink, table, output, None)?;
        self.output_message(&json!({
            "type": "EXPORT",
            "table": table,
            "path": output.display().to_string(),
            "rows": rows,
        }));
        Ok(())
    }

    /// List tables in the warehouse
    fn tables(&self, config: &AppConfig) -> Result<()> {
        let sink = open_sink(config)?;
        let tables = sink.list_tables()?;
        info!("{} tables in {}", tables.len(), sink.location());
        self.output_message(&json!({
            "type": "TABLES",
            "tables": tables,
        }));
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn open_sink(config: &AppConfig) -> Result<DuckDbSink> {
    DuckDbSink::open(&config.db)
        .with_context(|| format!("Failed to open warehouse {}", config.db.display()))
}

/// Render a run summary as a single message
pub fn summary_message(summary: &RunSummary) -> Value {
    let steps: Vec<Value> = summary
        .steps
        .iter()
        .map(|(step, result)| {
            let (status, detail) = match result {
                StepResult::Pulled(stats) => ("PULLED", json!(stats)),
                StepResult::Synced(stats) => ("SYNCED", json!(stats)),
                StepResult::Skipped(reason) => ("SKIPPED", json!(reason)),
                StepResult::Failed(message) => ("FAILED", json!(message)),
            };
            json!({
                "step": step.to_string(),
                "status": status,
                "detail": detail,
            })
        })
        .collect();

    json!({
        "type": "SUMMARY",
        "success": summary.is_success(),
        "duration_ms": summary.duration_ms,
        "steps": steps,
    })
}
