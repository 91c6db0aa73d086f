//! classroom-sync CLI
//!
//! Pulls Classroom data into DuckDB and syncs rosters back

use clap::Parser;
use classroom_sync::cli::{Cli, Runner};
use tracing::Level;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let debug = cli.debug || std::env::var("DEBUG").is_ok_and(|v| v == "YES");
    let level = if debug { Level::DEBUG } else { Level::INFO };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        tracing::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
