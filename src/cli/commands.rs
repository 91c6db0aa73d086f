//! CLI commands and argument parsing

use crate::config::{AppConfig, PullFlags, SyncFlags};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Google Classroom extraction and roster sync
#[derive(Parser, Debug)]
#[command(name = "classroom-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// DuckDB database file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Debug logging, no whole-batch retries
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every pull and sync enabled in the configuration
    Run,

    /// Pull entities into the warehouse
    Pull(PullArgs),

    /// Push desired roster state from CSV files
    Sync(SyncArgs),

    /// Export a warehouse table to Parquet
    Export {
        /// Table to export
        #[arg(short, long)]
        table: String,

        /// Parquet file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List warehouse tables
    Tables,
}

/// Entities to pull. With no flags, the configured entities are pulled.
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct PullArgs {
    /// Every entity
    #[arg(long)]
    pub all: bool,
    /// Student usage reports (pulls org units first)
    #[arg(long)]
    pub usage: bool,
    #[arg(long)]
    pub courses: bool,
    #[arg(long)]
    pub topics: bool,
    #[arg(long)]
    pub coursework: bool,
    #[arg(long)]
    pub aliases: bool,
    #[arg(long)]
    pub students: bool,
    #[arg(long)]
    pub teachers: bool,
    #[arg(long)]
    pub guardians: bool,
    #[arg(long)]
    pub submissions: bool,
    #[arg(long)]
    pub invitations: bool,
    #[arg(long)]
    pub guardian_invites: bool,
    #[arg(long)]
    pub announcements: bool,
    /// Meet audit events
    #[arg(long)]
    pub meet: bool,

    /// Dump raw response batches as JSONL
    #[arg(long)]
    pub debug_file: bool,
}

impl PullArgs {
    /// Flags requested on the command line, if any
    pub fn flags(&self) -> Option<PullFlags> {
        let flags = PullFlags {
            all: self.all,
            usage: self.usage,
            courses: self.courses,
            topics: self.topics,
            coursework: self.coursework,
            aliases: self.aliases,
            students: self.students,
            teachers: self.teachers,
            guardians: self.guardians,
            submissions: self.submissions,
            invitations: self.invitations,
            guardian_invites: self.guardian_invites,
            announcements: self.announcements,
            meet: self.meet,
        };
        flags.any().then_some(flags)
    }
}

/// Entities to sync. With no flags, the configured entities are synced.
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncArgs {
    #[arg(long)]
    pub courses: bool,
    #[arg(long)]
    pub students: bool,
    #[arg(long)]
    pub teachers: bool,

    /// Directory holding courses.csv, students.csv and teachers.csv
    #[arg(long)]
    pub sync_dir: Option<PathBuf>,
}

impl SyncArgs {
    /// Flags requested on the command line, if any
    pub fn flags(&self) -> Option<SyncFlags> {
        let flags = SyncFlags {
            courses: self.courses,
            students: self.students,
            teachers: self.teachers,
        };
        (!flags.entities().is_empty()).then_some(flags)
    }
}

impl Cli {
    /// Layer command-line settings over a loaded configuration.
    ///
    /// `pull` runs no syncs and `sync` runs no pulls.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(db) = &self.db {
            config.db = db.clone();
        }
        if self.debug {
            config.debug = true;
        }

        match &self.command {
            Commands::Pull(args) => {
                if let Some(flags) = args.flags() {
                    config.pull = flags;
                }
                if args.debug_file {
                    config.debug_file = true;
                }
                config.sync = SyncFlags::default();
            }
            Commands::Sync(args) => {
                if let Some(flags) = args.flags() {
                    config.sync = flags;
                }
                if let Some(dir) = &args.sync_dir {
                    config.sync_dir = dir.clone();
                }
                config.pull = PullFlags::default();
            }
            Commands::Run | Commands::Export { .. } | Commands::Tables => {}
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
