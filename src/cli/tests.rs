//! Tests for argument parsing and config layering

use super::*;
use crate::config::AppConfig;
use crate::driver::{RunSummary, Step, StepResult};
use crate::engine::PullStats;
use crate::entity::EntityKind;
use clap::Parser;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("classroom-sync").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_pull_flags_replace_configured_pulls() {
    let cli = parse(&["pull", "--courses", "--meet", "--db", "x.duckdb"]);
    let mut config = AppConfig::default();
    config.pull.students = true;
    config.sync.courses = true;

    cli.apply(&mut config);

    assert_eq!(config.db, PathBuf::from("x.duckdb"));
    assert!(config.pull.enabled(EntityKind::Courses));
    assert!(config.pull.enabled(EntityKind::Meet));
    assert!(!config.pull.enabled(EntityKind::Students));
    assert!(config.sync.entities().is_empty());
}

#[test]
fn test_pull_without_flags_keeps_config() {
    let cli = parse(&["pull", "--debug-file"]);
    let mut config = AppConfig::default();
    config.pull.guardians = true;

    cli.apply(&mut config);

    assert!(config.pull.enabled(EntityKind::Guardians));
    assert!(config.debug_file);
}

#[test]
fn test_sync_flags() {
    let cli = parse(&["sync", "--students", "--sync-dir", "rosters", "--debug"]);
    let mut config = AppConfig::default();
    config.pull.all = true;

    cli.apply(&mut config);

    assert_eq!(config.sync.entities(), vec![EntityKind::Students]);
    assert_eq!(config.sync_dir, PathBuf::from("rosters"));
    assert!(config.debug);
    assert!(!config.pull.any());
}

#[test]
fn test_run_keeps_both() {
    let cli = parse(&["run"]);
    let mut config = AppConfig::default();
    config.pull.courses = true;
    config.sync.teachers = true;
    let expected = config.clone();

    cli.apply(&mut config);
    assert_eq!(config, expected);
}

#[test]
fn test_export_args() {
    let cli = parse(&[
        "export",
        "--table",
        "GoogleClassroom_Courses",
        "--output",
        "courses.parquet",
    ]);
    match cli.command {
        Commands::Export { table, output } => {
            assert_eq!(table, "GoogleClassroom_Courses");
            assert_eq!(output, PathBuf::from("courses.parquet"));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_export_requires_table() {
    let result = Cli::try_parse_from(["classroom-sync", "export", "--output", "x.parquet"]);
    assert!(result.is_err());
}

#[test]
fn test_summary_message() {
    let mut summary = RunSummary::default();
    summary.record(
        Step::Pull(EntityKind::Courses),
        StepResult::Pulled(PullStats {
            rows_written: 4,
            ..PullStats::default()
        }),
    );
    summary.record(
        Step::Sync(EntityKind::Students),
        StepResult::Failed("boom".into()),
    );

    let msg = summary_message(&summary);
    assert_eq!(msg["type"], "SUMMARY");
    assert_eq!(msg["success"], false);
    assert_eq!(msg["steps"][0]["step"], "pull Courses");
    assert_eq!(msg["steps"][0]["detail"]["rows_written"], 4);
    assert_eq!(msg["steps"][1]["status"], "FAILED");
    assert_eq!(msg["steps"][1]["detail"], "boom");
}
