//! CLI module
//!
//! Command-line interface for pulls, syncs and exports.
//!
//! # Commands
//!
//! - `run` - Run everything enabled in the configuration
//! - `pull` - Pull entities into the warehouse
//! - `sync` - Push roster CSV files to Classroom
//! - `export` - Write a warehouse table to Parquet
//! - `tables` - List warehouse tables

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, PullArgs, SyncArgs};
pub use runner::{summary_message, Runner};

#[cfg(test)]
mod tests;
