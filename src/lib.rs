// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # classroom-sync
//!
//! Batched extraction of Google Classroom, Admin Reports and Directory data
//! into a DuckDB warehouse, plus CSV-driven roster sync back to Classroom.
//!
//! ## Features
//!
//! - **Batched Pulls**: Bounded request batches with page-token chaining
//! - **Quota Handling**: 429 responses are requeued after a cooldown
//! - **Incremental Windows**: Usage reports and Meet events resume from the warehouse
//! - **Roster Sync**: Diff desired CSV state against the last pull and mutate
//! - **Parquet Export**: Any warehouse table as an Arrow-backed Parquet file
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use classroom_sync::{AppConfig, DuckDbSink, Driver, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None)?;
//!     let sink = Arc::new(DuckDbSink::open(&config.db)?);
//!     let transport = Arc::new(config.transport()?);
//!
//!     let summary = Driver::new(transport, sink, &config)?.run().await;
//!     println!("{} steps", summary.steps.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Driver                               │
//! │   pulls in dependency order → syncs → RunSummary → Notifier     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Entity  │  Engine   │   Normalize   │   Sink    │    Sync     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Requests │ Work stack│ Flatten       │ DuckDB    │ CSV input   │
//! │ Preproc  │ Codec     │ Reindex       │ Widening  │ Outer diff  │
//! │ Filters  │ Requeue   │ Coerce dates  │ Deletes   │ Mutations   │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┐
//! │   Auth   │   HTTP    │   Partition   │
//! ├──────────┼───────────┼───────────────┤
//! │ Bearer   │ Transport │ Course        │
//! │ OAuth2   │ Rate Limit│ Daily         │
//! │ JWT      │ Retry     │ Cross product │
//! └──────────┴───────────┴───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication implementations
pub mod auth;

/// HTTP client, rate limiting and batch retry
pub mod http;

/// Request envelopes and batch transports
pub mod api;

/// In-memory tables
pub mod frame;

/// Entity catalog
pub mod entity;

/// Raw record normalization
pub mod normalize;

/// Partition routing
pub mod partition;

/// Warehouse sink
pub mod sink;

/// Pull engine
pub mod engine;

/// Roster sync
pub mod sync;

/// Run driver and summaries
pub mod driver;

/// Arrow/Parquet output
pub mod output;

/// Application configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use api::{ApiRequest, BatchTransport, HttpTransport};
pub use config::AppConfig;
pub use driver::{Driver, RunSummary};
pub use engine::{PullEngine, PullStats};
pub use entity::EntityKind;
pub use frame::{Cell, Frame};
pub use sink::{DuckDbSink, Sink};
pub use sync::{SyncEngine, SyncStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
