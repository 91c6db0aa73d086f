//! Output module
//!
//! Exports warehouse tables as Parquet files.
//!
//! # Overview
//!
//! This module provides:
//! - `frame_schema` / `frame_to_arrow` - Frame to Arrow conversion
//! - `ParquetWriter` - streaming Parquet file writer
//! - `write_frame` / `export_table` - one-shot exports

mod convert;
mod writer;

pub use convert::{frame_schema, frame_to_arrow};
pub use writer::{export_table, write_frame, ParquetWriter, ParquetWriterConfig};
