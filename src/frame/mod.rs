//! Tabular frame module
//!
//! In-memory column-ordered tables shared by the normalizer, the warehouse
//! sink and the sync engine.
//!
//! # Overview
//!
//! The frame module provides:
//! - `Cell` - a single typed value (null, bool, int, float, text, timestamp)
//! - `Frame` - ordered column names plus rows of cells
//! - `FrameDiff` - the three-way split produced by an outer join on key columns

mod cell;
mod join;
mod table;

pub use cell::{compare_cells, Cell, TIMESTAMP_FORMAT};
pub use join::FrameDiff;
pub use table::{Frame, Row};
