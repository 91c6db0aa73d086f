//! Partition routing module
//!
//! Supports: parent tables, daily date ranges
//!
//! # Overview
//!
//! Partitions split an entity pull into independent request chains:
//! - course-scoped entities need one chain per course id, usually read
//!   back from the Courses table
//! - daily usage reports need one chain per day
//!
//! A `PartitionPlan` combines the dimensions; its keys are the cross
//! product the pull engine seeds its work stack with.

mod routers;
mod types;

pub use routers::{DatetimeRouter, ParentRouter, DATE_FORMAT};
pub use types::{PartitionKey, PartitionPlan, PartitionRouter};
