//! Record normalizer
//!
//! Turns a batch of raw nested records into a frame with exactly the
//! entity's columns:
//!
//! 1. entity preprocessing
//! 2. flattening of nested objects into dotted column names
//! 3. reindexing to the descriptor's columns (missing columns are null)
//! 4. the entity row filter
//! 5. timestamp coercion of the descriptor's date columns
//!
//! Any value in a date column that cannot be read as a timestamp fails the
//! whole batch.

use crate::entity::{self, EntityContext, EntityDescriptor};
use crate::error::{Error, Result};
use crate::frame::{Cell, Frame};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Normalize one batch of raw records
pub fn normalize(
    descriptor: &EntityDescriptor,
    records: Vec<Value>,
    ctx: &EntityContext,
) -> Result<Frame> {
    debug!("{}: processing {} records", descriptor.name, records.len());

    let records = entity::preprocess(descriptor.kind, records, ctx);

    let mut frame = Frame::new(descriptor.columns.iter().copied());
    for record in &records {
        let flat = flatten(record).ok_or_else(|| {
            Error::normalize(descriptor.name, format!("record is not an object: {record}"))
        })?;
        let row = descriptor
            .columns
            .iter()
            .map(|column| flat.get(*column).map_or(Cell::Null, Cell::from_json))
            .collect();
        frame.push_row(row)?;
    }

    let mut frame = entity::filter(descriptor.kind, frame, ctx);

    for column in descriptor.date_columns {
        frame.map_column(column, |cell| coerce_timestamp(column, cell))?;
    }

    Ok(frame)
}

/// Flatten nested objects into one level with dotted keys.
///
/// Returns `None` when the record itself is not an object.
pub fn flatten(record: &Value) -> Option<Map<String, Value>> {
    let obj = record.as_object()?;
    let mut out = Map::new();
    flatten_into(&mut out, None, obj);
    Some(out)
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, obj: &Map<String, Value>) {
    for (key, value) in obj {
        let name = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&name), inner),
            other => {
                out.insert(name, other.clone());
            }
        }
    }
}

/// Coerce one cell to a timestamp; null stays null
pub fn coerce_timestamp(column: &str, cell: &Cell) -> Result<Cell> {
    match cell {
        Cell::Null | Cell::Timestamp(_) => Ok(cell.clone()),
        Cell::Text(s) => parse_timestamp(s)
            .map(Cell::Timestamp)
            .ok_or_else(|| Error::date_coercion(column, s.as_str())),
        other => Err(Error::date_coercion(column, other.to_string())),
    }
}

/// Parse RFC 3339, naive date-time or plain date text. Offsets are
/// converted to UTC.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests;
