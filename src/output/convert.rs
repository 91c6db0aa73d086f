//! Frame to Arrow conversion
//!
//! Column types are inferred from the cells a column holds. Integers and
//! floats widen to Float64; any other mix falls back to text.

use crate::error::{Error, Result};
use crate::frame::{Cell, Frame};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Arrow type of a timestamp column
const TIMESTAMP_TYPE: DataType = DataType::Timestamp(TimeUnit::Microsecond, None);

/// Infer the Arrow schema of a frame. Every field is nullable.
pub fn frame_schema(frame: &Frame) -> Schema {
    let fields: Vec<Field> = frame
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| Field::new(name, column_type(frame, idx), true))
        .collect();
    Schema::new(fields)
}

/// Convert a frame into a single record batch
pub fn frame_to_arrow(frame: &Frame) -> Result<RecordBatch> {
    let schema = Arc::new(frame_schema(frame));

    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| build_array(frame, idx, field.data_type()))
        .collect();

    RecordBatch::try_new(schema, columns)
        .map_err(|e| Error::output(format!("Failed to create RecordBatch: {e}")))
}

fn column_type(frame: &Frame, idx: usize) -> DataType {
    let mut inferred: Option<DataType> = None;
    for row in frame.rows() {
        let cell_type = match &row[idx] {
            Cell::Null => continue,
            Cell::Bool(_) => DataType::Boolean,
            Cell::Int(_) => DataType::Int64,
            Cell::Float(_) => DataType::Float64,
            Cell::Text(_) => DataType::Utf8,
            Cell::Timestamp(_) => TIMESTAMP_TYPE,
        };
        inferred = Some(match inferred {
            None => cell_type,
            Some(current) => merge_types(current, cell_type),
        });
    }
    inferred.unwrap_or(DataType::Utf8)
}

fn merge_types(a: DataType, b: DataType) -> DataType {
    match (a, b) {
        (a, b) if a == b => a,
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }
        _ => DataType::Utf8,
    }
}

fn build_array(frame: &Frame, idx: usize, data_type: &DataType) -> ArrayRef {
    let cells = frame.rows().iter().map(|row| &row[idx]);
    match data_type {
        DataType::Boolean => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        DataType::Int64 => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Int(i) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        DataType::Float64 => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Int(i) => Some(*i as f64),
                    Cell::Float(f) => Some(*f),
                    _ => None,
                })
                .collect::<Float64Array>(),
        ),
        DataType::Timestamp(TimeUnit::Microsecond, None) => Arc::new(
            cells
                .map(|c| c.as_timestamp().map(|ts| ts.and_utc().timestamp_micros()))
                .collect::<TimestampMicrosecondArray>(),
        ),
        _ => Arc::new(cells.map(Cell::to_text).collect::<StringArray>()),
    }
}
