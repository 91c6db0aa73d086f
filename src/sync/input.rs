//! Desired-state CSV input

use crate::error::{Error, Result};
use crate::frame::{Cell, Frame};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read a CSV file with a header row. Every value is text; empty fields
/// are null.
pub fn read_csv(path: &Path) -> Result<Frame> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: path.display().to_string(),
        },
        _ => Error::Io(e),
    })?;
    parse_csv(file)
}

/// Parse CSV text from any reader
pub fn parse_csv<R: Read>(reader: R) -> Result<Frame> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
    let mut frame = Frame::new(headers);

    for record in rdr.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Null
                } else {
                    Cell::text(field)
                }
            })
            .collect();
        frame.push_row(row)?;
    }

    Ok(frame)
}
