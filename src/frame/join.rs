//! Frame joins
//!
//! Inner join on a single column and the indicator-style outer join used
//! to diff desired and current state.

use super::cell::Cell;
use super::table::Frame;
use crate::error::{Error, Result};

/// Result of an outer join split by row origin
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameDiff {
    /// Rows only found in the left frame
    pub left_only: Frame,
    /// Rows only found in the right frame
    pub right_only: Frame,
    /// Rows found in both frames
    pub both: Frame,
}

impl Frame {
    /// Inner join with `other` on one shared column.
    ///
    /// Output columns are this frame's columns followed by the other
    /// frame's columns except the join column.
    pub fn inner_join(&self, other: &Frame, on: &str) -> Result<Frame> {
        let left_idx = self
            .column_index(on)
            .ok_or_else(|| Error::Other(format!("Join column '{on}' missing on left side")))?;
        let right_idx = other
            .column_index(on)
            .ok_or_else(|| Error::Other(format!("Join column '{on}' missing on right side")))?;

        let right_extra: Vec<usize> = (0..other.columns().len())
            .filter(|&i| i != right_idx)
            .collect();
        let columns = joined_columns(
            self.columns(),
            &[],
            &right_extra
                .iter()
                .map(|&i| other.columns()[i].clone())
                .collect::<Vec<_>>(),
        );

        let mut out = Frame::new(columns);
        for left in self.rows() {
            for right in other.rows() {
                if left[left_idx] == right[right_idx] {
                    let mut row = left.clone();
                    row.extend(right_extra.iter().map(|&i| right[i].clone()));
                    out.push_row(row)?;
                }
            }
        }
        Ok(out)
    }

    /// Outer join with `other` on the key columns, split by origin.
    ///
    /// Every output frame has the same columns: this frame's columns, then
    /// the other frame's non-key columns. Clashing non-key names get `_x`
    /// and `_y` suffixes. Rows are sorted by the key columns.
    pub fn outer_diff<S: AsRef<str>>(&self, other: &Frame, keys: &[S]) -> Result<FrameDiff> {
        let key_names: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
        let left_keys = key_positions(self, &key_names, "left")?;
        let right_keys = key_positions(other, &key_names, "right")?;

        let left_extra: Vec<usize> = (0..self.columns().len())
            .filter(|i| !left_keys.contains(i))
            .collect();
        let right_extra: Vec<usize> = (0..other.columns().len())
            .filter(|i| !right_keys.contains(i))
            .collect();
        let right_extra_names: Vec<String> = right_extra
            .iter()
            .map(|&i| other.columns()[i].clone())
            .collect();
        let left_extra_names: Vec<String> = left_extra
            .iter()
            .map(|&i| self.columns()[i].clone())
            .collect();
        let columns = joined_columns(self.columns(), &left_extra_names, &right_extra_names);

        let width = columns.len();
        let mut diff = FrameDiff {
            left_only: Frame::new(columns.clone()),
            right_only: Frame::new(columns.clone()),
            both: Frame::new(columns),
        };

        let key_of = |row: &[Cell], positions: &[usize]| -> Vec<Cell> {
            positions.iter().map(|&i| row[i].clone()).collect()
        };

        let mut right_matched = vec![false; other.len()];
        for left in self.rows() {
            let left_key = key_of(left, &left_keys);
            let mut matched = false;
            for (r, right) in other.rows().iter().enumerate() {
                if key_of(right, &right_keys) == left_key {
                    matched = true;
                    right_matched[r] = true;
                    let mut row = left.clone();
                    row.extend(right_extra.iter().map(|&i| right[i].clone()));
                    diff.both.push_row(row)?;
                }
            }
            if !matched {
                let mut row = left.clone();
                row.resize(width, Cell::Null);
                diff.left_only.push_row(row)?;
            }
        }

        for (r, right) in other.rows().iter().enumerate() {
            if right_matched[r] {
                continue;
            }
            let mut row = vec![Cell::Null; width];
            for (k, &left_pos) in left_keys.iter().enumerate() {
                row[left_pos] = right[right_keys[k]].clone();
            }
            for (offset, &i) in right_extra.iter().enumerate() {
                row[self.columns().len() + offset] = right[i].clone();
            }
            diff.right_only.push_row(row)?;
        }

        diff.left_only.sort_by_columns(&key_names);
        diff.right_only.sort_by_columns(&key_names);
        diff.both.sort_by_columns(&key_names);
        Ok(diff)
    }
}

fn key_positions(frame: &Frame, keys: &[&str], side: &str) -> Result<Vec<usize>> {
    keys.iter()
        .map(|k| {
            frame
                .column_index(k)
                .ok_or_else(|| Error::Other(format!("Join key '{k}' missing on {side} side")))
        })
        .collect()
}

/// Left columns followed by right extras, suffixing clashes
fn joined_columns(left: &[String], left_extra: &[String], right_extra: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = left
        .iter()
        .map(|name| {
            if left_extra.contains(name) && right_extra.contains(name) {
                format!("{name}_x")
            } else {
                name.clone()
            }
        })
        .collect();
    columns.extend(right_extra.iter().map(|name| {
        if left.contains(name) {
            format!("{name}_y")
        } else {
            name.clone()
        }
    }));
    columns
}
