use crate::stations::error::RecordError;
use serde::Serialize;
use std::ops::Range;

/// Outcome counts of a load. Rejected records failed validation; skipped ones were
/// valid but not wanted (filtered class, station outside the catalog).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub skipped: usize,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.accepted + self.rejected + self.skipped
    }
}

/// Slices a fixed-width column out of `line`.
pub(crate) fn column(line: &str, range: Range<usize>) -> Result<&str, RecordError> {
    let end = range.end;
    line.get(range).ok_or(RecordError::LineTooShort {
        expected: end,
        found: line.len(),
    })
}

pub(crate) fn parse_f64(field: &'static str, value: &str) -> Result<f64, RecordError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RecordError::NotNumeric {
            field,
            value: value.trim().to_string(),
        })
}

pub(crate) fn parse_i32(field: &'static str, value: &str) -> Result<i32, RecordError> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| RecordError::NotNumeric {
            field,
            value: value.trim().to_string(),
        })
}
