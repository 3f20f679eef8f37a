//! Calamine cell value helpers.

use calamine::Data;
use chrono::{NaiveDateTime, NaiveTime};

/// Converts a cell value to its text rendering.
///
/// Returns an empty string for empty cells, formats numbers without
/// unnecessary trailing zeros and renders date cells as ISO 8601.
pub fn cell_text(value: &Data) -> String {
    match value {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(v) => v.to_string(),
        Data::Float(v) => format_numeric(*v),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => match cell_datetime(value) {
            Some(value) if value.time() == NaiveTime::MIN => {
                value.date().format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
            None => format_numeric(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

/// True for empty cells and strings that are empty after trimming.
pub fn is_blank(value: &Data) -> bool {
    match value {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Formats a floating-point number as a string without trailing zeros after decimal.
///
/// Integer-valued floats like 40.0 are formatted as "40", not "4".
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() || trimmed == "-" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        s
    }
}

/// Date-time of an Excel date cell, honouring the workbook's 1900 or 1904
/// date system.
pub fn cell_datetime(value: &Data) -> Option<NaiveDateTime> {
    match value {
        Data::DateTime(dt) => dt.as_datetime(),
        _ => None,
    }
}
