//! Best-effort per-column coercion.
//!
//! Coercion never drops rows or columns: a cell that cannot be converted becomes
//! `Cell::Missing`. Coercing a column that is absent is a no-op. Both coercions are
//! idempotent, so callers may apply them lazily right before a metric needs a column.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::table::{format_number, Cell, Table};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Numeric view of a cell. Booleans count as 1/0; datetimes and unparsable text have none.
pub fn numeric_value(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Datetime view of a cell. Text is tried against ISO forms first, then day-first
/// forms (`31/12/2024`); date-only text lands at midnight.
pub fn datetime_value(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Text(s) => parse_datetime(s.trim()),
        _ => None,
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() { return None; }
    // keep the wall-clock time of offset timestamps
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) { return Some(dt.naive_local()); }
    for f in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, f) { return Some(dt); }
    }
    for f in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, f) { return d.and_hms_opt(0, 0, 0); }
    }
    None
}

/// Canonical join/lookup key. Numbers and numeric text share one spelling
/// (`3`, `3.0` and `" 3 "` all give `"3"`); other text is trimmed. Missing, blank,
/// boolean and datetime cells have no key and never match anything.
pub fn key_value(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(format_number(*n)),
        Cell::Text(s) => {
            let t = s.trim();
            if t.is_empty() { return None; }
            match t.parse::<f64>() {
                Ok(v) if v.is_finite() => Some(format_number(v)),
                _ => Some(t.to_string()),
            }
        }
        _ => None,
    }
}

/// Coerce `column` in place to numbers; returns how many non-missing cells became missing.
pub fn coerce_numeric_in_place(table: &mut Table, column: &str) -> usize {
    let mut skipped = 0usize;
    let present = table.map_column(column, |c| match numeric_value(c) {
        Some(v) => Cell::Number(v),
        None => {
            if !c.is_missing() { skipped += 1; }
            Cell::Missing
        }
    });
    if present && skipped > 0 {
        debug!(target: "canopy::normalize", "coerce_numeric: column='{}' skipped={} cells", column, skipped);
    }
    skipped
}

/// Coerce `column` in place to datetimes; returns how many non-missing cells became missing.
pub fn coerce_datetime_in_place(table: &mut Table, column: &str) -> usize {
    let mut skipped = 0usize;
    let present = table.map_column(column, |c| match datetime_value(c) {
        Some(dt) => Cell::DateTime(dt),
        None => {
            if !c.is_missing() { skipped += 1; }
            Cell::Missing
        }
    });
    if present && skipped > 0 {
        debug!(target: "canopy::normalize", "coerce_datetime: column='{}' skipped={} cells", column, skipped);
    }
    skipped
}

pub fn coerce_numeric(mut table: Table, column: &str) -> Table {
    coerce_numeric_in_place(&mut table, column);
    table
}

pub fn coerce_datetime(mut table: Table, column: &str) -> Table {
    coerce_datetime_in_place(&mut table, column);
    table
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod normalize_tests;
