use std::fmt::{Display, Formatter};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single typed cell.
///
/// `Missing` marks a value that was absent or could not be coerced; it is distinct
/// from `Number(0.0)` and from an empty `Text`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "CellRepr", into = "CellRepr")]
pub enum Cell {
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Boolean(bool),
    #[default]
    Missing,
}

// On-disk shape: null | bool | number | string | {"datetime": "..."}.
// Variant order matters for untagged deserialization.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CellRepr {
    Missing,
    Boolean(bool),
    Number(f64),
    Text(String),
    DateTime { datetime: NaiveDateTime },
}

impl From<CellRepr> for Cell {
    fn from(r: CellRepr) -> Self {
        match r {
            CellRepr::Missing => Cell::Missing,
            CellRepr::Boolean(b) => Cell::Boolean(b),
            CellRepr::Number(n) => Cell::number(n),
            CellRepr::Text(s) => Cell::Text(s),
            CellRepr::DateTime { datetime } => Cell::DateTime(datetime),
        }
    }
}

impl From<Cell> for CellRepr {
    fn from(c: Cell) -> Self {
        match c {
            Cell::Missing => CellRepr::Missing,
            Cell::Boolean(b) => CellRepr::Boolean(b),
            Cell::Number(n) if n.is_finite() => CellRepr::Number(n),
            Cell::Number(_) => CellRepr::Missing,
            Cell::Text(s) => CellRepr::Text(s),
            Cell::DateTime(datetime) => CellRepr::DateTime { datetime },
        }
    }
}

impl Cell {
    /// Number cell; non-finite values collapse to `Missing`.
    pub fn number(v: f64) -> Self {
        if v.is_finite() { Cell::Number(v) } else { Cell::Missing }
    }

    pub fn text<S: Into<String>>(s: S) -> Self { Cell::Text(s.into()) }

    pub fn is_missing(&self) -> bool { matches!(self, Cell::Missing) }

    pub fn as_f64(&self) -> Option<f64> {
        match self { Cell::Number(n) => Some(*n), _ => None }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { Cell::Text(s) => Some(s.as_str()), _ => None }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self { Cell::DateTime(dt) => Some(*dt), _ => None }
    }

    /// Textual rendering used for grouping keys and string columns. `Missing` has none.
    pub fn render(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Boolean(b) => Some(b.to_string()),
            Cell::Number(n) => Some(format_number(*n)),
            Cell::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

/// Integral values print without a fractional part (3.0 -> "3").
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 { format!("{}", n as i64) } else { n.to_string() }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.render() {
            Some(s) => f.write_str(&s),
            None => f.write_str(""),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self { Cell::number(v) }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self { Cell::Number(v as f64) }
}

impl From<i32> for Cell {
    fn from(v: i32) -> Self { Cell::Number(v as f64) }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self { Cell::Boolean(v) }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self { Cell::Text(v.to_string()) }
}

impl From<String> for Cell {
    fn from(v: String) -> Self { Cell::Text(v) }
}

impl From<NaiveDateTime> for Cell {
    fn from(v: NaiveDateTime) -> Self { Cell::DateTime(v) }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        match v { Some(x) => x.into(), None => Cell::Missing }
    }
}
