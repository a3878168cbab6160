//!
//! canopy table model
//! -------------------
//! A `Table` is an ordered list of column names plus rows of typed `Cell`s. Every
//! row has exactly one cell per column; rows built from ragged input are padded
//! with `Cell::Missing` (or truncated) on construction so positional access never
//! goes out of bounds.
//!
//! Tables are the unit exchanged between the store adapter, the registry, the
//! normalizer and the engine. Conversions to/from polars `DataFrame` live in
//! `frame.rs`.

use serde::{Deserialize, Serialize};

mod cell;
mod frame;

pub use cell::Cell;
pub(crate) use cell::format_number;
pub use frame::{any_value_to_cell, infer_dtype};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Wire form of a `Table`; rows are normalised to the header width on the way in.
#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Cell>>,
}

impl From<RawTable> for Table {
    fn from(raw: RawTable) -> Self { Table::from_rows(raw.columns, raw.rows) }
}

impl Table {
    /// Empty table with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { columns: columns.into_iter().map(Into::into).collect(), rows: Vec::new() }
    }

    /// Build from a header and rows, normalising every row to the header width.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Cell>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut t = Self::new(columns);
        for r in rows { t.push_row(r); }
        t
    }

    pub fn columns(&self) -> &[String] { &self.columns }

    pub fn rows(&self) -> &[Vec<Cell>] { &self.rows }

    pub fn height(&self) -> usize { self.rows.len() }

    pub fn width(&self) -> usize { self.columns.len() }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool { self.column_index(name).is_some() }

    /// Names from `wanted` that this table does not have, in the order given.
    pub fn missing_columns<'a>(&self, wanted: &[&'a str]) -> Vec<&'a str> {
        wanted.iter().copied().filter(|c| !self.has_column(c)).collect()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn row(&self, row: usize) -> Option<&[Cell]> { self.rows.get(row).map(|r| r.as_slice()) }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }

    /// Cells of one column, top to bottom.
    pub fn column_cells<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Replace every cell of `name` with `f(cell)`. Returns false when the column is absent.
    pub fn map_column<F: FnMut(&Cell) -> Cell>(&mut self, name: &str, mut f: F) -> bool {
        let Some(idx) = self.column_index(name) else { return false };
        for r in self.rows.iter_mut() {
            r[idx] = f(&r[idx]);
        }
        true
    }

    /// Append a column filled with `fill`. Returns false (and leaves the table
    /// unchanged) if a column with that name already exists.
    pub fn push_column(&mut self, name: &str, fill: Cell) -> bool {
        if self.has_column(name) { return false; }
        self.columns.push(name.to_string());
        for r in self.rows.iter_mut() { r.push(fill.clone()); }
        true
    }

    /// Append a column from explicit values; `values` must have one entry per row.
    pub fn push_column_values(&mut self, name: &str, values: Vec<Cell>) -> bool {
        if self.has_column(name) || values.len() != self.rows.len() { return false; }
        self.columns.push(name.to_string());
        for (r, v) in self.rows.iter_mut().zip(values) { r.push(v); }
        true
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) if !self.has_column(to) || from == to => {
                self.columns[idx] = to.to_string();
                true
            }
            _ => false,
        }
    }

    /// Project onto `columns` in that order; None if any column is absent.
    pub fn select(&self, columns: &[&str]) -> Option<Table> {
        let idxs: Vec<usize> = columns.iter().map(|c| self.column_index(c)).collect::<Option<_>>()?;
        let rows = self.rows.iter().map(|r| idxs.iter().map(|&i| r[i].clone()).collect()).collect();
        Some(Table { columns: columns.iter().map(|c| c.to_string()).collect(), rows })
    }

    /// Rows at the given positions, in the given order. Out-of-range positions are skipped.
    pub fn take_rows(&self, positions: &[usize]) -> Table {
        let rows = positions.iter().filter_map(|&i| self.rows.get(i).cloned()).collect();
        Table { columns: self.columns.clone(), rows }
    }

    pub fn head(&self, n: usize) -> Table {
        Table { columns: self.columns.clone(), rows: self.rows.iter().take(n).cloned().collect() }
    }

    pub fn filter_rows<F: FnMut(&[Cell]) -> bool>(&self, mut keep: F) -> Table {
        let rows = self.rows.iter().filter(|r| keep(r.as_slice())).cloned().collect();
        Table { columns: self.columns.clone(), rows }
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) { (self.columns, self.rows) }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod table_tests;
