//! Key-frame column builders. Every builder reads one table column through the
//! normalizer; a cell that does not convert becomes null.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::normalize::{datetime_value, key_value, numeric_value};
use crate::table::{Cell, Table};

pub(crate) const ROW: &str = "__row";

/// Positions `0..n` as a u32 column.
pub(crate) fn row_index(name: &str, n: usize) -> Column {
    Series::new(name.into(), (0..n as u32).collect::<Vec<u32>>()).into()
}

fn cells<'a>(table: &'a Table, column: &str) -> Vec<&'a Cell> {
    table.column_cells(column).map(|it| it.collect()).unwrap_or_default()
}

pub(crate) fn key_column(name: &str, table: &Table, column: &str) -> Column {
    let v: Vec<Option<String>> = cells(table, column).into_iter().map(key_value).collect();
    Series::new(name.into(), v).into()
}

pub(crate) fn number_column(name: &str, table: &Table, column: &str) -> Column {
    let v: Vec<Option<f64>> = cells(table, column).into_iter().map(numeric_value).collect();
    Series::new(name.into(), v).into()
}

/// Calendar day of a datetime column as days from the common era.
pub(crate) fn day_column(name: &str, table: &Table, column: &str) -> Column {
    let v: Vec<Option<i32>> = cells(table, column)
        .into_iter()
        .map(|c| datetime_value(c).map(|dt| dt.date().num_days_from_ce()))
        .collect();
    Series::new(name.into(), v).into()
}

pub(crate) fn day_from_ce(days: i32) -> Option<NaiveDate> { NaiveDate::from_num_days_from_ce_opt(days) }

/// Row positions held in a u32 column, skipping nulls.
pub(crate) fn positions(df: &DataFrame, name: &str) -> PolarsResult<Vec<usize>> {
    Ok(df.column(name)?.u32()?.into_iter().flatten().map(|v| v as usize).collect())
}

/// Row positions held in a u32 column, nulls kept as `None`.
pub(crate) fn optional_positions(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<usize>>> {
    Ok(df.column(name)?.u32()?.into_iter().map(|v| v.map(|p| p as usize)).collect())
}

/// Sort options with nulls last and stable ordering among equal keys.
pub(crate) fn sort_options(descending: Vec<bool>) -> SortMultipleOptions {
    let n = descending.len();
    SortMultipleOptions { descending, nulls_last: vec![true; n], maintain_order: true, multithreaded: true, limit: None }
}
