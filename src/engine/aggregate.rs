//! Single-table aggregations.
//!
//! Missing values never count toward a sum, but the row they sit in still exists
//! for counting purposes. Rows with a missing or blank group key are left out of
//! every grouping.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::frames::{day_column, day_from_ce, key_column, number_column, positions, row_index, sort_options, ROW};
use super::{require_columns, MetricError, MetricResult};
use crate::normalize::key_value;
use crate::table::{Cell, Table};

/// One bucket of a date-bucketed sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
}

/// Sum of `column`, skipping cells that are not numeric.
pub fn sum_column(table: &Table, column: &str) -> MetricResult<f64> {
    require_columns(table, "table", &[column])?;
    let df = DataFrame::new(vec![number_column("__v", table, column)])?;
    let out = df.lazy().select([col("__v").sum()]).collect()?;
    Ok(out.column("__v")?.f64()?.get(0).unwrap_or(0.0))
}

fn matching_rows(table: &Table, column: &str, value: &str) -> MetricResult<Vec<usize>> {
    require_columns(table, "table", &[column])?;
    let Some(target) = key_value(&Cell::text(value)) else { return Ok(Vec::new()) };
    let df = DataFrame::new(vec![row_index(ROW, table.height()), key_column("__k", table, column)])?;
    let out = df.lazy().filter(col("__k").eq(lit(target))).collect()?;
    Ok(positions(&out, ROW)?)
}

/// Number of rows whose `column` equals `value` (compared as join keys).
pub fn count_equal(table: &Table, column: &str, value: &str) -> MetricResult<usize> {
    Ok(matching_rows(table, column, value)?.len())
}

/// Rows whose `column` equals `value`, in input order.
pub fn filter_equal(table: &Table, column: &str, value: &str) -> MetricResult<Table> {
    Ok(table.take_rows(&matching_rows(table, column, value)?))
}

/// Rows where `lhs <= rhs`, both read as numbers. A row with either side missing
/// never qualifies.
pub fn rows_at_or_below(table: &Table, lhs: &str, rhs: &str) -> MetricResult<Table> {
    require_columns(table, "table", &[lhs, rhs])?;
    let df = DataFrame::new(vec![
        row_index(ROW, table.height()),
        number_column("__a", table, lhs),
        number_column("__b", table, rhs),
    ])?;
    let out = df.lazy().filter(col("__a").lt_eq(col("__b"))).collect()?;
    Ok(table.take_rows(&positions(&out, ROW)?))
}

#[derive(Debug, Clone, Copy)]
enum GroupOrder {
    FirstSeen,
    CountDesc,
    SumDesc,
}

struct Group {
    first: usize,
    count: i64,
    sum: f64,
}

fn group_rows(table: &Table, keys: &[&str], value: Option<&str>, order: GroupOrder) -> MetricResult<Vec<Group>> {
    if keys.is_empty() {
        return Err(MetricError::Failed(anyhow::anyhow!("grouping needs at least one key column")));
    }
    let mut wanted: Vec<&str> = keys.to_vec();
    wanted.extend(value);
    require_columns(table, "table", &wanted)?;

    let key_names: Vec<String> = (0..keys.len()).map(|i| format!("__k{}", i)).collect();
    let mut cols = vec![row_index(ROW, table.height())];
    for (name, key) in key_names.iter().zip(keys) {
        cols.push(key_column(name, table, key));
    }
    if let Some(v) = value {
        cols.push(number_column("__v", table, v));
    }
    let df = DataFrame::new(cols)?;

    let has_keys = key_names
        .iter()
        .map(|k| col(k.as_str()).is_not_null())
        .reduce(|a, b| a.and(b))
        .unwrap_or(lit(true));
    let mut aggs = vec![
        col(ROW).min().alias("__first"),
        col(ROW).count().cast(DataType::Int64).alias("__count"),
    ];
    if value.is_some() {
        aggs.push(col("__v").sum().alias("__sum"));
    }
    let (by, descending) = match order {
        GroupOrder::FirstSeen => (vec![col("__first")], vec![false]),
        GroupOrder::CountDesc => (vec![col("__count"), col("__first")], vec![true, false]),
        GroupOrder::SumDesc if value.is_some() => (vec![col("__sum"), col("__first")], vec![true, false]),
        GroupOrder::SumDesc => (vec![col("__first")], vec![false]),
    };
    let out = df
        .lazy()
        .filter(has_keys)
        .group_by(key_names.iter().map(|k| col(k.as_str())).collect::<Vec<_>>())
        .agg(aggs)
        .sort_by_exprs(by, sort_options(descending))
        .collect()?;

    let firsts = positions(&out, "__first")?;
    let counts: Vec<i64> = out.column("__count")?.i64()?.into_iter().map(|c| c.unwrap_or(0)).collect();
    let sums: Vec<f64> = if value.is_some() {
        out.column("__sum")?.f64()?.into_iter().map(|s| s.unwrap_or(0.0)).collect()
    } else {
        vec![0.0; firsts.len()]
    };
    Ok(firsts
        .into_iter()
        .zip(counts)
        .zip(sums)
        .map(|((first, count), sum)| Group { first, count, sum })
        .collect())
}

fn key_cells(table: &Table, row: usize, keys: &[&str]) -> Vec<Cell> {
    keys.iter().map(|k| table.get(row, k).cloned().unwrap_or_default()).collect()
}

/// Row count per distinct value of `key`, most frequent first; ties keep first-seen order.
pub fn count_by(table: &Table, key: &str) -> MetricResult<Table> {
    let groups = group_rows(table, &[key], None, GroupOrder::CountDesc)?;
    let rows = groups
        .iter()
        .map(|g| {
            let mut r = key_cells(table, g.first, &[key]);
            r.push(Cell::Number(g.count as f64));
            r
        })
        .collect();
    Ok(Table::from_rows([key, "count"], rows))
}

fn sums_to_table(table: &Table, keys: &[&str], value: &str, groups: &[Group]) -> Table {
    let mut header: Vec<&str> = keys.to_vec();
    header.push(value);
    let rows = groups
        .iter()
        .map(|g| {
            let mut r = key_cells(table, g.first, keys);
            r.push(Cell::number(g.sum));
            r
        })
        .collect();
    Table::from_rows(header, rows)
}

/// Sum of `value` per distinct key tuple, groups in first-seen order.
pub fn sum_by(table: &Table, keys: &[&str], value: &str) -> MetricResult<Table> {
    let groups = group_rows(table, keys, Some(value), GroupOrder::FirstSeen)?;
    Ok(sums_to_table(table, keys, value, &groups))
}

/// The `n` key tuples with the largest sum of `value`. Equal sums keep the order
/// in which their keys first appear in the input.
pub fn top_n(table: &Table, keys: &[&str], value: &str, n: usize) -> MetricResult<Table> {
    let mut groups = group_rows(table, keys, Some(value), GroupOrder::SumDesc)?;
    groups.truncate(n);
    Ok(sums_to_table(table, keys, value, &groups))
}

/// Sum of `value` per calendar day of `date_column`, oldest day first. Rows with a
/// missing date or value are left out.
pub fn daily_totals(table: &Table, date_column: &str, value: &str) -> MetricResult<Vec<DailyTotal>> {
    require_columns(table, "table", &[date_column, value])?;
    let df = DataFrame::new(vec![day_column("__day", table, date_column), number_column("__v", table, value)])?;
    let out = df
        .lazy()
        .filter(col("__day").is_not_null().and(col("__v").is_not_null()))
        .group_by([col("__day")])
        .agg([col("__v").sum().alias("__total")])
        .sort_by_exprs(vec![col("__day")], sort_options(vec![false]))
        .collect()?;
    let days = out.column("__day")?.i32()?;
    let totals = out.column("__total")?.f64()?;
    Ok(days
        .into_iter()
        .zip(totals.into_iter())
        .filter_map(|(d, t)| Some(DailyTotal { date: day_from_ce(d?)?, total: t.unwrap_or(0.0) }))
        .collect())
}

/// Number of rows whose `date_column` falls on `day`.
pub fn count_on_day(table: &Table, date_column: &str, day: NaiveDate) -> MetricResult<usize> {
    require_columns(table, "table", &[date_column])?;
    let df = DataFrame::new(vec![day_column("__day", table, date_column)])?;
    let out = df.lazy().filter(col("__day").eq(lit(day.num_days_from_ce()))).collect()?;
    Ok(out.height())
}
