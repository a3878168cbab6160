//! Key joins between two tables.
//!
//! Keys compare in canonical form (`normalize::key_value`): `3`, `3.0` and `"3"`
//! are the same key, text is trimmed, and a missing or blank key never matches.
//!
//! Output columns are every left column followed by every right column. A name
//! present on both sides gets `suffixes.left` / `suffixes.right` appended, except
//! that a key column shared by name appears once, unsuffixed, holding the left
//! value. Output rows follow left row order, then right row order.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::frames::{key_column, optional_positions, positions, row_index, sort_options};
use super::{require_columns, MetricResult};
use crate::table::{Cell, Table};

/// Name suffixes applied to columns that exist on both sides of a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSuffixes {
    pub left: String,
    pub right: String,
}

impl Default for JoinSuffixes {
    fn default() -> Self { Self { left: "_left".to_string(), right: "_right".to_string() } }
}

impl JoinSuffixes {
    pub fn new<S: Into<String>>(left: S, right: S) -> Self { Self { left: left.into(), right: right.into() } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum How {
    Inner,
    Left,
}

/// Rows matching on `left.left_key == right.right_key`, one output row per
/// matching pair. Rows without a usable key on either side are dropped.
pub fn inner_join(left: &Table, right: &Table, left_key: &str, right_key: &str, suffixes: &JoinSuffixes) -> MetricResult<Table> {
    join_tables(left, right, left_key, right_key, suffixes, How::Inner)
}

/// Lookup join: every left row appears exactly once, paired with the first right
/// row carrying its key, or with missing right cells when there is none.
pub fn left_join(left: &Table, right: &Table, left_key: &str, right_key: &str, suffixes: &JoinSuffixes) -> MetricResult<Table> {
    join_tables(left, right, left_key, right_key, suffixes, How::Left)
}

fn join_tables(left: &Table, right: &Table, left_key: &str, right_key: &str, suffixes: &JoinSuffixes, how: How) -> MetricResult<Table> {
    require_columns(left, "left side of join", &[left_key])?;
    require_columns(right, "right side of join", &[right_key])?;
    let pairs = matched_pairs(left, right, left_key, right_key, how)?;
    debug!(target: "canopy::engine", "join {:?}: {} = {} left_rows={} right_rows={} out_rows={}", how, left_key, right_key, left.height(), right.height(), pairs.len());
    Ok(assemble(left, right, left_key, right_key, &pairs, suffixes))
}

fn matched_pairs(left: &Table, right: &Table, left_key: &str, right_key: &str, how: How) -> MetricResult<Vec<(usize, Option<usize>)>> {
    let ldf = DataFrame::new(vec![row_index("__lrow", left.height()), key_column("__lkey", left, left_key)])?;
    let mut rlf = DataFrame::new(vec![row_index("__rrow", right.height()), key_column("__rkey", right, right_key)])?
        .lazy()
        .filter(col("__rkey").is_not_null());
    if how == How::Left {
        rlf = rlf.group_by([col("__rkey")]).agg([col("__rrow").min()]);
    }
    let rdf = rlf.collect()?;
    let ldf = match how {
        How::Inner => ldf.lazy().filter(col("__lkey").is_not_null()).collect()?,
        How::Left => ldf,
    };
    let jt = match how {
        How::Inner => JoinType::Inner,
        How::Left => JoinType::Left,
    };
    let joined = ldf.join(&rdf, vec!["__lkey"], vec!["__rkey"], jt.into(), None)?;
    let joined = joined
        .lazy()
        .sort_by_exprs(vec![col("__lrow"), col("__rrow")], sort_options(vec![false, false]))
        .collect()?;
    let lrows = positions(&joined, "__lrow")?;
    let rrows = optional_positions(&joined, "__rrow")?;
    Ok(lrows.into_iter().zip(rrows).collect())
}

fn assemble(left: &Table, right: &Table, left_key: &str, right_key: &str, pairs: &[(usize, Option<usize>)], suffixes: &JoinSuffixes) -> Table {
    let shared_key = left_key == right_key;
    let right_idx: Vec<usize> = right
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| !(shared_key && c.as_str() == right_key))
        .map(|(i, _)| i)
        .collect();
    let right_names: Vec<&str> = right_idx.iter().map(|&i| right.columns()[i].as_str()).collect();

    let mut header: Vec<String> = left
        .columns()
        .iter()
        .map(|c| if right_names.contains(&c.as_str()) { format!("{}{}", c, suffixes.left) } else { c.clone() })
        .collect();
    header.extend(right_names.iter().map(|c| if left.has_column(c) { format!("{}{}", c, suffixes.right) } else { c.to_string() }));

    let rows = pairs
        .iter()
        .map(|&(l, r)| {
            let mut row: Vec<Cell> = left.rows()[l].clone();
            let rrow = r.and_then(|r| right.row(r));
            row.extend(right_idx.iter().map(|&i| rrow.map(|cells| cells[i].clone()).unwrap_or_default()));
            row
        })
        .collect();
    Table::from_rows(header, rows)
}
