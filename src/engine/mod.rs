//!
//! canopy aggregation engine
//! -------------------------
//! Pure functions over `Table`s: sums, conditional counts, threshold selection,
//! date buckets, grouped rankings and key joins. The heavy lifting runs in polars
//! over small key frames (row indexes, canonical keys, numeric values); output
//! tables are then assembled from the original cells by row index so cell types
//! survive a join or a grouping untouched.
//!
//! Every metric returns `MetricResult<T>`. Missing input (an absent table or
//! column) is `MetricError::Unavailable`; anything else is `MetricError::Failed`.
//! `evaluate` turns that into a `MetricOutcome` so one failing metric never stops
//! its neighbours.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::table::Table;

pub mod aggregate;
pub mod dashboard;
mod frames;
pub mod join;

pub use aggregate::DailyTotal;
pub use join::JoinSuffixes;

#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl From<polars::prelude::PolarsError> for MetricError {
    fn from(e: polars::prelude::PolarsError) -> Self { MetricError::Failed(anyhow::Error::new(e)) }
}

pub type MetricResult<T> = Result<T, MetricError>;

/// Caller-facing state of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum MetricOutcome<T> {
    Available(T),
    Unavailable(String),
    Error(String),
}

impl<T> MetricOutcome<T> {
    pub fn is_available(&self) -> bool { matches!(self, MetricOutcome::Available(_)) }

    pub fn available(&self) -> Option<&T> {
        match self {
            MetricOutcome::Available(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> MetricOutcome<U> {
        match self {
            MetricOutcome::Available(v) => MetricOutcome::Available(f(v)),
            MetricOutcome::Unavailable(r) => MetricOutcome::Unavailable(r),
            MetricOutcome::Error(e) => MetricOutcome::Error(e),
        }
    }
}

impl<T> From<MetricResult<T>> for MetricOutcome<T> {
    fn from(r: MetricResult<T>) -> Self {
        match r {
            Ok(v) => MetricOutcome::Available(v),
            Err(MetricError::Unavailable(reason)) => MetricOutcome::Unavailable(reason),
            Err(MetricError::Failed(e)) => MetricOutcome::Error(format!("{:#}", e)),
        }
    }
}

/// Run one metric in isolation and log how it ended.
pub fn evaluate<T, F>(name: &str, f: F) -> MetricOutcome<T>
where
    F: FnOnce() -> MetricResult<T>,
{
    let __t0 = std::time::Instant::now();
    let outcome = MetricOutcome::from(f());
    match &outcome {
        MetricOutcome::Available(_) => debug!(target: "canopy::engine", "metric '{}' ok in {:?}", name, __t0.elapsed()),
        MetricOutcome::Unavailable(reason) => debug!(target: "canopy::engine", "metric '{}' unavailable: {}", name, reason),
        MetricOutcome::Error(detail) => warn!(target: "canopy::engine", "metric '{}' failed: {}", name, detail),
    }
    outcome
}

/// `Unavailable` naming every column of `columns` that `table` lacks.
pub fn require_columns(table: &Table, label: &str, columns: &[&str]) -> MetricResult<()> {
    let missing = table.missing_columns(columns);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MetricError::Unavailable(format!("{} is missing column(s) {}", label, missing.join(", "))))
    }
}
