use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;

use super::{Cell, Table};

/// Pick one polars dtype for a column of cells. Missing cells do not vote;
/// any disagreement widens to String, mirroring how mixed sheet columns read.
pub fn infer_dtype<'a, I: IntoIterator<Item = &'a Cell>>(cells: I) -> DataType {
    let mut seen: Option<DataType> = None;
    for c in cells {
        let dt = match c {
            Cell::Missing => continue,
            Cell::Number(_) => DataType::Float64,
            Cell::Boolean(_) => DataType::Boolean,
            Cell::DateTime(_) => DataType::Datetime(TimeUnit::Milliseconds, None),
            Cell::Text(_) => return DataType::String,
        };
        match &seen {
            None => seen = Some(dt),
            Some(prev) if *prev == dt => {}
            Some(_) => return DataType::String,
        }
    }
    // An all-missing column has no evidence either way; treat it as numeric nulls.
    seen.unwrap_or(DataType::Float64)
}

pub(crate) fn cells_to_column<'a, I>(name: &str, cells: I, dtype: &DataType) -> PolarsResult<Column>
where
    I: IntoIterator<Item = &'a Cell>,
{
    let s = match dtype {
        DataType::Float64 => {
            let v: Vec<Option<f64>> = cells.into_iter().map(|c| c.as_f64()).collect();
            Series::new(name.into(), v)
        }
        DataType::Boolean => {
            let v: Vec<Option<bool>> = cells.into_iter().map(|c| match c { Cell::Boolean(b) => Some(*b), _ => None }).collect();
            Series::new(name.into(), v)
        }
        DataType::Datetime(_, _) => {
            let v: Vec<Option<i64>> = cells.into_iter().map(|c| c.as_datetime().map(|dt| dt.and_utc().timestamp_millis())).collect();
            Series::new(name.into(), v).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        _ => {
            let v: Vec<Option<String>> = cells.into_iter().map(|c| c.render()).collect();
            Series::new(name.into(), v)
        }
    };
    Ok(s.into())
}

fn datetime_from_units(v: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(v),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(v),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
    };
    dt.map(|d| d.naive_utc())
}

pub fn any_value_to_cell(av: AnyValue) -> Cell {
    match av {
        AnyValue::Null => Cell::Missing,
        AnyValue::Boolean(b) => Cell::Boolean(b),
        AnyValue::String(s) => Cell::Text(s.to_string()),
        AnyValue::StringOwned(s) => Cell::Text(s.to_string()),
        AnyValue::Float64(v) => Cell::number(v),
        AnyValue::Float32(v) => Cell::number(v as f64),
        AnyValue::Int64(v) => Cell::Number(v as f64),
        AnyValue::Int32(v) => Cell::Number(v as f64),
        AnyValue::UInt64(v) => Cell::Number(v as f64),
        AnyValue::UInt32(v) => Cell::Number(v as f64),
        AnyValue::Datetime(v, unit, _) => datetime_from_units(v, unit).map(Cell::DateTime).unwrap_or(Cell::Missing),
        other => Cell::Text(other.to_string()),
    }
}

impl Table {
    /// Materialise the whole table as a DataFrame, one inferred dtype per column.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut cols: Vec<Column> = Vec::with_capacity(self.width());
        for (idx, name) in self.columns().iter().enumerate() {
            let dtype = infer_dtype(self.rows().iter().map(|r| &r[idx]));
            cols.push(cells_to_column(name, self.rows().iter().map(|r| &r[idx]), &dtype)?);
        }
        DataFrame::new(cols)
    }

    /// Read a DataFrame back into cells; nulls become `Cell::Missing`.
    pub fn from_frame(df: &DataFrame) -> PolarsResult<Table> {
        let names: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
        let mut rows: Vec<Vec<Cell>> = vec![Vec::with_capacity(names.len()); df.height()];
        for name in &names {
            let column = df.column(name.as_str())?;
            for (i, row) in rows.iter_mut().enumerate() {
                row.push(any_value_to_cell(column.get(i)?));
            }
        }
        Ok(Table::from_rows(names, rows))
    }
}
