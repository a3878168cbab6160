//! Dashboard metrics and views.
//!
//! Each function takes the already-resolved tables it needs, checks the columns
//! it reads, and narrows every input to those columns before joining so that
//! unrelated columns can never collide.

use std::collections::HashSet;

use chrono::NaiveDate;

use super::aggregate::{count_by, count_equal, daily_totals, filter_equal, rows_at_or_below, sum_by, sum_column, count_on_day, top_n, DailyTotal};
use super::join::{inner_join, left_join, JoinSuffixes};
use super::{require_columns, MetricError, MetricResult};
use crate::normalize::{coerce_datetime, coerce_numeric, numeric_value};
use crate::table::{Cell, Table};

/// Filter value meaning "every dispensary".
pub const ALL_DISPENSARIES: &str = "All";

pub const LOCATION_COLUMNS: &[&str] = &["product_id", "dispensary_id", "quantity", "min_stock"];
pub const WAREHOUSE_COLUMNS: &[&str] = &["product_id", "quantity", "max_stock"];
pub const ALERT_DETAIL_COLUMNS: &[&str] = &["type", "message", "priority", "name", "creation_date"];

fn narrow(table: &Table, label: &str, columns: &[&str]) -> MetricResult<Table> {
    require_columns(table, label, columns)?;
    table
        .select(columns)
        .ok_or_else(|| MetricError::Unavailable(format!("{} is missing one of {}", label, columns.join(", "))))
}

pub fn total_sales(sales: &Table) -> MetricResult<f64> {
    require_columns(sales, "Sales", &["total"])?;
    sum_column(sales, "total")
}

pub fn active_alerts(alerts: &Table, active_state: &str) -> MetricResult<usize> {
    require_columns(alerts, "Alerts", &["state"])?;
    count_equal(alerts, "state", active_state)
}

/// Location inventory rows where `quantity <= min_stock`.
pub fn critical_rows(location: &Table) -> MetricResult<Table> {
    require_columns(location, "LocationInventory", &["quantity", "min_stock"])?;
    let coerced = coerce_numeric(coerce_numeric(location.clone(), "quantity"), "min_stock");
    rows_at_or_below(&coerced, "quantity", "min_stock")
}

pub fn low_stock_count(location: &Table) -> MetricResult<usize> {
    Ok(critical_rows(location)?.height())
}

/// Number of sales made on one calendar day.
pub fn sales_on(sales: &Table, day: NaiveDate) -> MetricResult<usize> {
    require_columns(sales, "Sales", &["sale_date"])?;
    count_on_day(sales, "sale_date", day)
}

pub fn daily_sales(sales: &Table) -> MetricResult<Vec<DailyTotal>> {
    require_columns(sales, "Sales", &["sale_date", "total"])?;
    daily_totals(sales, "sale_date", "total")
}

/// Best-selling products by units sold: `[name, quantity]`.
pub fn top_products(line_items: &Table, products: &Table, n: usize) -> MetricResult<Table> {
    let items = narrow(line_items, "SaleLineItems", &["product_id", "quantity"])?;
    let products = narrow(products, "Products", &["id", "name"])?;
    let joined = inner_join(&items, &products, "product_id", "id", &JoinSuffixes::default())?;
    top_n(&joined, &["name"], "quantity", n)
}

/// Warehouse rows of known products with their name and `stock_level`, the
/// percentage of `max_stock` on hand. The level is missing when either side is
/// missing or `max_stock` is zero.
pub fn warehouse_stock(warehouse: &Table, products: &Table) -> MetricResult<Table> {
    require_columns(warehouse, "WarehouseInventory", WAREHOUSE_COLUMNS)?;
    let products = narrow(products, "Products", &["id", "name"])?;
    let coerced = coerce_numeric(coerce_numeric(warehouse.clone(), "quantity"), "max_stock");
    let mut joined = inner_join(&coerced, &products, "product_id", "id", &JoinSuffixes::new("_warehouse", "_product"))?;
    let levels: Vec<Cell> = (0..joined.height())
        .map(|i| {
            let qty = joined.get(i, "quantity").and_then(numeric_value);
            let max = joined.get(i, "max_stock").and_then(numeric_value);
            match (qty, max) {
                (Some(q), Some(m)) if m != 0.0 => Cell::number(q / m * 100.0),
                _ => Cell::Missing,
            }
        })
        .collect();
    if !joined.push_column_values("stock_level", levels) {
        return Err(MetricError::Failed(anyhow::anyhow!("warehouse view already has a stock_level column")));
    }
    Ok(joined)
}

/// How `located` treats location rows whose product or dispensary is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unmatched {
    Drop,
    Keep,
}

/// Location inventory joined to product and dispensary names:
/// `[dispensary_name, product_name, quantity, min_stock]`.
fn located(location: &Table, products: &Table, dispensaries: &Table, unmatched: Unmatched) -> MetricResult<Table> {
    let products = narrow(products, "Products", &["id", "name"])?;
    let dispensaries = narrow(dispensaries, "Dispensaries", &["id", "name"])?;
    let join: fn(&Table, &Table, &str, &str, &JoinSuffixes) -> MetricResult<Table> = match unmatched {
        Unmatched::Drop => inner_join,
        Unmatched::Keep => left_join,
    };
    let with_product = join(location, &products, "product_id", "id", &JoinSuffixes::default())?;
    let suffixes = JoinSuffixes::new("_product", "_dispensary");
    let full = join(&with_product, &dispensaries, "dispensary_id", "id", &suffixes)?;
    let mut out = full
        .select(&["name_dispensary", "name_product", "quantity", "min_stock"])
        .ok_or_else(|| MetricError::Failed(anyhow::anyhow!("location join lost its name columns")))?;
    out.rename_column("name_dispensary", "dispensary_name");
    out.rename_column("name_product", "product_name");
    Ok(out)
}

/// Stock per known product and dispensary, optionally only for one dispensary
/// name (`All` or `None` keeps every dispensary).
pub fn location_stock(location: &Table, products: &Table, dispensaries: &Table, dispensary: Option<&str>) -> MetricResult<Table> {
    let location = narrow(location, "LocationInventory", LOCATION_COLUMNS)?;
    let coerced = coerce_numeric(coerce_numeric(location, "quantity"), "min_stock");
    let view = located(&coerced, products, dispensaries, Unmatched::Drop)?;
    match dispensary {
        Some(name) if name != ALL_DISPENSARIES => filter_equal(&view, "dispensary_name", name),
        _ => Ok(view),
    }
}

/// Critical stock with names attached. Rows whose product or dispensary is
/// unknown stay in the view with a missing name.
pub fn critical_stock(location: &Table, products: &Table, dispensaries: &Table) -> MetricResult<Table> {
    let location = narrow(location, "LocationInventory", LOCATION_COLUMNS)?;
    let critical = critical_rows(&location)?;
    located(&critical, products, dispensaries, Unmatched::Keep)
}

pub fn sales_by_payment_method(sales: &Table) -> MetricResult<Table> {
    require_columns(sales, "Sales", &["payment_method", "total"])?;
    sum_by(sales, &["payment_method"], "total")
}

/// `[name, total]` per dispensary with at least one sale.
pub fn sales_by_dispensary(sales: &Table, dispensaries: &Table) -> MetricResult<Table> {
    let sales = narrow(sales, "Sales", &["dispensary_id", "total"])?;
    let dispensaries = narrow(dispensaries, "Dispensaries", &["id", "name"])?;
    let joined = inner_join(&sales, &dispensaries, "dispensary_id", "id", &JoinSuffixes::default())?;
    sum_by(&joined, &["name"], "total")
}

/// Biggest spenders: `[first_name, last_name, total, full_name]`.
pub fn top_customers(sales: &Table, customers: &Table, n: usize) -> MetricResult<Table> {
    let sales = narrow(sales, "Sales", &["customer_id", "total"])?;
    let customers = narrow(customers, "Customers", &["id", "first_name", "last_name"])?;
    let joined = inner_join(&sales, &customers, "customer_id", "id", &JoinSuffixes::default())?;
    let mut ranked = top_n(&joined, &["first_name", "last_name"], "total", n)?;
    let full: Vec<Cell> = (0..ranked.height())
        .map(|i| {
            let part = |c: &str| ranked.get(i, c).and_then(|v| v.render()).unwrap_or_default();
            Cell::text(format!("{} {}", part("first_name"), part("last_name")).trim())
        })
        .collect();
    ranked.push_column_values("full_name", full);
    Ok(ranked)
}

pub fn alerts_by_state(alerts: &Table) -> MetricResult<Table> {
    require_columns(alerts, "Alerts", &["state"])?;
    count_by(alerts, "state")
}

pub fn active_alerts_by_priority(alerts: &Table, active_state: &str) -> MetricResult<Table> {
    require_columns(alerts, "Alerts", &["state", "priority"])?;
    count_by(&filter_equal(alerts, "state", active_state)?, "priority")
}

pub fn quality_results(quality: &Table) -> MetricResult<Table> {
    require_columns(quality, "QualityControl", &["result"])?;
    count_by(quality, "result")
}

/// Active alerts with the product name looked up; only the detail columns that
/// exist are returned.
pub fn active_alert_details(alerts: &Table, products: &Table, active_state: &str) -> MetricResult<Table> {
    require_columns(alerts, "Alerts", &["state", "product_id"])?;
    let products = narrow(products, "Products", &["id", "name"])?;
    let active = coerce_datetime(filter_equal(alerts, "state", active_state)?, "creation_date");
    let joined = left_join(&active, &products, "product_id", "id", &JoinSuffixes::new("_alert", "_product"))?;
    let present: Vec<&str> = ALERT_DETAIL_COLUMNS.iter().copied().filter(|c| joined.has_column(c)).collect();
    joined
        .select(&present)
        .ok_or_else(|| MetricError::Failed(anyhow::anyhow!("alert detail projection failed")))
}

/// `All` followed by each distinct dispensary name in first-seen order.
pub fn dispensary_options(dispensaries: &Table) -> MetricResult<Vec<String>> {
    require_columns(dispensaries, "Dispensaries", &["name"])?;
    let mut seen = HashSet::new();
    let mut out = vec![ALL_DISPENSARIES.to_string()];
    for cell in dispensaries.column_cells("name").into_iter().flatten() {
        if let Some(name) = cell.render().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            if seen.insert(name.clone()) {
                out.push(name);
            }
        }
    }
    Ok(out)
}
