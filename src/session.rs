//!
//! canopy dashboard session
//! ------------------------
//! A `DashboardSession` holds one loaded snapshot: the configuration, the default
//! store, the uploaded sources and the table registry built from them. Every view
//! the presentation layer needs is computed from that snapshot on request; edits
//! go back through the store and the snapshot is reloaded afterwards.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{DashboardConfig, SheetCategory};
use crate::edit::{add_column, ColumnKind, EditController};
use crate::engine::dashboard;
use crate::engine::{evaluate, DailyTotal, MetricError, MetricOutcome, MetricResult};
use crate::error::{AppError, AppResult};
use crate::registry::{load_sources, TableRegistry, UploadedSource};
use crate::storage::{TableStore, WorkbookFile};
use crate::table::Table;

/// Every metric and view of the dashboard, each computed independently.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub today: NaiveDate,
    pub dispensary: String,
    pub load_errors: Vec<AppError>,
    pub missing_tables: Vec<SheetCategory>,
    pub dispensary_options: MetricOutcome<Vec<String>>,
    pub total_sales: MetricOutcome<f64>,
    pub active_alerts: MetricOutcome<usize>,
    pub low_stock: MetricOutcome<usize>,
    pub sales_today: MetricOutcome<usize>,
    pub daily_sales: MetricOutcome<Vec<DailyTotal>>,
    pub top_products: MetricOutcome<Table>,
    pub warehouse_stock: MetricOutcome<Table>,
    pub location_stock: MetricOutcome<Table>,
    pub critical_stock: MetricOutcome<Table>,
    pub sales_by_payment_method: MetricOutcome<Table>,
    pub sales_by_dispensary: MetricOutcome<Table>,
    pub top_customers: MetricOutcome<Table>,
    pub alerts_by_state: MetricOutcome<Table>,
    pub active_alerts_by_priority: MetricOutcome<Table>,
    pub quality_results: MetricOutcome<Table>,
    pub active_alert_details: MetricOutcome<Table>,
}

/// One line of the table enumeration view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub qualified: String,
    pub source_id: String,
    pub sheet: String,
    pub rows: usize,
    pub columns: usize,
    pub preview: Table,
}

pub struct DashboardSession {
    config: DashboardConfig,
    store: Box<dyn TableStore>,
    uploads: Vec<UploadedSource>,
    registry: TableRegistry,
    load_errors: Vec<AppError>,
    today: NaiveDate,
    /// Last edit whose save failed, kept for `retry_save`.
    pending: Option<PendingEdit>,
}

/// An edited table that has not reached the store yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    pub qualified: String,
    pub table: Table,
}

impl DashboardSession {
    /// Session over the workbook file named by `config.default_store`.
    pub fn load(config: DashboardConfig, uploads: Vec<UploadedSource>) -> Self {
        let store = WorkbookFile::new(&config.default_store);
        Self::with_store(config, Box::new(store), uploads)
    }

    pub fn with_store(config: DashboardConfig, store: Box<dyn TableStore>, uploads: Vec<UploadedSource>) -> Self {
        let (registry, load_errors) = load_sources(store.as_ref(), &uploads);
        info!(target: "canopy::session", "session over {} with {} uploads: {} tables", store.describe(), uploads.len(), registry.len());
        Self { config, store, uploads, registry, load_errors, today: Local::now().date_naive(), pending: None }
    }

    /// Pin the day used by "sales today".
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Re-read every source.
    pub fn reload(&mut self) {
        let (registry, load_errors) = load_sources(self.store.as_ref(), &self.uploads);
        self.registry = registry;
        self.load_errors = load_errors;
    }

    pub fn config(&self) -> &DashboardConfig { &self.config }

    pub fn store(&self) -> &dyn TableStore { self.store.as_ref() }

    pub fn registry(&self) -> &TableRegistry { &self.registry }

    pub fn load_errors(&self) -> &[AppError] { &self.load_errors }

    pub fn logical_name(&self, category: SheetCategory) -> &str { self.config.sheet_names.get(category) }

    /// The table behind a category, or `Unavailable` when no source has it.
    pub fn table(&self, category: SheetCategory) -> MetricResult<&Table> {
        let logical = self.logical_name(category);
        self.registry
            .resolve(logical)
            .map_err(|_| MetricError::Unavailable(format!("no table named '{}' ({}) is loaded", logical, category.identifier())))
    }

    /// Categories whose logical name resolves to nothing.
    pub fn missing_categories(&self) -> Vec<SheetCategory> {
        SheetCategory::ALL
            .into_iter()
            .filter(|c| self.registry.resolve_entry(self.logical_name(*c)).is_none())
            .collect()
    }

    pub fn dispensary_options(&self) -> MetricOutcome<Vec<String>> {
        evaluate("dispensary_options", || dashboard::dispensary_options(self.table(SheetCategory::Dispensaries)?))
    }

    /// Compute every metric. `dispensary` narrows the location inventory view;
    /// `None` or `All` shows every location.
    pub fn report(&self, dispensary: Option<&str>) -> DashboardReport {
        use SheetCategory::*;
        let active = self.config.active_state.as_str();
        let n = self.config.top_n;
        let t = |c| self.table(c);
        let report = DashboardReport {
            today: self.today,
            dispensary: dispensary.unwrap_or(dashboard::ALL_DISPENSARIES).to_string(),
            load_errors: self.load_errors.clone(),
            missing_tables: self.missing_categories(),
            dispensary_options: self.dispensary_options(),
            total_sales: evaluate("total_sales", || dashboard::total_sales(t(Sales)?)),
            active_alerts: evaluate("active_alerts", || dashboard::active_alerts(t(Alerts)?, active)),
            low_stock: evaluate("low_stock", || dashboard::low_stock_count(t(LocationInventory)?)),
            sales_today: evaluate("sales_today", || dashboard::sales_on(t(Sales)?, self.today)),
            daily_sales: evaluate("daily_sales", || dashboard::daily_sales(t(Sales)?)),
            top_products: evaluate("top_products", || dashboard::top_products(t(SaleLineItems)?, t(Products)?, n)),
            warehouse_stock: evaluate("warehouse_stock", || dashboard::warehouse_stock(t(WarehouseInventory)?, t(Products)?)),
            location_stock: evaluate("location_stock", || {
                dashboard::location_stock(t(LocationInventory)?, t(Products)?, t(Dispensaries)?, dispensary)
            }),
            critical_stock: evaluate("critical_stock", || dashboard::critical_stock(t(LocationInventory)?, t(Products)?, t(Dispensaries)?)),
            sales_by_payment_method: evaluate("sales_by_payment_method", || dashboard::sales_by_payment_method(t(Sales)?)),
            sales_by_dispensary: evaluate("sales_by_dispensary", || dashboard::sales_by_dispensary(t(Sales)?, t(Dispensaries)?)),
            top_customers: evaluate("top_customers", || dashboard::top_customers(t(Sales)?, t(Customers)?, n)),
            alerts_by_state: evaluate("alerts_by_state", || dashboard::alerts_by_state(t(Alerts)?)),
            active_alerts_by_priority: evaluate("active_alerts_by_priority", || dashboard::active_alerts_by_priority(t(Alerts)?, active)),
            quality_results: evaluate("quality_results", || dashboard::quality_results(t(QualityControl)?)),
            active_alert_details: evaluate("active_alert_details", || dashboard::active_alert_details(t(Alerts)?, t(Products)?, active)),
        };
        for missing in &report.missing_tables {
            warn!(target: "canopy::session", "no table for category {} (looked for '{}')", missing.identifier(), self.logical_name(*missing));
        }
        report
    }

    /// Every registered table with its size and first rows.
    pub fn table_summaries(&self) -> Vec<TableSummary> {
        self.registry
            .list_all()
            .map(|e| TableSummary {
                qualified: e.qualified.clone(),
                source_id: e.source_id.clone(),
                sheet: e.sheet.clone(),
                rows: e.table.height(),
                columns: e.table.width(),
                preview: e.table.head(self.config.preview_rows),
            })
            .collect()
    }

    /// Project a registered table onto `columns`; an empty list keeps them all.
    pub fn custom_view(&self, qualified: &str, columns: &[&str]) -> MetricOutcome<Table> {
        evaluate("custom_view", || {
            let entry = self
                .registry
                .get(qualified)
                .ok_or_else(|| MetricError::Unavailable(format!("'{}' is not a loaded table", qualified)))?;
            if columns.is_empty() {
                return Ok(entry.table.clone());
            }
            crate::engine::require_columns(&entry.table, qualified, columns)?;
            entry
                .table
                .select(columns)
                .ok_or_else(|| MetricError::Unavailable(format!("'{}' lacks a requested column", qualified)))
        })
    }

    pub fn editor(&self) -> EditController<'_> { EditController::new(self.store.as_ref(), &self.uploads) }

    /// Save `table` over the sheet behind `qualified` in the default store and reload.
    /// A failed save keeps the table as the pending edit.
    pub fn apply_edit(&mut self, qualified: &str, table: &Table) -> AppResult<()> {
        if let Err(e) = self.editor().apply_edit(&self.registry, qualified, table) {
            if matches!(e, AppError::Persistence { .. }) {
                warn!(target: "canopy::session", "keeping unsaved edit of {}: {}", qualified, e);
                self.pending = Some(PendingEdit { qualified: qualified.to_string(), table: table.clone() });
            }
            return Err(e);
        }
        self.pending = None;
        self.reload();
        Ok(())
    }

    pub fn unsaved_edit(&self) -> Option<&PendingEdit> { self.pending.as_ref() }

    /// Save the pending edit again. Succeeds trivially when nothing is pending.
    pub fn retry_save(&mut self) -> AppResult<()> {
        match self.pending.take() {
            Some(edit) => self.apply_edit(&edit.qualified, &edit.table),
            None => Ok(()),
        }
    }

    /// Append a typed column to a registered table and save it.
    pub fn add_column(&mut self, qualified: &str, column: &str, kind: ColumnKind) -> AppResult<()> {
        let entry = self
            .registry
            .get(qualified)
            .ok_or_else(|| AppError::table_not_found("table_not_found".to_string(), format!("'{}' is not a loaded table", qualified)))?;
        let edited = add_column(&entry.table, column, kind, Local::now().naive_local())?;
        self.apply_edit(qualified, &edited)
    }

    pub fn create_table(&mut self, name: &str) -> AppResult<()> {
        self.editor().create_table(name)?;
        self.reload();
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
