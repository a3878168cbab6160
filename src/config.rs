//! Dashboard configuration.
//!
//! Resolution order: built-in defaults, then an optional JSON file, then
//! `CANOPY_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The nine table categories the dashboard understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SheetCategory {
    Dispensaries,
    Alerts,
    QualityControl,
    WarehouseInventory,
    LocationInventory,
    Sales,
    SaleLineItems,
    Products,
    Customers,
}

impl SheetCategory {
    pub const ALL: [SheetCategory; 9] = [
        SheetCategory::Dispensaries,
        SheetCategory::Alerts,
        SheetCategory::QualityControl,
        SheetCategory::WarehouseInventory,
        SheetCategory::LocationInventory,
        SheetCategory::Sales,
        SheetCategory::SaleLineItems,
        SheetCategory::Products,
        SheetCategory::Customers,
    ];

    /// Category identifier; also the default logical table name.
    pub fn identifier(&self) -> &'static str {
        match self {
            SheetCategory::Dispensaries => "Dispensaries",
            SheetCategory::Alerts => "Alerts",
            SheetCategory::QualityControl => "QualityControl",
            SheetCategory::WarehouseInventory => "WarehouseInventory",
            SheetCategory::LocationInventory => "LocationInventory",
            SheetCategory::Sales => "Sales",
            SheetCategory::SaleLineItems => "SaleLineItems",
            SheetCategory::Products => "Products",
            SheetCategory::Customers => "Customers",
        }
    }

    fn env_key(&self) -> &'static str {
        match self {
            SheetCategory::Dispensaries => "CANOPY_SHEET_DISPENSARIES",
            SheetCategory::Alerts => "CANOPY_SHEET_ALERTS",
            SheetCategory::QualityControl => "CANOPY_SHEET_QUALITY_CONTROL",
            SheetCategory::WarehouseInventory => "CANOPY_SHEET_WAREHOUSE_INVENTORY",
            SheetCategory::LocationInventory => "CANOPY_SHEET_LOCATION_INVENTORY",
            SheetCategory::Sales => "CANOPY_SHEET_SALES",
            SheetCategory::SaleLineItems => "CANOPY_SHEET_SALE_LINE_ITEMS",
            SheetCategory::Products => "CANOPY_SHEET_PRODUCTS",
            SheetCategory::Customers => "CANOPY_SHEET_CUSTOMERS",
        }
    }
}

/// Logical table name per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub dispensaries: String,
    pub alerts: String,
    pub quality_control: String,
    pub warehouse_inventory: String,
    pub location_inventory: String,
    pub sales: String,
    pub sale_line_items: String,
    pub products: String,
    pub customers: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            dispensaries: SheetCategory::Dispensaries.identifier().into(),
            alerts: SheetCategory::Alerts.identifier().into(),
            quality_control: SheetCategory::QualityControl.identifier().into(),
            warehouse_inventory: SheetCategory::WarehouseInventory.identifier().into(),
            location_inventory: SheetCategory::LocationInventory.identifier().into(),
            sales: SheetCategory::Sales.identifier().into(),
            sale_line_items: SheetCategory::SaleLineItems.identifier().into(),
            products: SheetCategory::Products.identifier().into(),
            customers: SheetCategory::Customers.identifier().into(),
        }
    }
}

impl SheetNames {
    pub fn get(&self, cat: SheetCategory) -> &str {
        match cat {
            SheetCategory::Dispensaries => &self.dispensaries,
            SheetCategory::Alerts => &self.alerts,
            SheetCategory::QualityControl => &self.quality_control,
            SheetCategory::WarehouseInventory => &self.warehouse_inventory,
            SheetCategory::LocationInventory => &self.location_inventory,
            SheetCategory::Sales => &self.sales,
            SheetCategory::SaleLineItems => &self.sale_line_items,
            SheetCategory::Products => &self.products,
            SheetCategory::Customers => &self.customers,
        }
    }

    pub fn set(&mut self, cat: SheetCategory, name: String) {
        let slot = match cat {
            SheetCategory::Dispensaries => &mut self.dispensaries,
            SheetCategory::Alerts => &mut self.alerts,
            SheetCategory::QualityControl => &mut self.quality_control,
            SheetCategory::WarehouseInventory => &mut self.warehouse_inventory,
            SheetCategory::LocationInventory => &mut self.location_inventory,
            SheetCategory::Sales => &mut self.sales,
            SheetCategory::SaleLineItems => &mut self.sale_line_items,
            SheetCategory::Products => &mut self.products,
            SheetCategory::Customers => &mut self.customers,
        };
        *slot = name;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Persistent workbook every save goes to.
    pub default_store: PathBuf,
    pub sheet_names: SheetNames,
    /// Length of top-N rankings.
    pub top_n: usize,
    /// Alert `state` value counted as active.
    pub active_state: String,
    /// Rows shown per table in the enumeration view.
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_store: PathBuf::from("data").join("db.json"),
            sheet_names: SheetNames::default(),
            top_n: 5,
            active_state: "Active".to_string(),
            preview_rows: 5,
        }
    }
}

impl DashboardConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config '{}'", path.display()))?;
        let cfg: DashboardConfig = serde_json::from_str(&text).with_context(|| format!("parsing config '{}'", path.display()))?;
        Ok(cfg)
    }

    /// Apply `CANOPY_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|k| std::env::var(k).ok())
    }

    /// Apply overrides from any key lookup; unset or blank keys leave values alone.
    pub fn with_overrides<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Result<Self> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = get("CANOPY_DEFAULT_STORE") { self.default_store = PathBuf::from(v); }
        if let Some(v) = get("CANOPY_TOP_N") {
            self.top_n = v.parse().with_context(|| format!("CANOPY_TOP_N must be a non-negative integer, got '{}'", v))?;
        }
        if let Some(v) = get("CANOPY_ACTIVE_STATE") { self.active_state = v; }
        if let Some(v) = get("CANOPY_PREVIEW_ROWS") {
            self.preview_rows = v.parse().with_context(|| format!("CANOPY_PREVIEW_ROWS must be a non-negative integer, got '{}'", v))?;
        }
        for cat in SheetCategory::ALL {
            if let Some(v) = get(cat.env_key()) {
                debug!(target: "canopy::config", "sheet override: {:?} -> '{}'", cat, v);
                self.sheet_names.set(cat, v);
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_use_category_identifiers() {
        let cfg = DashboardConfig::default();
        for cat in SheetCategory::ALL {
            assert_eq!(cfg.sheet_names.get(cat), cat.identifier());
        }
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.default_store, PathBuf::from("data").join("db.json"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: DashboardConfig = serde_json::from_str(r#"{"top_n": 3, "sheet_names": {"sales": "Ventas"}}"#).unwrap();
        assert_eq!(cfg.top_n, 3);
        assert_eq!(cfg.sheet_names.sales, "Ventas");
        assert_eq!(cfg.sheet_names.products, "Products");
        assert_eq!(cfg.active_state, "Active");
    }

    #[test]
    fn test_overrides_apply_and_validate() {
        let env: HashMap<&str, &str> = [
            ("CANOPY_TOP_N", "10"),
            ("CANOPY_SHEET_SALES", "Ventas"),
            ("CANOPY_ACTIVE_STATE", " "),
        ]
        .into_iter()
        .collect();
        let cfg = DashboardConfig::default().with_overrides(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.top_n, 10);
        assert_eq!(cfg.sheet_names.get(SheetCategory::Sales), "Ventas");
        assert_eq!(cfg.active_state, "Active");

        let bad = DashboardConfig::default().with_overrides(|k| (k == "CANOPY_TOP_N").then(|| "many".to_string()));
        assert!(bad.is_err());
    }
}
