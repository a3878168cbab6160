//! Edit and persistence controller.
//!
//! Edits happen on a `WorkingCopy` held by the caller. Saving writes the working
//! copy into the default store under its sheet name, replacing that one table.
//! Uploaded files are never written back; a copy opened from an upload is saved
//! into the default store like any other. A failed save leaves the working copy
//! untouched so it can be retried.

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::registry::{TableRegistry, UploadedSource};
use crate::storage::{export_file_name, TableStore, Workbook};
use crate::table::{Cell, Table};

/// Header of a freshly created table.
pub const NEW_TABLE_COLUMNS: &[&str] = &["ID"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Number,
    Date,
    Boolean,
}

impl ColumnKind {
    /// Uniform fill value for a new column of this kind.
    pub fn default_cell(&self, now: NaiveDateTime) -> Cell {
        match self {
            ColumnKind::Text => Cell::text(""),
            ColumnKind::Number => Cell::Number(0.0),
            ColumnKind::Date => Cell::DateTime(now),
            ColumnKind::Boolean => Cell::Boolean(false),
        }
    }
}

impl FromStr for ColumnKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(ColumnKind::Text),
            "number" | "numeric" => Ok(ColumnKind::Number),
            "date" | "datetime" => Ok(ColumnKind::Date),
            "boolean" | "bool" => Ok(ColumnKind::Boolean),
            other => Err(AppError::user("invalid_column_kind".to_string(), format!("unknown column type '{}' (expected text, number, date or boolean)", other))),
        }
    }
}

/// Copy of `table` with `name` appended, every row holding the kind's default.
pub fn add_column(table: &Table, name: &str, kind: ColumnKind, now: NaiveDateTime) -> AppResult<Table> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::user("invalid_column_name".to_string(), "column name must not be empty".to_string()));
    }
    let mut out = table.clone();
    if !out.push_column(name, kind.default_cell(now)) {
        return Err(AppError::conflict("column_exists".to_string(), format!("column '{}' already exists", name)));
    }
    Ok(out)
}

/// Where a working copy was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum EditSource {
    DefaultStore,
    Upload(String),
}

impl Display for EditSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EditSource::DefaultStore => write!(f, "default store"),
            EditSource::Upload(name) => write!(f, "upload '{}'", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkingCopy {
    pub source: EditSource,
    pub sheet: String,
    pub table: Table,
}

/// A single-table workbook ready to hand to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn export_table(sheet: &str, table: &Table) -> AppResult<Download> {
    let bytes = Workbook::single(sheet, table).to_bytes().map_err(AppError::from_save)?;
    Ok(Download { file_name: export_file_name(sheet), bytes })
}

pub struct EditController<'a> {
    store: &'a dyn TableStore,
    uploads: &'a [UploadedSource],
}

impl<'a> EditController<'a> {
    pub fn new(store: &'a dyn TableStore, uploads: &'a [UploadedSource]) -> Self { Self { store, uploads } }

    /// The default store followed by every upload, in upload order.
    pub fn editable_sources(&self) -> Vec<EditSource> {
        let mut out = vec![EditSource::DefaultStore];
        out.extend(self.uploads.iter().map(|u| EditSource::Upload(u.file_name.clone())));
        out
    }

    fn read_tables(&self, source: &EditSource) -> AppResult<Vec<(String, Table)>> {
        match source {
            EditSource::DefaultStore => Ok(self.store.read_all_tables()?),
            EditSource::Upload(name) => {
                let upload = self
                    .uploads
                    .iter()
                    .find(|u| &u.file_name == name)
                    .ok_or_else(|| AppError::user("unknown_source".to_string(), format!("no upload named '{}'", name)))?;
                Ok(Workbook::parse(&upload.bytes, Path::new(&upload.file_name))?.tables())
            }
        }
    }

    pub fn sheets(&self, source: &EditSource) -> AppResult<Vec<String>> {
        Ok(self.read_tables(source)?.into_iter().map(|(n, _)| n).collect())
    }

    pub fn open(&self, source: &EditSource, sheet: &str) -> AppResult<WorkingCopy> {
        let table = self
            .read_tables(source)?
            .into_iter()
            .find(|(n, _)| n == sheet)
            .map(|(_, t)| t)
            .ok_or_else(|| AppError::table_not_found("table_not_found".to_string(), format!("{} has no sheet '{}'", source, sheet)))?;
        Ok(WorkingCopy { source: source.clone(), sheet: sheet.to_string(), table })
    }

    /// Discard edits by reading the sheet again from where it came from.
    pub fn revert(&self, copy: &WorkingCopy) -> AppResult<WorkingCopy> {
        self.open(&copy.source, &copy.sheet)
    }

    /// Persist the working copy into the default store under its sheet name.
    pub fn save(&self, copy: &WorkingCopy) -> AppResult<()> {
        self.save_table(&copy.sheet, &copy.table)
    }

    fn save_table(&self, sheet: &str, table: &Table) -> AppResult<()> {
        match self.store.replace_table(sheet, table) {
            Ok(()) => {
                info!(target: "canopy::edit", "saved '{}' to {} rows={}", sheet, self.store.describe(), table.height());
                Ok(())
            }
            Err(e) => {
                warn!(target: "canopy::edit", "save of '{}' to {} failed: {}", sheet, self.store.describe(), e);
                Err(AppError::from_save(e))
            }
        }
    }

    /// Replace the table behind a registered qualified name with `table`.
    pub fn apply_edit(&self, registry: &TableRegistry, qualified: &str, table: &Table) -> AppResult<()> {
        let entry = registry
            .get(qualified)
            .ok_or_else(|| AppError::table_not_found("table_not_found".to_string(), format!("'{}' is not a loaded table", qualified)))?;
        self.save_table(&entry.sheet, table)
    }

    /// Add an empty sheet with a single `ID` column to the default store.
    pub fn create_table(&self, name: &str) -> AppResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::user("invalid_table_name".to_string(), "table name must not be empty".to_string()));
        }
        self.store.create_empty_table(name, NEW_TABLE_COLUMNS).map_err(AppError::from_save)?;
        info!(target: "canopy::edit", "created table '{}' in {}", name, self.store.describe());
        Ok(())
    }
}

#[cfg(test)]
#[path = "edit_tests.rs"]
mod edit_tests;
