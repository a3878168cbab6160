//!
//! canopy table registry
//! ---------------------
//! Collects the tables of every loaded source under a qualified name
//! `<source>_<sheet>` and resolves logical names across sources.
//!
//! Precedence: the default store is tier 0, uploads follow in upload order
//! (tier 1, 2, ...). A logical name matches an entry whose qualified name equals
//! it or ends with `_<logical>`. Among matches the lowest tier wins; within one
//! tier an entry whose sheet is named exactly `<logical>` beats a suffix match,
//! and after that the first registered wins. Registering an identical qualified
//! name again replaces the earlier table (last loaded wins).

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::storage::{source_id_from_file_name, TableStore, Workbook};
use crate::table::Table;

/// Source identifier of the default persistent store.
pub const DEFAULT_SOURCE_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub id: String,
    pub precedence: usize,
}

impl SourceRef {
    pub fn default_store() -> Self { Self { id: DEFAULT_SOURCE_ID.to_string(), precedence: 0 } }

    /// The `n`-th upload (0-based), named by its file stem.
    pub fn upload(file_name: &str, n: usize) -> Self {
        Self { id: source_id_from_file_name(file_name), precedence: n + 1 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredTable {
    pub qualified: String,
    pub source_id: String,
    pub sheet: String,
    pub precedence: usize,
    seq: usize,
    pub table: Table,
}

#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    entries: Vec<RegisteredTable>,
    next_seq: usize,
}

pub fn qualified_name(source_id: &str, sheet: &str) -> String { format!("{}_{}", source_id, sheet) }

impl TableRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn register(&mut self, source: &SourceRef, sheet: &str, table: Table) {
        let qualified = qualified_name(&source.id, sheet);
        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = RegisteredTable {
            qualified: qualified.clone(),
            source_id: source.id.clone(),
            sheet: sheet.to_string(),
            precedence: source.precedence,
            seq,
            table,
        };
        match self.entries.iter_mut().find(|e| e.qualified == qualified) {
            Some(existing) => {
                debug!(target: "canopy::registry", "register: '{}' replaced (last loaded wins)", qualified);
                *existing = entry;
            }
            None => {
                debug!(target: "canopy::registry", "register: '{}' rows={} cols={}", qualified, entry.table.height(), entry.table.width());
                self.entries.push(entry);
            }
        }
    }

    /// Winning entry for a logical name, if any.
    pub fn resolve_entry(&self, logical: &str) -> Option<&RegisteredTable> {
        let suffix = format!("_{}", logical);
        self.entries
            .iter()
            .filter(|e| e.qualified == logical || e.qualified.ends_with(&suffix))
            .min_by_key(|e| (e.precedence, e.sheet != logical, e.seq))
    }

    pub fn resolve(&self, logical: &str) -> AppResult<&Table> {
        self.resolve_entry(logical)
            .map(|e| &e.table)
            .ok_or_else(|| AppError::table_not_found("table_not_found".to_string(), format!("no loaded source has a table named '{}'", logical)))
    }

    /// Lookup by exact qualified name.
    pub fn get(&self, qualified: &str) -> Option<&RegisteredTable> {
        self.entries.iter().find(|e| e.qualified == qualified)
    }

    /// Every entry in registration order.
    pub fn list_all(&self) -> impl Iterator<Item = &RegisteredTable> + '_ { self.entries.iter() }
}

/// Bytes of a user-supplied workbook plus the file name it was uploaded as.
#[derive(Debug, Clone)]
pub struct UploadedSource {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedSource {
    pub fn new<S: Into<String>>(file_name: S, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), bytes }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default().to_string();
        Ok(Self { file_name, bytes })
    }
}

/// Load the default store and every upload. A source that fails is left out of
/// the registry and reported in the returned error list; the rest still load.
pub fn load_sources(default_store: &dyn TableStore, uploads: &[UploadedSource]) -> (TableRegistry, Vec<AppError>) {
    let mut registry = TableRegistry::new();
    let mut errors = Vec::new();

    if default_store.exists() {
        match default_store.read_all_tables() {
            Ok(tables) => {
                let src = SourceRef::default_store();
                for (sheet, table) in tables { registry.register(&src, &sheet, table); }
            }
            Err(e) => {
                warn!(target: "canopy::registry", "default store '{}' failed to load: {}", default_store.describe(), e);
                errors.push(AppError::source_load("source_load_failed".to_string(), format!("{}: {}", default_store.describe(), e)));
            }
        }
    } else {
        debug!(target: "canopy::registry", "default store '{}' not present yet", default_store.describe());
    }

    for (n, upload) in uploads.iter().enumerate() {
        match Workbook::parse(&upload.bytes, Path::new(&upload.file_name)) {
            Ok(wb) => {
                let src = SourceRef::upload(&upload.file_name, n);
                for (sheet, table) in wb.tables() { registry.register(&src, &sheet, table); }
            }
            Err(e) => {
                warn!(target: "canopy::registry", "upload '{}' failed to load: {}", upload.file_name, e);
                errors.push(AppError::source_load("source_load_failed".to_string(), format!("{}: {}", upload.file_name, e)));
            }
        }
    }

    info!(target: "canopy::registry", "loaded {} tables from {} uploads; {} source errors", registry.len(), uploads.len(), errors.len());
    (registry, errors)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
