use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::table::{Cell, Table};

/// On-disk sheet: name, header and rows of untagged cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn from_table(name: &str, table: &Table) -> Self {
        Self { name: name.to_string(), columns: table.columns().to_vec(), rows: table.rows().to_vec() }
    }

    pub fn to_table(&self) -> Table {
        Table::from_rows(self.columns.clone(), self.rows.clone())
    }
}

/// A multi-sheet container; sheet order is preserved across rewrites.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Parse and validate workbook bytes. `origin` only labels errors.
    pub fn parse(bytes: &[u8], origin: &Path) -> Result<Self, StoreError> {
        let wb: Workbook = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::Format { path: origin.to_path_buf(), message: e.to_string() })?;
        let mut seen: HashSet<&str> = HashSet::new();
        for s in &wb.sheets {
            if s.name.trim().is_empty() {
                return Err(StoreError::Format { path: origin.to_path_buf(), message: "sheet with empty name".into() });
            }
            if !seen.insert(s.name.as_str()) {
                return Err(StoreError::Format { path: origin.to_path_buf(), message: format!("duplicate sheet '{}'", s.name) });
            }
        }
        Ok(wb)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Single-sheet workbook, used for downloads.
    pub fn single(name: &str, table: &Table) -> Self {
        Self { sheets: vec![Sheet::from_table(name, table)] }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn tables(&self) -> Vec<(String, Table)> {
        self.sheets.iter().map(|s| (s.name.clone(), s.to_table())).collect()
    }

    /// Overwrite the sheet in place, or append it when the name is new.
    pub fn replace_sheet(&mut self, name: &str, table: &Table) {
        let sheet = Sheet::from_table(name, table);
        match self.sheets.iter_mut().find(|s| s.name == name) {
            Some(slot) => *slot = sheet,
            None => self.sheets.push(sheet),
        }
    }

    pub fn add_sheet(&mut self, name: &str, table: &Table) -> Result<(), StoreError> {
        if self.sheet(name).is_some() {
            return Err(StoreError::AlreadyExists { table: name.to_string() });
        }
        self.sheets.push(Sheet::from_table(name, table));
        Ok(())
    }
}
