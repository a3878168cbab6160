//!
//! canopy storage module
//! ----------------------
//! This module implements the table store used by canopy: a named collection of
//! tables held in one container. The default container is a single JSON workbook
//! file (`data/db.json` unless configured otherwise) holding one sheet per table,
//! in a significant order.
//!
//! Key responsibilities:
//! - Listing and reading named tables.
//! - Replacing exactly one named table while leaving every sibling sheet (content
//!   and position) untouched.
//! - Creating a new empty table, failing if the name is taken.
//! - Creating the container on first write when it does not exist yet.
//!
//! Writes are whole-container read-modify-write followed by an atomic rename, so a
//! crash never leaves a half-written file. Two processes saving different tables to
//! the same file concurrently race at file level (last writer wins); no locking is
//! attempted here.

use crate::error::StoreError;
use crate::table::Table;

mod io;
mod memory;
mod paths;
mod workbook;

pub use io::WorkbookFile;
pub use memory::MemoryStore;
pub use paths::{export_file_name, source_id_from_file_name, WORKBOOK_EXT};
pub use workbook::{Sheet, Workbook};

/// Capability contract every table container implements.
pub trait TableStore {
    /// Human readable location, used in logs and error messages.
    fn describe(&self) -> String;

    /// Whether the container exists yet. A missing container reads as empty.
    fn exists(&self) -> bool;

    /// All tables in container order.
    fn read_all_tables(&self) -> Result<Vec<(String, Table)>, StoreError>;

    /// Replace (or append) one named table. Creates the container if needed.
    fn replace_table(&self, name: &str, table: &Table) -> Result<(), StoreError>;

    /// Append a new table with the given header and no rows.
    fn create_empty_table(&self, name: &str, columns: &[&str]) -> Result<(), StoreError>;

    fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read_all_tables()?.into_iter().map(|(n, _)| n).collect())
    }

    fn read_table(&self, name: &str) -> Result<Table, StoreError> {
        self.read_all_tables()?
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| StoreError::NotFound { table: name.to_string() })
    }
}
