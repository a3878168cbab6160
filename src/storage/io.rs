use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::paths::parent_dir;
use super::{TableStore, Workbook};
use crate::error::StoreError;
use crate::table::Table;
use crate::tprintln;

/// Workbook container backed by one JSON file on disk.
#[derive(Debug, Clone)]
pub struct WorkbookFile {
    path: PathBuf,
}

impl WorkbookFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Read the whole workbook; a file that does not exist yet reads as `None`.
    pub fn load(&self) -> Result<Option<Workbook>, StoreError> {
        if !self.path.exists() {
            debug!(target: "canopy::store", "load: '{}' does not exist", self.path.display());
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let wb = Workbook::parse(&bytes, &self.path)?;
        debug!(target: "canopy::store", "load: '{}' sheets={:?}", self.path.display(), wb.sheet_names());
        Ok(Some(wb))
    }

    /// Write the workbook via a sibling temp file and rename over the target.
    pub fn write(&self, wb: &Workbook) -> Result<(), StoreError> {
        let __t0 = std::time::Instant::now();
        let dir = parent_dir(&self.path);
        fs::create_dir_all(&dir)?;
        let bytes = wb.to_bytes()?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        tprintln!("[STORAGE] write: '{}' bytes={} sheets={} took={:?}", self.path.display(), bytes.len(), wb.sheets.len(), __t0.elapsed());
        Ok(())
    }

    fn modify<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Workbook) -> Result<(), StoreError>,
    {
        let mut wb = self.load()?.unwrap_or_default();
        f(&mut wb)?;
        self.write(&wb)
    }
}

impl TableStore for WorkbookFile {
    fn describe(&self) -> String { self.path.display().to_string() }

    fn exists(&self) -> bool { self.path.exists() }

    fn read_all_tables(&self) -> Result<Vec<(String, Table)>, StoreError> {
        Ok(self.load()?.map(|wb| wb.tables()).unwrap_or_default())
    }

    fn replace_table(&self, name: &str, table: &Table) -> Result<(), StoreError> {
        debug!(target: "canopy::store", "replace_table: store='{}' table='{}' rows={} cols={}", self.path.display(), name, table.height(), table.width());
        self.modify(|wb| {
            wb.replace_sheet(name, table);
            Ok(())
        })
    }

    fn create_empty_table(&self, name: &str, columns: &[&str]) -> Result<(), StoreError> {
        debug!(target: "canopy::store", "create_empty_table: store='{}' table='{}' columns={:?}", self.path.display(), name, columns);
        self.modify(|wb| wb.add_sheet(name, &Table::new(columns.iter().copied())))
    }
}
