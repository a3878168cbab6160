use std::cell::RefCell;

use super::{TableStore, Workbook};
use crate::error::StoreError;
use crate::table::Table;

/// In-memory workbook store. Starts "absent" until the first write, like a file
/// that has not been created yet.
#[derive(Debug, Default)]
pub struct MemoryStore {
    label: String,
    workbook: RefCell<Option<Workbook>>,
}

impl MemoryStore {
    pub fn new(label: &str) -> Self {
        Self { label: label.to_string(), workbook: RefCell::new(None) }
    }

    pub fn with_workbook(label: &str, wb: Workbook) -> Self {
        Self { label: label.to_string(), workbook: RefCell::new(Some(wb)) }
    }

    /// Snapshot of the current contents, if any write happened.
    pub fn workbook(&self) -> Option<Workbook> { self.workbook.borrow().clone() }
}

impl TableStore for MemoryStore {
    fn describe(&self) -> String { format!("memory:{}", self.label) }

    fn exists(&self) -> bool { self.workbook.borrow().is_some() }

    fn read_all_tables(&self) -> Result<Vec<(String, Table)>, StoreError> {
        Ok(self.workbook.borrow().as_ref().map(|wb| wb.tables()).unwrap_or_default())
    }

    fn replace_table(&self, name: &str, table: &Table) -> Result<(), StoreError> {
        let mut slot = self.workbook.borrow_mut();
        slot.get_or_insert_with(Workbook::default).replace_sheet(name, table);
        Ok(())
    }

    fn create_empty_table(&self, name: &str, columns: &[&str]) -> Result<(), StoreError> {
        let mut slot = self.workbook.borrow_mut();
        let mut wb = slot.clone().unwrap_or_default();
        wb.add_sheet(name, &Table::new(columns.iter().copied()))?;
        *slot = Some(wb);
        Ok(())
    }
}
