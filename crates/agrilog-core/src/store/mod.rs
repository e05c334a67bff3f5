pub mod xlsx;

use crate::error::AgrilogError;
use crate::sheet::Sheet;
use std::collections::BTreeMap;

/// Sheet names in the master workbook. These are the external contract with
/// the spreadsheet; the column names inside each sheet are looser (see
/// `Sheet::first_column`).
pub const SHEET_JOURNAL: &str = "JOURNAL_INTERVENTION";
pub const SHEET_PRODUCTS: &str = "REF_INTRANTS";
pub const SHEET_PARCELS: &str = "REF_PARCELLES";
pub const SHEET_CROPS: &str = "ASSOLEMENT";
pub const SHEET_METERS: &str = "REF_COMPTEURS";
pub const SHEET_READINGS: &str = "RELEVES_COMPTEURS";

/// Tabular data source keyed by sheet name.
///
/// A missing sheet reads as empty (the workbook schema drifts); an
/// unreachable source is `StoreUnavailable` and fatal for the requested
/// operation.
pub trait RecordStore {
    fn read_rows(&self, sheet: &str) -> Result<Sheet, AgrilogError>;
    fn write_rows(&mut self, sheet: &str, data: &Sheet) -> Result<(), AgrilogError>;
}

/// In-memory store, used by tests and as the cache layer behind `XlsxStore`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sheets: BTreeMap<String, Sheet>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn insert(&mut self, name: &str, sheet: Sheet) {
        self.sheets.insert(name.to_string(), sheet);
    }
}

impl RecordStore for MemoryStore {
    fn read_rows(&self, sheet: &str) -> Result<Sheet, AgrilogError> {
        Ok(self.sheets.get(sheet).cloned().unwrap_or_default())
    }

    fn write_rows(&mut self, sheet: &str, data: &Sheet) -> Result<(), AgrilogError> {
        self.sheets.insert(sheet.to_string(), data.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sheet_reads_as_empty() {
        let store = MemoryStore::new();
        let sheet = store.read_rows(SHEET_JOURNAL).unwrap();
        assert!(sheet.is_empty());
        assert!(sheet.headers.is_empty());
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut store = MemoryStore::new();
        let mut sheet = Sheet::with_headers(&["ID_Parcelle", "Statut"]);
        sheet.push_row(&["A1", "Prévu"]);
        store.write_rows(SHEET_JOURNAL, &sheet).unwrap();
        assert_eq!(store.read_rows(SHEET_JOURNAL).unwrap(), sheet);
    }
}
