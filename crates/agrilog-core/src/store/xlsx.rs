use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};
use rust_xlsxwriter::Workbook;

use crate::error::AgrilogError;
use crate::sheet::Sheet;
use crate::store::RecordStore;

/// Workbook-backed record store.
///
/// The whole workbook is read into memory on open (reads after that are
/// cache hits, matching the one-snapshot-per-request model) and rewritten in
/// full on `write_rows`, since the xlsx reader is read-only.
#[derive(Debug)]
pub struct XlsxStore {
    path: PathBuf,
    order: Vec<String>,
    sheets: BTreeMap<String, Sheet>,
}

impl XlsxStore {
    pub fn open(path: &Path) -> Result<XlsxStore, AgrilogError> {
        let mut workbook: Xlsx<_> =
            open_workbook(path).map_err(|e| AgrilogError::StoreUnavailable {
                reason: format!("cannot open workbook {}: {e}", path.display()),
            })?;

        let order = workbook.sheet_names().to_owned();
        let mut sheets = BTreeMap::new();
        for name in &order {
            let range = workbook
                .worksheet_range(name)
                .map_err(|e| AgrilogError::StoreUnavailable {
                    reason: format!("cannot read sheet '{name}': {e}"),
                })?;

            let mut rows_iter = range.rows();
            let headers: Vec<String> = match rows_iter.next() {
                Some(header_row) => header_row.iter().map(cell_as_string).collect(),
                None => Vec::new(),
            };
            let rows: Vec<Vec<String>> = rows_iter
                .map(|row| row.iter().map(cell_as_string).collect())
                .collect();

            sheets.insert(name.clone(), Sheet { headers, rows });
        }

        Ok(XlsxStore {
            path: path.to_path_buf(),
            order,
            sheets,
        })
    }

    /// Rewrite the workbook from the in-memory sheets, preserving sheet order.
    fn save(&self) -> Result<(), AgrilogError> {
        let mut workbook = Workbook::new();
        for name in &self.order {
            let Some(sheet) = self.sheets.get(name) else {
                continue;
            };
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(name)
                .map_err(|e| write_error(name, e))?;
            for (col, header) in sheet.headers.iter().enumerate() {
                worksheet
                    .write_string(0, col as u16, header)
                    .map_err(|e| write_error(name, e))?;
            }
            for (row_idx, row) in sheet.rows.iter().enumerate() {
                for (col, cell) in row.iter().enumerate() {
                    if cell.is_empty() {
                        continue;
                    }
                    worksheet
                        .write_string(row_idx as u32 + 1, col as u16, cell)
                        .map_err(|e| write_error(name, e))?;
                }
            }
        }
        workbook
            .save(&self.path)
            .map_err(|e| AgrilogError::StoreUnavailable {
                reason: format!("cannot save workbook {}: {e}", self.path.display()),
            })
    }
}

fn write_error(sheet: &str, e: rust_xlsxwriter::XlsxError) -> AgrilogError {
    AgrilogError::SheetWrite {
        sheet: sheet.to_string(),
        reason: e.to_string(),
    }
}

impl RecordStore for XlsxStore {
    fn read_rows(&self, sheet: &str) -> Result<Sheet, AgrilogError> {
        Ok(self.sheets.get(sheet).cloned().unwrap_or_default())
    }

    fn write_rows(&mut self, sheet: &str, data: &Sheet) -> Result<(), AgrilogError> {
        if !self.sheets.contains_key(sheet) {
            self.order.push(sheet.to_string());
        }
        self.sheets.insert(sheet.to_string(), data.clone());
        self.save()
    }
}

/// Stringify a workbook cell. Date cells render ISO so that
/// `parse_date_loose` picks them up unchanged.
fn cell_as_string(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::String(s) => s.trim().to_string(),
        calamine::Data::Float(f) => f.to_string(),
        calamine::Data::Int(i) => i.to_string(),
        calamine::Data::Bool(b) => b.to_string(),
        calamine::Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if ts.time() == chrono::NaiveTime::MIN => ts.format("%Y-%m-%d").to_string(),
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => String::new(),
        },
        calamine::Data::Empty => String::new(),
        _ => format!("{cell}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SHEET_JOURNAL;

    #[test]
    fn missing_workbook_is_store_unavailable() {
        let err = XlsxStore::open(Path::new("/nonexistent/master.xlsx")).unwrap_err();
        assert!(matches!(err, AgrilogError::StoreUnavailable { .. }));
    }

    #[test]
    fn round_trip_preserves_a_status_edit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_JOURNAL).unwrap();
        worksheet.write_string(0, 0, "ID_Parcelle").unwrap();
        worksheet.write_string(0, 1, "Statut").unwrap();
        worksheet.write_string(1, 0, "A2_Buissons").unwrap();
        worksheet.write_string(1, 1, "Prévu").unwrap();
        workbook.save(&path).unwrap();

        let mut store = XlsxStore::open(&path).unwrap();
        let mut sheet = store.read_rows(SHEET_JOURNAL).unwrap();
        assert_eq!(sheet.rows[0][1], "Prévu");

        sheet.set_cell(0, 1, "Réalisé");
        store.write_rows(SHEET_JOURNAL, &sheet).unwrap();

        let reopened = XlsxStore::open(&path).unwrap();
        let sheet = reopened.read_rows(SHEET_JOURNAL).unwrap();
        assert_eq!(sheet.rows[0][1], "Réalisé");
    }

    #[test]
    fn unknown_sheet_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.xlsx");
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("AUTRE").unwrap();
        workbook.save(&path).unwrap();

        let store = XlsxStore::open(&path).unwrap();
        assert!(store.read_rows(SHEET_JOURNAL).unwrap().is_empty());
    }
}
