use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One tabular sheet from the record store: a header row plus data rows of
/// string cells.
///
/// No column is guaranteed present in the external workbook, so all access
/// goes through loose lookups: header names are matched case-insensitively
/// and whitespace-trimmed, and a missing cell reads as an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn with_headers(headers: &[&str]) -> Sheet {
        Sheet {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, cells: &[&str]) {
        self.rows.push(cells.iter().map(|c| c.to_string()).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column whose header equals `name` (case-insensitive, trimmed).
    pub fn column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
    }

    /// Index of the first column whose header contains `fragment` (case-insensitive).
    pub fn column_containing(&self, fragment: &str) -> Option<usize> {
        let wanted = fragment.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase().contains(&wanted))
    }

    /// First match from an ordered list of candidate header names.
    ///
    /// External column names are a loosely-versioned contract; callers pass
    /// the known historical spellings in preference order.
    pub fn first_column(&self, candidates: &[&str]) -> Option<usize> {
        candidates.iter().find_map(|name| self.column(name))
    }

    pub fn row(&self, idx: usize) -> Option<RowView<'_>> {
        self.rows.get(idx).map(|cells| RowView { sheet: self, cells })
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |cells| RowView { sheet: self, cells })
    }

    /// Overwrite one cell, growing the row with empty cells if it is ragged.
    pub fn set_cell(&mut self, row: usize, col: usize, value: &str) {
        if let Some(cells) = self.rows.get_mut(row) {
            if cells.len() <= col {
                cells.resize(col + 1, String::new());
            }
            cells[col] = value.to_string();
        }
    }
}

/// Read-only view over one data row with defaulting accessors.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    sheet: &'a Sheet,
    cells: &'a [String],
}

impl<'a> RowView<'a> {
    pub fn cell(&self, col: usize) -> &'a str {
        self.cells.get(col).map(|s| s.trim()).unwrap_or("")
    }

    /// Cell under the named column, or "" when the column or cell is absent.
    pub fn text(&self, name: &str) -> &'a str {
        match self.sheet.column(name) {
            Some(col) => self.cell(col),
            None => "",
        }
    }

    /// Cell under the first candidate column that is present, even when that
    /// cell is empty. Column resolution, not value fallback: readers and
    /// writers of the same field must agree on one column.
    pub fn text_column(&self, candidates: &[&str]) -> &'a str {
        match self.sheet.first_column(candidates) {
            Some(col) => self.cell(col),
            None => "",
        }
    }

    /// First non-empty cell among an ordered list of candidate columns.
    pub fn text_any(&self, candidates: &[&str]) -> &'a str {
        for name in candidates {
            let value = self.text(name);
            if !value.is_empty() {
                return value;
            }
        }
        ""
    }

    /// Numeric cell, tolerating French decimal commas and grouping spaces.
    /// Missing or malformed values read as zero.
    pub fn decimal(&self, name: &str) -> Decimal {
        parse_decimal_loose(self.text(name)).unwrap_or_default()
    }

    /// Integer cell (year numbers and the like); zero when absent.
    pub fn integer(&self, name: &str) -> i32 {
        parse_integer_loose(self.text(name)).unwrap_or(0)
    }

    /// Calendar date cell; `None` when absent or unparseable.
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        parse_date_loose(self.text(name))
    }
}

/// Parse a decimal from spreadsheet text: trims, drops grouping spaces and
/// swaps a decimal comma for a point ("2 090,5" -> 2090.5).
pub fn parse_decimal_loose(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

/// Parse an integer, accepting the "2024.0" rendering of float cells.
pub fn parse_integer_loose(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i32>() {
        return Some(n);
    }
    let head = trimmed.split('.').next().unwrap_or("");
    head.parse::<i32>().ok()
}

/// Parse a calendar date from the formats seen in the workbook: ISO dates,
/// ISO datetimes (from xlsx date cells) and French day-first dates.
pub fn parse_date_loose(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
    for fmt in FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d);
        }
    }
    // Datetime cells render as "2024-04-15 00:00:00" or with a 'T' separator
    if let Some(head) = trimmed.get(..10) {
        for fmt in FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(head, fmt) {
                return Some(d);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sheet() -> Sheet {
        let mut s = Sheet::with_headers(&["ID_Parcelle", " Campagne ", "Dose_Ha", "Date"]);
        s.push_row(&["A2_Buissons", "2024.0", "1,5", "2024-04-15"]);
        s.push_row(&["Les Vignes", "2025", "", "15/04/2024"]);
        s
    }

    #[test]
    fn column_lookup_is_case_insensitive_and_trimmed() {
        let s = sheet();
        assert_eq!(s.column("id_parcelle"), Some(0));
        assert_eq!(s.column("CAMPAGNE"), Some(1));
        assert_eq!(s.column("absent"), None);
    }

    #[test]
    fn column_containing_finds_partial_header() {
        let s = sheet();
        assert_eq!(s.column_containing("dose"), Some(2));
    }

    #[test]
    fn first_column_respects_candidate_order() {
        let s = sheet();
        assert_eq!(s.first_column(&["Statut", "Etat", "Campagne"]), Some(1));
        assert_eq!(s.first_column(&["Statut", "Etat"]), None);
    }

    #[test]
    fn text_column_sticks_to_the_first_present_column() {
        let mut s = Sheet::with_headers(&["Statut", "Etat"]);
        s.push_row(&["", "Prévu"]);
        let row = s.row(0).unwrap();
        // the primary column exists, so its empty cell wins over the alternate
        assert_eq!(row.text_column(&["Statut", "Etat"]), "");
        assert_eq!(row.text_any(&["Statut", "Etat"]), "Prévu");
        assert_eq!(row.text_column(&["Absent", "Etat"]), "Prévu");
    }

    #[test]
    fn missing_cells_read_as_defaults() {
        let s = sheet();
        let row = s.row(1).unwrap();
        assert_eq!(row.text("Dose_Ha"), "");
        assert_eq!(row.decimal("Dose_Ha"), Decimal::ZERO);
        assert_eq!(row.text("absent"), "");
        assert_eq!(row.integer("absent"), 0);
    }

    #[test]
    fn decimal_accepts_french_comma() {
        let s = sheet();
        assert_eq!(s.row(0).unwrap().decimal("Dose_Ha"), dec!(1.5));
        assert_eq!(parse_decimal_loose("2 090,5"), Some(dec!(2090.5)));
    }

    #[test]
    fn integer_accepts_float_rendering() {
        let s = sheet();
        assert_eq!(s.row(0).unwrap().integer("Campagne"), 2024);
        assert_eq!(s.row(1).unwrap().integer("Campagne"), 2025);
    }

    #[test]
    fn date_accepts_iso_datetime_and_french() {
        assert_eq!(
            parse_date_loose("2024-04-15 00:00:00"),
            NaiveDate::from_ymd_opt(2024, 4, 15)
        );
        assert_eq!(
            parse_date_loose("15/04/2024"),
            NaiveDate::from_ymd_opt(2024, 4, 15)
        );
        assert_eq!(parse_date_loose("bientôt"), None);
        assert_eq!(parse_date_loose(""), None);
    }

    #[test]
    fn set_cell_grows_ragged_rows() {
        let mut s = Sheet::with_headers(&["A", "B", "C"]);
        s.rows.push(vec!["x".into()]);
        s.set_cell(0, 2, "z");
        assert_eq!(s.row(0).unwrap().cell(2), "z");
        assert_eq!(s.row(0).unwrap().cell(1), "");
    }
}
