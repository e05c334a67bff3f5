use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AgrilogError;
use crate::journal::{self, is_planned};
use crate::model::InterventionNature;
use crate::sheet::parse_date_loose;
use crate::store::{RecordStore, SHEET_JOURNAL};

/// Status written when a planned treatment is confirmed done.
pub const REALIZED_STATUS: &str = "Réalisé";

/// Opaque handle embedded in a preparation sheet (as a scannable code) and
/// parsed back when the operator confirms the spray.
///
/// Wire format: `{parcel}_{YYYYMMDD}`, with multiple parcels pipe-joined
/// (`P1|P2_{YYYYMMDD}`). Parcel identifiers may themselves contain
/// underscores, so parsing splits on the LAST underscore only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupId {
    pub parcels: Vec<String>,
    /// Compact `YYYYMMDD` date, compared as a string against re-formatted
    /// record dates (guards against format drift in the journal).
    pub date_compact: String,
}

impl GroupId {
    pub fn new(parcels: &[String], date: chrono::NaiveDate) -> GroupId {
        GroupId {
            parcels: parcels.to_vec(),
            date_compact: date.format("%Y%m%d").to_string(),
        }
    }

    pub fn parse(raw: &str) -> Result<GroupId, AgrilogError> {
        let invalid = || AgrilogError::InvalidGroupId {
            raw: raw.to_string(),
        };
        let (parcel_part, date_part) = raw.rsplit_once('_').ok_or_else(invalid)?;
        if parcel_part.is_empty()
            || date_part.len() != 8
            || !date_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        Ok(GroupId {
            parcels: parcel_part.split('|').map(|p| p.to_string()).collect(),
            date_compact: date_part.to_string(),
        })
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.parcels.join("|"), self.date_compact)
    }
}

/// Flip every still-planned treatment row matching `group_id` to
/// `target_status` and persist the journal.
///
/// Returns false without writing when nothing matches: the group was already
/// realized, or the id does not correspond to current journal content. That
/// is an informational outcome, not an error.
pub fn mark_realized(
    store: &mut dyn RecordStore,
    group_id: &GroupId,
    target_status: &str,
) -> Result<bool, AgrilogError> {
    let mut sheet = store.read_rows(SHEET_JOURNAL)?;

    let (Some(status_col), Some(parcel_col), Some(date_col), Some(nature_col)) = (
        journal::status_column(&sheet),
        sheet.column("ID_Parcelle"),
        sheet.column("Date"),
        sheet.column("Nature_Intervention"),
    ) else {
        debug!(group = %group_id, "journal sheet lacks the columns needed for a status update");
        return Ok(false);
    };

    let selected: Vec<usize> = sheet
        .iter_rows()
        .enumerate()
        .filter(|(_, row)| {
            let parcel = row.cell(parcel_col);
            if !group_id.parcels.iter().any(|p| p == parcel) {
                return false;
            }
            let formatted = match parse_date_loose(row.cell(date_col)) {
                Some(d) => d.format("%Y%m%d").to_string(),
                None => return false,
            };
            formatted == group_id.date_compact
                && InterventionNature::from_str_loose(row.cell(nature_col))
                    == InterventionNature::Traitement
                && is_planned(row.cell(status_col))
        })
        .map(|(idx, _)| idx)
        .collect();

    if selected.is_empty() {
        return Ok(false);
    }

    for idx in &selected {
        sheet.set_cell(*idx, status_col, target_status);
    }
    store.write_rows(SHEET_JOURNAL, &sheet)?;
    debug!(group = %group_id, rows = selected.len(), "marked treatment rows as realized");
    Ok(true)
}
