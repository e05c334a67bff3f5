use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::AgrilogError;
use crate::model::{InterventionNature, InterventionRecord, NpkPerHa, ParcelInfo};
use crate::sheet::{RowView, Sheet};
use crate::store::{RecordStore, SHEET_CROPS, SHEET_JOURNAL, SHEET_PARCELS};

/// Candidate names for the status column, tried in order. The workbook
/// schema has drifted over the seasons and all three spellings exist in the
/// wild.
pub const STATUS_COLUMNS: [&str; 3] = ["Statut", "Statut_Intervention", "Etat"];

/// A status counts as "planned" when it starts with one of these
/// (case-insensitive): matches "Prévu", "Prévue", "Planifié", ...
const PLANNED_PREFIXES: [&str; 2] = ["prévu", "planifi"];

pub fn is_planned(status: &str) -> bool {
    let lower = status.trim().to_lowercase();
    PLANNED_PREFIXES.iter().any(|p| lower.starts_with(p))
}

pub fn status_column(sheet: &Sheet) -> Option<usize> {
    sheet.first_column(&STATUS_COLUMNS)
}

/// Surfaces above 50 ha are scale slips from manual entry ("209" meaning
/// 2.09 ha); no parcel on the farm is anywhere near that size.
pub fn patch_surface(surface: Decimal) -> Decimal {
    if surface > Decimal::from(50) {
        surface / Decimal::from(100)
    } else {
        surface
    }
}

/// Decode one journal row. Absent columns become empty/zero fields.
pub fn decode_record(row: RowView<'_>) -> InterventionRecord {
    let nature_raw = row.text("Nature_Intervention").to_string();
    InterventionRecord {
        parcel: row.text("ID_Parcelle").to_string(),
        campaign: row.integer("Campagne"),
        date: row.date("Date"),
        nature: InterventionNature::from_str_loose(&nature_raw),
        nature_raw,
        // Column resolution, not value fallback: this must read the exact
        // column `mark_realized` later writes.
        status: row.text_column(&STATUS_COLUMNS).to_string(),
        product: row.text("Nom_Produit").to_string(),
        dose: row.decimal("Dose_Ha"),
        dose_raw: row.text("Dose_Ha").to_string(),
        dose_unit: row.text("Unité_Dose").to_string(),
        surface_ha: patch_surface(row.decimal("Surface_Travaillée_Ha")),
        volume_ha: row.decimal("Volume_Bouillie_Ha"),
        culture: row.text("Culture").to_string(),
        target: row.text("Cible").to_string(),
        tool: row.text("Outil").to_string(),
        observations: row.text("Observations").to_string(),
        npk: NpkPerHa {
            n: row.decimal("N/ha"),
            p: row.decimal("P/ha"),
            k: row.decimal("K/ha"),
        },
        yield_q_ha: row
            .text_any(&["Rendement_Ha", "Quantité_Récoltée_Totale"])
            .to_string(),
        harvest_humidity: row.text("Humidité_récolte").to_string(),
        formulation: String::new(),
    }
}

pub fn decode_journal(sheet: &Sheet) -> Vec<InterventionRecord> {
    sheet.iter_rows().map(decode_record).collect()
}

/// Load the intervention journal, optionally filtered to one campaign.
pub fn interventions(
    store: &dyn RecordStore,
    campaign: Option<i32>,
) -> Result<Vec<InterventionRecord>, AgrilogError> {
    let sheet = store.read_rows(SHEET_JOURNAL)?;
    let mut records = decode_journal(&sheet);
    if let Some(year) = campaign {
        records.retain(|r| r.campaign == year);
    }
    Ok(records)
}

/// Distinct campaign years present in the journal, newest first.
pub fn campaigns(store: &dyn RecordStore) -> Result<Vec<i32>, AgrilogError> {
    let records = interventions(store, None)?;
    let mut years: Vec<i32> = records.iter().map(|r| r.campaign).filter(|y| *y > 0).collect();
    years.sort_unstable();
    years.dedup();
    years.reverse();
    Ok(years)
}

/// Treatment rows still marked as planned, in journal order.
pub fn planned_treatments(records: &[InterventionRecord]) -> Vec<InterventionRecord> {
    records
        .iter()
        .filter(|r| r.nature == InterventionNature::Traitement && is_planned(&r.status))
        .cloned()
        .collect()
}

/// Parcel metadata for a campaign: the crop-assignment sheet joined with the
/// static parcel reference. Missing reference rows yield defaults.
pub fn parcel_info(
    store: &dyn RecordStore,
    campaign: i32,
) -> Result<BTreeMap<String, ParcelInfo>, AgrilogError> {
    let crops = store.read_rows(SHEET_CROPS)?;
    let parcels = store.read_rows(SHEET_PARCELS)?;

    let mut reference: BTreeMap<String, RowView<'_>> = BTreeMap::new();
    for row in parcels.iter_rows() {
        let id = row.text("ID_Parcelle");
        if !id.is_empty() {
            reference.insert(id.to_string(), row);
        }
    }

    let mut info = BTreeMap::new();
    for row in crops.iter_rows() {
        if row.integer("Campagne") != campaign {
            continue;
        }
        let parcel = row.text("ID_Parcelle");
        if parcel.is_empty() {
            continue;
        }
        let reference_row = reference.get(parcel);
        let surface = reference_row
            .map(|r| r.decimal("Surface_Référence_Ha"))
            .unwrap_or_default();
        info.insert(
            parcel.to_string(),
            ParcelInfo {
                parcel: parcel.to_string(),
                culture: row.text("Culture").to_string(),
                variety: row.text_any(&["Variété", "Variete"]).to_string(),
                surface_ha: patch_surface(surface),
                pac_islet: reference_row
                    .map(|r| r.text_any(&["Îlot PAC", "Ilot_PAC", "Ilot PAC"]).to_string())
                    .unwrap_or_default(),
                previous_crop: row
                    .text_any(&["Precedent_Cultural", "Précédent_Cultural"])
                    .to_string(),
                needs: NpkPerHa {
                    n: row.decimal("Besoin_N"),
                    p: row.decimal("Besoin_P"),
                    k: row.decimal("Besoin_K"),
                },
            },
        );
    }
    Ok(info)
}
