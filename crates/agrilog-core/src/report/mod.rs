pub mod render;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::AgrilogError;
use crate::formulation::{decode_formulations, rank_and_annotate};
use crate::grouping::Mix;
use crate::journal::{interventions, parcel_info};
use crate::model::{FormulationEntry, InterventionNature, InterventionRecord, NpkPerHa, ParcelInfo};
use crate::store::{RecordStore, SHEET_PRODUCTS};

/// Spray volume applied when the journal row leaves it blank, in liters
/// per hectare.
pub const DEFAULT_SPRAY_VOLUME_L_HA: Decimal = Decimal::ONE_HUNDRED;

/// Phytosanitary register: treatment rows per parcel with the parcel's
/// campaign metadata, the regulatory report.
#[derive(Debug, Clone, Serialize)]
pub struct PhytoRegister {
    pub campaign: i32,
    pub sections: Vec<ParcelSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParcelSection {
    pub info: ParcelInfo,
    pub rows: Vec<InterventionRecord>,
}

/// Fertilization balance: inputs per parcel with N/P/K per-ha totals set
/// against the crop needs.
#[derive(Debug, Clone, Serialize)]
pub struct FertiBalance {
    pub campaign: i32,
    pub sections: Vec<FertiSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FertiSection {
    pub info: ParcelInfo,
    pub rows: Vec<InterventionRecord>,
    pub inputs: NpkPerHa,
    pub needs: NpkPerHa,
}

/// Technical itinerary: everything done on a parcel over the campaign,
/// bucketed by nature in field-season order.
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalItinerary {
    pub campaign: i32,
    pub sections: Vec<ItinerarySection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItinerarySection {
    pub info: ParcelInfo,
    pub buckets: Vec<ItineraryBucket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItineraryBucket {
    pub title: String,
    pub steps: Vec<ItineraryStep>,
}

/// One display line of the itinerary. Treatment rows sharing a date are
/// merged into a single step with newline-joined product columns.
#[derive(Debug, Clone, Serialize)]
pub struct ItineraryStep {
    pub date_label: String,
    pub products: String,
    pub doses: String,
    pub units: String,
    pub targets: String,
    pub observations: String,
    pub tool: String,
    pub yield_q_ha: String,
    pub harvest_humidity: String,
}

/// Tank-preparation sheet for one mix: products in incorporation order with
/// total quantities for the worked surface.
#[derive(Debug, Clone, Serialize)]
pub struct PrepSheet {
    pub label: String,
    pub date_label: String,
    pub parcels: Vec<String>,
    pub surface_ha: Decimal,
    pub volume_l_ha: Decimal,
    pub tank_volume_l: Decimal,
    pub lines: Vec<PrepLine>,
    /// Scannable validation payload; absent for unknown-date mixes, which
    /// have no group id.
    pub qr_payload: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepLine {
    pub order: usize,
    pub product: String,
    pub formulation: String,
    pub dose: Decimal,
    pub dose_unit: String,
    pub total_qty: Decimal,
}

pub fn phyto_register(
    store: &dyn RecordStore,
    campaign: i32,
    parcel: Option<&str>,
) -> Result<PhytoRegister, AgrilogError> {
    let sections = sections_by_nature(store, campaign, parcel, InterventionNature::Traitement)?;
    Ok(PhytoRegister { campaign, sections })
}

pub fn ferti_balance(
    store: &dyn RecordStore,
    campaign: i32,
    parcel: Option<&str>,
) -> Result<FertiBalance, AgrilogError> {
    let sections = sections_by_nature(store, campaign, parcel, InterventionNature::Fertilisation)?
        .into_iter()
        .map(|section| {
            let inputs = NpkPerHa {
                n: section.rows.iter().map(|r| r.npk.n).sum(),
                p: section.rows.iter().map(|r| r.npk.p).sum(),
                k: section.rows.iter().map(|r| r.npk.k).sum(),
            };
            FertiSection {
                inputs,
                needs: section.info.needs,
                info: section.info,
                rows: section.rows,
            }
        })
        .collect();
    Ok(FertiBalance { campaign, sections })
}

pub fn technical_itinerary(
    store: &dyn RecordStore,
    campaign: i32,
    parcel: Option<&str>,
) -> Result<TechnicalItinerary, AgrilogError> {
    let mut sections = Vec::new();
    for (info, rows) in parcel_rows(store, campaign, parcel)? {
        let buckets = [
            InterventionNature::TravailDuSol,
            InterventionNature::Semis,
            InterventionNature::Fertilisation,
            InterventionNature::Traitement,
            InterventionNature::Recolte,
        ]
        .into_iter()
        .map(|nature| {
            let mut of_nature: Vec<&InterventionRecord> =
                rows.iter().filter(|r| r.nature == nature).collect();
            of_nature.sort_by_key(|r| r.date);
            let steps = if nature == InterventionNature::Traitement {
                merge_treatments_by_date(&of_nature)
            } else {
                of_nature.iter().copied().map(single_step).collect()
            };
            ItineraryBucket {
                title: nature.to_string(),
                steps,
            }
        })
        .filter(|bucket| !bucket.steps.is_empty())
        .collect();
        sections.push(ItinerarySection { info, buckets });
    }
    Ok(TechnicalItinerary { campaign, sections })
}

/// Build the preparation sheet for one mix. Products are resolved against
/// the input reference and ordered by formulation rank; quantities are dose
/// times the mix surface.
pub fn prep_sheet(
    store: &dyn RecordStore,
    mix: &Mix,
    volume_override: Option<Decimal>,
) -> Result<PrepSheet, AgrilogError> {
    let reference = decode_formulations(&store.read_rows(SHEET_PRODUCTS)?);
    Ok(prep_sheet_with_reference(mix, &reference, volume_override))
}

pub fn prep_sheet_with_reference(
    mix: &Mix,
    reference: &[FormulationEntry],
    volume_override: Option<Decimal>,
) -> PrepSheet {
    let ordered = rank_and_annotate(mix.records.clone(), reference);
    let volume_l_ha = volume_override.unwrap_or(mix.volume_ha);
    let volume_l_ha = if volume_l_ha > Decimal::ZERO {
        volume_l_ha
    } else {
        DEFAULT_SPRAY_VOLUME_L_HA
    };
    let lines = ordered
        .iter()
        .enumerate()
        .map(|(idx, record)| PrepLine {
            order: idx + 1,
            product: record.product.clone(),
            formulation: record.formulation.clone(),
            dose: record.dose,
            dose_unit: record.dose_unit.clone(),
            total_qty: record.dose * mix.surface_ha,
        })
        .collect();
    PrepSheet {
        label: mix.label.clone(),
        date_label: mix.date_label.clone(),
        parcels: mix.parcels.clone(),
        surface_ha: mix.surface_ha,
        volume_l_ha,
        tank_volume_l: mix.surface_ha * volume_l_ha,
        lines,
        qr_payload: mix
            .group_id
            .as_ref()
            .map(|id| format!("agrilog://valider?groupe={id}")),
    }
}

/// Output file stem for a per-parcel report, safe for any filesystem:
/// spaces become underscores and slashes become dashes.
pub fn report_stem(prefix: &str, campaign: i32, parcel: &str) -> String {
    let safe: String = parcel
        .chars()
        .map(|c| match c {
            ' ' => '_',
            '/' => '-',
            other => other,
        })
        .collect();
    format!("{prefix}_{campaign}_{safe}")
}

fn parcel_rows(
    store: &dyn RecordStore,
    campaign: i32,
    parcel: Option<&str>,
) -> Result<Vec<(ParcelInfo, Vec<InterventionRecord>)>, AgrilogError> {
    let records = interventions(store, Some(campaign))?;
    let mut metadata = parcel_info(store, campaign)?;

    let mut grouped: BTreeMap<String, Vec<InterventionRecord>> = BTreeMap::new();
    for record in records {
        if record.parcel.is_empty() {
            continue;
        }
        if let Some(wanted) = parcel {
            if record.parcel != wanted {
                continue;
            }
        }
        grouped.entry(record.parcel.clone()).or_default().push(record);
    }

    Ok(grouped
        .into_iter()
        .map(|(id, rows)| {
            let info = metadata.remove(&id).unwrap_or_else(|| ParcelInfo {
                parcel: id,
                ..Default::default()
            });
            (info, rows)
        })
        .collect())
}

fn sections_by_nature(
    store: &dyn RecordStore,
    campaign: i32,
    parcel: Option<&str>,
    nature: InterventionNature,
) -> Result<Vec<ParcelSection>, AgrilogError> {
    let mut sections = Vec::new();
    for (info, rows) in parcel_rows(store, campaign, parcel)? {
        let mut rows: Vec<InterventionRecord> =
            rows.into_iter().filter(|r| r.nature == nature).collect();
        if rows.is_empty() {
            continue;
        }
        rows.sort_by_key(|r| r.date);
        sections.push(ParcelSection { info, rows });
    }
    Ok(sections)
}

fn single_step(record: &InterventionRecord) -> ItineraryStep {
    ItineraryStep {
        date_label: crate::grouping::date_label(record.date),
        products: record.product.clone(),
        doses: record.dose_raw.clone(),
        units: record.dose_unit.clone(),
        targets: record.target.clone(),
        observations: record.observations.clone(),
        tool: if record.tool.is_empty() {
            record.product.clone()
        } else {
            record.tool.clone()
        },
        yield_q_ha: record.yield_q_ha.clone(),
        harvest_humidity: record.harvest_humidity.clone(),
    }
}

/// Treatment rows applied on the same date are one field pass: collapse
/// them into one step, products vertically stacked, targets and
/// observations de-duplicated.
fn merge_treatments_by_date(rows: &[&InterventionRecord]) -> Vec<ItineraryStep> {
    let mut groups: Vec<(String, Vec<&InterventionRecord>)> = Vec::new();
    for &row in rows {
        let key = crate::grouping::date_label(row.date);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(row),
            None => groups.push((key, vec![row])),
        }
    }

    groups
        .into_iter()
        .map(|(date_lbl, members)| {
            let mut targets: Vec<&str> = Vec::new();
            let mut observations: Vec<&str> = Vec::new();
            for member in &members {
                let target = member.target.trim();
                if !target.is_empty() && !targets.contains(&target) {
                    targets.push(target);
                }
                let obs = member.observations.trim();
                if !obs.is_empty() && !observations.contains(&obs) {
                    observations.push(obs);
                }
            }
            ItineraryStep {
                date_label: date_lbl,
                products: join_column(&members, |r| &r.product),
                doses: join_column(&members, |r| &r.dose_raw),
                units: join_column(&members, |r| &r.dose_unit),
                targets: targets.join("\n"),
                observations: observations.join("\n"),
                tool: members
                    .iter()
                    .map(|r| r.tool.trim())
                    .find(|t| !t.is_empty())
                    .unwrap_or_default()
                    .to_string(),
                yield_q_ha: String::new(),
                harvest_humidity: String::new(),
            }
        })
        .collect()
}

fn join_column<'a, F>(members: &[&'a InterventionRecord], field: F) -> String
where
    F: Fn(&'a InterventionRecord) -> &'a str,
{
    members
        .iter()
        .map(|r| field(r))
        .collect::<Vec<_>>()
        .join("\n")
}
