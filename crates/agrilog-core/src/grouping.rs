use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::InterventionRecord;
use crate::status::GroupId;

/// Bucket label for records whose date is absent or unparseable. Distinct
/// from every real ISO date, so these records never collide with dated ones.
pub const UNKNOWN_DATE_LABEL: &str = "Date Inconnue";

/// How planned treatment rows are clustered into spray events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// One mix per (date, parcel): the preparation-sheet view.
    ByParcel,
    /// One mix per (date, product signature): parcels sprayed with the same
    /// products at the same doses on the same day share one tank.
    BySignature,
}

/// A derived spray event: one or more journal rows applied together.
/// Rebuilt from scratch on every load, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Mix {
    /// Human-readable selection label, unique within one build.
    pub label: String,
    /// ISO date string or `UNKNOWN_DATE_LABEL`.
    pub date_label: String,
    pub date: Option<NaiveDate>,
    pub parcels: Vec<String>,
    /// Constituent product rows, in journal order (mixing order is applied
    /// later by the formulation resolver).
    pub records: Vec<InterventionRecord>,
    pub surface_ha: Decimal,
    pub volume_ha: Decimal,
    /// Absent when the date is unknown: no well-formed id can reference the
    /// unknown-date bucket.
    pub group_id: Option<GroupId>,
}

pub fn date_label(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => UNKNOWN_DATE_LABEL.to_string(),
    }
}

/// Cluster planned treatment records into mixes with selection labels,
/// sorted by label descending (ISO dates put the newest first).
///
/// Callers pass records already filtered to the target campaign, nature
/// Traitement and a planned status (see `journal::planned_treatments`).
pub fn build_mixes(records: &[InterventionRecord], strategy: GroupingStrategy) -> Vec<Mix> {
    let mut mixes = match strategy {
        GroupingStrategy::ByParcel => by_parcel(records),
        GroupingStrategy::BySignature => by_signature(records),
    };
    mixes.sort_by(|a, b| b.label.cmp(&a.label));
    mixes
}

/// Group by (date, parcel), preserving journal order within each group.
fn parcel_date_groups(
    records: &[InterventionRecord],
) -> Vec<((String, String), Vec<InterventionRecord>)> {
    let mut groups: Vec<((String, String), Vec<InterventionRecord>)> = Vec::new();
    for record in records {
        let key = (date_label(record.date), record.parcel.clone());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(record.clone()),
            None => groups.push((key, vec![record.clone()])),
        }
    }
    groups
}

fn by_parcel(records: &[InterventionRecord]) -> Vec<Mix> {
    parcel_date_groups(records)
        .into_iter()
        .map(|((date_lbl, parcel), members)| {
            let first = &members[0];
            let label = format!("{date_lbl} - {parcel} ({} produits)", members.len());
            Mix {
                label,
                date_label: date_lbl,
                date: first.date,
                // Surface and volume deliberately come from the first row
                // only in this view; the multi-parcel view sums instead.
                surface_ha: first.surface_ha,
                volume_ha: first.volume_ha,
                group_id: first.date.map(|d| GroupId::new(&[parcel.clone()], d)),
                parcels: vec![parcel],
                records: members,
            }
        })
        .collect()
}

/// Product signature of one parcel-date group: sorted
/// `"{lowercased product}_{trimmed dose}"` entries.
fn signature(members: &[InterventionRecord]) -> Vec<String> {
    let mut sig: Vec<String> = members
        .iter()
        .map(|r| format!("{}_{}", r.product.trim().to_lowercase(), r.dose_raw.trim()))
        .collect();
    sig.sort();
    sig
}

fn by_signature(records: &[InterventionRecord]) -> Vec<Mix> {
    // Stage 1: per parcel-date groups; stage 2: regroup by (date, signature)
    // so parcels sharing the exact product+dose set share one mix.
    let mut merged: Vec<((String, Vec<String>), Mix)> = Vec::new();
    for ((date_lbl, parcel), members) in parcel_date_groups(records) {
        let key = (date_lbl.clone(), signature(&members));
        let first = &members[0];
        match merged.iter_mut().find(|(k, _)| *k == key) {
            Some((_, mix)) => {
                mix.surface_ha += first.surface_ha;
                mix.volume_ha += first.volume_ha;
                mix.parcels.push(parcel);
            }
            None => merged.push((
                key,
                Mix {
                    label: String::new(), // assigned below
                    date_label: date_lbl,
                    date: first.date,
                    surface_ha: first.surface_ha,
                    volume_ha: first.volume_ha,
                    group_id: None,
                    parcels: vec![parcel],
                    records: members,
                },
            )),
        }
    }

    let mut mixes: Vec<Mix> = merged.into_iter().map(|(_, mix)| mix).collect();

    for mix in &mut mixes {
        mix.group_id = mix.date.map(|d| GroupId::new(&mix.parcels, d));
        mix.label = format!(
            "{} - {} ({} produits)",
            mix.date_label,
            parcel_label(&mix.parcels),
            mix.records.len()
        );
    }
    disambiguate_labels(&mut mixes);
    mixes
}

fn parcel_label(parcels: &[String]) -> String {
    if parcels.len() <= 2 {
        parcels.join(" & ")
    } else {
        format!("{} Parcelles", parcels.len())
    }
}

/// The parcel-count abbreviation can make two different mixes render the
/// same label; suffix colliding labels with a 1-based occurrence counter in
/// iteration order.
fn disambiguate_labels(mixes: &mut [Mix]) {
    let labels: Vec<String> = mixes.iter().map(|m| m.label.clone()).collect();
    for (idx, mix) in mixes.iter_mut().enumerate() {
        let total = labels.iter().filter(|l| **l == labels[idx]).count();
        if total > 1 {
            let occurrence = labels[..idx].iter().filter(|l| **l == labels[idx]).count() + 1;
            mix.label = format!("{} (Mix {occurrence})", mix.label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(date: &str, parcel: &str, product: &str, dose: &str) -> InterventionRecord {
        InterventionRecord {
            parcel: parcel.to_string(),
            date: crate::sheet::parse_date_loose(date),
            product: product.to_string(),
            dose_raw: dose.to_string(),
            surface_ha: dec!(2),
            volume_ha: dec!(150),
            ..Default::default()
        }
    }

    #[test]
    fn by_parcel_groups_date_and_parcel() {
        let records = vec![
            record("2024-04-15", "A", "X", "1"),
            record("2024-04-15", "A", "Y", "2"),
            record("2024-04-16", "B", "Z", "1"),
        ];
        let mixes = build_mixes(&records, GroupingStrategy::ByParcel);
        assert_eq!(mixes.len(), 2);
        // Descending label order: newest date first
        assert_eq!(mixes[0].label, "2024-04-16 - B (1 produits)");
        assert_eq!(mixes[0].records.len(), 1);
        assert_eq!(mixes[1].label, "2024-04-15 - A (2 produits)");
        assert_eq!(mixes[1].records.len(), 2);
    }

    #[test]
    fn by_parcel_takes_surface_from_first_record_only() {
        let mut second = record("2024-04-15", "A", "Y", "2");
        second.surface_ha = dec!(99);
        let records = vec![record("2024-04-15", "A", "X", "1"), second];
        let mixes = build_mixes(&records, GroupingStrategy::ByParcel);
        assert_eq!(mixes[0].surface_ha, dec!(2));
    }

    #[test]
    fn by_parcel_group_id_embeds_parcel_and_date() {
        let records = vec![record("2024-04-15", "A2_Buissons", "X", "1")];
        let mixes = build_mixes(&records, GroupingStrategy::ByParcel);
        let id = mixes[0].group_id.as_ref().unwrap();
        assert_eq!(id.to_string(), "A2_Buissons_20240415");
    }

    #[test]
    fn unknown_dates_bucket_separately_without_group_id() {
        let records = vec![
            record("", "A", "X", "1"),
            record("2024-04-15", "A", "X", "1"),
        ];
        let mixes = build_mixes(&records, GroupingStrategy::ByParcel);
        assert_eq!(mixes.len(), 2);
        let unknown = mixes
            .iter()
            .find(|m| m.date_label == UNKNOWN_DATE_LABEL)
            .unwrap();
        assert!(unknown.group_id.is_none());
    }

    #[test]
    fn by_signature_merges_parcels_with_identical_products() {
        let records = vec![
            record("2024-04-15", "P1", "Fongix", "1.5"),
            record("2024-04-15", "P1", "Adjuvix", "0.1"),
            record("2024-04-15", "P2", "Adjuvix", "0.1"),
            record("2024-04-15", "P2", "Fongix", "1.5"),
        ];
        let mixes = build_mixes(&records, GroupingStrategy::BySignature);
        assert_eq!(mixes.len(), 1);
        let mix = &mixes[0];
        assert_eq!(mix.parcels, vec!["P1".to_string(), "P2".to_string()]);
        assert_eq!(mix.label, "2024-04-15 - P1 & P2 (2 produits)");
        // Summed across parcels in this view
        assert_eq!(mix.surface_ha, dec!(4));
        assert_eq!(mix.volume_ha, dec!(300));
        assert_eq!(
            mix.group_id.as_ref().unwrap().to_string(),
            "P1|P2_20240415"
        );
    }

    #[test]
    fn by_signature_separates_differing_doses() {
        let records = vec![
            record("2024-04-15", "P1", "Fongix", "1.5"),
            record("2024-04-15", "P2", "Fongix", "2.0"),
        ];
        let mixes = build_mixes(&records, GroupingStrategy::BySignature);
        assert_eq!(mixes.len(), 2);
    }

    #[test]
    fn by_signature_ignores_product_case_and_dose_whitespace() {
        let records = vec![
            record("2024-04-15", "P1", "FONGIX", " 1.5 "),
            record("2024-04-15", "P2", "fongix", "1.5"),
        ];
        let mixes = build_mixes(&records, GroupingStrategy::BySignature);
        assert_eq!(mixes.len(), 1);
    }

    #[test]
    fn three_or_more_parcels_abbreviate() {
        let records = vec![
            record("2024-04-15", "P1", "Fongix", "1.5"),
            record("2024-04-15", "P2", "Fongix", "1.5"),
            record("2024-04-15", "P3", "Fongix", "1.5"),
        ];
        let mixes = build_mixes(&records, GroupingStrategy::BySignature);
        assert_eq!(mixes[0].label, "2024-04-15 - 3 Parcelles (1 produits)");
    }

    #[test]
    fn colliding_abbreviated_labels_get_mix_suffixes() {
        // Two distinct signatures, each spanning three parcels on the same
        // day: identical base labels after abbreviation.
        let records = vec![
            record("2024-04-15", "P1", "Fongix", "1.5"),
            record("2024-04-15", "P2", "Fongix", "1.5"),
            record("2024-04-15", "P3", "Fongix", "1.5"),
            record("2024-04-15", "P4", "Herbazol", "0.8"),
            record("2024-04-15", "P5", "Herbazol", "0.8"),
            record("2024-04-15", "P6", "Herbazol", "0.8"),
        ];
        let mixes = build_mixes(&records, GroupingStrategy::BySignature);
        assert_eq!(mixes.len(), 2);
        let mut labels: Vec<&str> = mixes.iter().map(|m| m.label.as_str()).collect();
        labels.sort();
        assert_eq!(
            labels,
            [
                "2024-04-15 - 3 Parcelles (1 produits) (Mix 1)",
                "2024-04-15 - 3 Parcelles (1 produits) (Mix 2)",
            ]
        );
    }

    #[test]
    fn labels_sort_descending() {
        let records = vec![
            record("2024-03-01", "A", "X", "1"),
            record("2024-05-01", "A", "X", "1"),
            record("", "A", "X", "1"),
        ];
        let mixes = build_mixes(&records, GroupingStrategy::ByParcel);
        let labels: Vec<&str> = mixes.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "Date Inconnue - A (1 produits)",
                "2024-05-01 - A (1 produits)",
                "2024-03-01 - A (1 produits)",
            ]
        );
    }
}
