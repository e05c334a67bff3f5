pub mod error;
pub mod formulation;
pub mod grouping;
pub mod irrigation;
pub mod journal;
pub mod mail;
pub mod model;
pub mod report;
pub mod sheet;
pub mod status;
pub mod store;

use tracing::warn;

use error::AgrilogError;
use grouping::{GroupingStrategy, Mix};
use status::GroupId;
use store::{RecordStore, SHEET_PRODUCTS};

/// Main API entry point: build the planned treatment mixes for a campaign.
///
/// Loads the journal, keeps treatment rows still marked as planned, sorts
/// each mix's products into incorporation order against the input reference,
/// and clusters them with the chosen strategy.
pub fn planned_mixes(
    store: &dyn RecordStore,
    campaign: i32,
    strategy: GroupingStrategy,
) -> Result<Vec<Mix>, AgrilogError> {
    let records = journal::interventions(store, Some(campaign))?;
    let planned = journal::planned_treatments(&records);
    let reference = formulation::decode_formulations(&store.read_rows(SHEET_PRODUCTS)?);

    let mut mixes = grouping::build_mixes(&planned, strategy);
    for mix in &mut mixes {
        mix.records = formulation::rank_and_annotate(std::mem::take(&mut mix.records), &reference);
    }
    Ok(mixes)
}

/// Mark the spray event behind a scanned group id as done.
///
/// Returns false when nothing was still planned under that id, which is the
/// normal outcome of scanning the same sheet twice. A malformed id is the
/// same informational outcome: it cannot reference journal content, so there
/// is nothing to update.
pub fn validate_group(
    store: &mut dyn RecordStore,
    raw_id: &str,
    target_status: Option<&str>,
) -> Result<bool, AgrilogError> {
    let group_id = match GroupId::parse(raw_id) {
        Ok(id) => id,
        Err(e) => {
            warn!(raw = raw_id, %e, "ignoring malformed group id");
            return Ok(false);
        }
    };
    status::mark_realized(
        store,
        &group_id,
        target_status.unwrap_or(status::REALIZED_STATUS),
    )
}

/// Select one mix by its label, or by 1-based position in the displayed list.
pub fn select_mix<'a>(mixes: &'a [Mix], selector: &str) -> Result<&'a Mix, AgrilogError> {
    if let Some(mix) = mixes.iter().find(|m| m.label == selector) {
        return Ok(mix);
    }
    if let Ok(index) = selector.parse::<usize>() {
        if index >= 1 {
            if let Some(mix) = mixes.get(index - 1) {
                return Ok(mix);
            }
        }
    }
    Err(AgrilogError::MixNotFound {
        selector: selector.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Sheet;
    use crate::store::{MemoryStore, SHEET_JOURNAL};

    fn store() -> MemoryStore {
        let mut journal = Sheet::with_headers(&[
            "ID_Parcelle",
            "Campagne",
            "Date",
            "Nature_Intervention",
            "Statut",
            "Nom_Produit",
            "Dose_Ha",
        ]);
        journal.push_row(&[
            "A2_Buissons", "2024", "2024-04-15", "Traitement", "Prévu", "Fongix", "1,5",
        ]);
        journal.push_row(&[
            "A2_Buissons", "2024", "2024-04-15", "Traitement", "Prévu", "Adjuvix", "0,1",
        ]);
        journal.push_row(&[
            "Les Vignes", "2024", "2024-04-15", "Traitement", "Réalisé", "Herbazol", "0,8",
        ]);

        let mut products = Sheet::with_headers(&["Nom_Produit", "Formulation"]);
        products.push_row(&["Fongix", "EC"]);
        products.push_row(&["Adjuvix", "SL"]);

        let mut store = MemoryStore::new();
        store.insert(SHEET_JOURNAL, journal);
        store.insert(SHEET_PRODUCTS, products);
        store
    }

    #[test]
    fn planned_mixes_excludes_realized_rows_and_ranks_products() {
        let mixes = planned_mixes(&store(), 2024, GroupingStrategy::ByParcel).unwrap();
        assert_eq!(mixes.len(), 1);
        let mix = &mixes[0];
        assert_eq!(mix.parcels, vec!["A2_Buissons".to_string()]);
        // emulsions (EC) go into the tank before liquids (SL)
        assert_eq!(mix.records[0].product, "Fongix");
        assert_eq!(mix.records[1].product, "Adjuvix");
    }

    #[test]
    fn validate_group_flips_and_reports() {
        let mut store = store();
        assert!(validate_group(&mut store, "A2_Buissons_20240415", None).unwrap());
        assert!(!validate_group(&mut store, "A2_Buissons_20240415", None).unwrap());
    }

    #[test]
    fn malformed_id_is_nothing_to_update_not_an_error() {
        let mut store = store();
        let before = store.read_rows(SHEET_JOURNAL).unwrap();
        assert!(!validate_group(&mut store, "pas-un-id", None).unwrap());
        assert_eq!(store.read_rows(SHEET_JOURNAL).unwrap(), before);
    }

    #[test]
    fn select_mix_by_label_or_index() {
        let mixes = planned_mixes(&store(), 2024, GroupingStrategy::ByParcel).unwrap();
        let by_label = select_mix(&mixes, &mixes[0].label).unwrap();
        assert_eq!(by_label.label, mixes[0].label);
        let by_index = select_mix(&mixes, "1").unwrap();
        assert_eq!(by_index.label, mixes[0].label);
        assert!(select_mix(&mixes, "7").is_err());
    }
}
