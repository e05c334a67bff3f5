use std::collections::HashMap;

use crate::model::{FormulationEntry, InterventionRecord};
use crate::sheet::Sheet;

/// Rank used for products whose formulation is unknown: mixed last, after
/// every recognized code.
pub const UNKNOWN_RANK: u8 = 99;

/// Decode the product reference sheet into formulation entries.
///
/// The formulation column is found by substring ("formulation" anywhere in
/// the header, any case), falling back to a column literally named
/// "Formulation". Without it every entry carries an empty code.
pub fn decode_formulations(sheet: &Sheet) -> Vec<FormulationEntry> {
    let product_col = sheet.first_column(&["Nom_Produit", "Produit", "Nom"]);
    let formulation_col = sheet
        .column_containing("formulation")
        .or_else(|| sheet.column("Formulation"));

    let Some(product_col) = product_col else {
        return Vec::new();
    };

    sheet
        .iter_rows()
        .filter_map(|row| {
            let product = row.cell(product_col);
            if product.is_empty() {
                return None;
            }
            let formulation = formulation_col.map(|c| row.cell(c)).unwrap_or("");
            Some(FormulationEntry {
                product: product.to_string(),
                formulation: formulation.to_string(),
            })
        })
        .collect()
}

/// Mixing-order rank for a formulation code, ascending (1 = into the tank
/// first). Water-soluble bags dissolve first, then powders and granules,
/// suspensions, emulsions, and finally liquids.
pub fn formulation_rank(formulation: &str) -> u8 {
    let code = formulation.trim().to_uppercase();
    if code.is_empty() {
        return UNKNOWN_RANK;
    }
    if code.contains("SACHET") || code.contains("HYDROSOLUBLE") || code == "WS" || code == "SB" {
        return 1;
    }
    match code.as_str() {
        "WP" | "WG" | "GR" | "SG" | "DG" => 2,
        "SC" | "CS" | "SE" => 3,
        "EC" | "EW" | "EO" | "ME" => 4,
        "SL" | "SP" => 5,
        _ => UNKNOWN_RANK,
    }
}

/// Resolve each product's formulation from the reference (case-insensitive,
/// trimmed name match), write it back on the record for display, and
/// stable-sort by mixing rank. Unmatched products keep their relative input
/// order at the end. Never fails: degraded reference data just ranks
/// everything unknown.
pub fn rank_and_annotate(
    mut products: Vec<InterventionRecord>,
    reference: &[FormulationEntry],
) -> Vec<InterventionRecord> {
    let lookup: HashMap<String, String> = reference
        .iter()
        .map(|entry| {
            (
                entry.product.trim().to_lowercase(),
                entry.formulation.trim().to_uppercase(),
            )
        })
        .collect();

    for product in &mut products {
        let key = product.product.trim().to_lowercase();
        product.formulation = lookup.get(&key).cloned().unwrap_or_default();
    }

    products.sort_by_key(|p| formulation_rank(&p.formulation));
    products
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> InterventionRecord {
        InterventionRecord {
            product: name.to_string(),
            ..Default::default()
        }
    }

    fn reference() -> Vec<FormulationEntry> {
        [
            ("Solupack", "Sachet hydrosoluble"),
            ("Granulor", "wg"),
            ("Suspenz", "SC"),
            ("Emulsia", "EC"),
            ("Liquidex", "SL"),
        ]
        .iter()
        .map(|(p, f)| FormulationEntry {
            product: p.to_string(),
            formulation: f.to_string(),
        })
        .collect()
    }

    #[test]
    fn ranks_follow_mixing_order() {
        assert_eq!(formulation_rank("Sachet hydrosoluble"), 1);
        assert_eq!(formulation_rank("WS"), 1);
        assert_eq!(formulation_rank("SB"), 1);
        assert_eq!(formulation_rank("wg"), 2);
        assert_eq!(formulation_rank("GR"), 2);
        assert_eq!(formulation_rank("SC"), 3);
        assert_eq!(formulation_rank("EC"), 4);
        assert_eq!(formulation_rank("SL"), 5);
        assert_eq!(formulation_rank("ZC"), UNKNOWN_RANK);
        assert_eq!(formulation_rank(""), UNKNOWN_RANK);
    }

    #[test]
    fn powders_sort_before_emulsions() {
        let sorted = rank_and_annotate(
            vec![product("Emulsia"), product("Granulor")],
            &reference(),
        );
        assert_eq!(sorted[0].product, "Granulor");
        assert_eq!(sorted[1].product, "Emulsia");
    }

    #[test]
    fn annotation_is_written_back_uppercased() {
        let sorted = rank_and_annotate(vec![product(" granulor ")], &reference());
        assert_eq!(sorted[0].formulation, "WG");
    }

    #[test]
    fn unmatched_products_sort_last_in_input_order() {
        let sorted = rank_and_annotate(
            vec![
                product("Mystère B"),
                product("Liquidex"),
                product("Mystère A"),
            ],
            &reference(),
        );
        assert_eq!(sorted[0].product, "Liquidex");
        assert_eq!(sorted[1].product, "Mystère B");
        assert_eq!(sorted[2].product, "Mystère A");
    }

    #[test]
    fn empty_reference_preserves_input_order() {
        let sorted = rank_and_annotate(
            vec![product("B"), product("A"), product("C")],
            &[],
        );
        let names: Vec<&str> = sorted.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);
        assert!(sorted.iter().all(|p| p.formulation.is_empty()));
    }

    #[test]
    fn full_mixing_sequence() {
        let sorted = rank_and_annotate(
            vec![
                product("Liquidex"),
                product("Emulsia"),
                product("Suspenz"),
                product("Granulor"),
                product("Solupack"),
            ],
            &reference(),
        );
        let names: Vec<&str> = sorted.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(
            names,
            ["Solupack", "Granulor", "Suspenz", "Emulsia", "Liquidex"]
        );
    }

    #[test]
    fn decode_finds_formulation_column_by_substring() {
        let mut sheet = Sheet::with_headers(&["Nom_Produit", "Type de formulation"]);
        sheet.push_row(&["Granulor", "WG"]);
        let entries = decode_formulations(&sheet);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].formulation, "WG");
    }

    #[test]
    fn decode_without_formulation_column_yields_empty_codes() {
        let mut sheet = Sheet::with_headers(&["Nom_Produit", "Fournisseur"]);
        sheet.push_row(&["Granulor", "Coop"]);
        let entries = decode_formulations(&sheet);
        assert_eq!(entries[0].formulation, "");
    }
}
