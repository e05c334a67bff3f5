use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nature of an intervention in the operations journal.
///
/// The journal is hand-filled, so spellings drift ("Semi"/"Semis",
/// "Moisson"/"Récolte"); parsing is loose and anything unrecognized lands in
/// `Autre` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionNature {
    Traitement,
    Fertilisation,
    TravailDuSol,
    Semis,
    Recolte,
    Autre,
}

impl InterventionNature {
    pub fn from_str_loose(s: &str) -> InterventionNature {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "traitement" => InterventionNature::Traitement,
            "fertilisation" => InterventionNature::Fertilisation,
            "travail du sol" | "labour" | "déchaumage" | "dechaumage" => {
                InterventionNature::TravailDuSol
            }
            "semis" | "semi" => InterventionNature::Semis,
            "récolte" | "recolte" | "moisson" => InterventionNature::Recolte,
            _ => InterventionNature::Autre,
        }
    }
}

impl fmt::Display for InterventionNature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterventionNature::Traitement => write!(f, "Traitement"),
            InterventionNature::Fertilisation => write!(f, "Fertilisation"),
            InterventionNature::TravailDuSol => write!(f, "Travail du sol"),
            InterventionNature::Semis => write!(f, "Semis"),
            InterventionNature::Recolte => write!(f, "Récolte"),
            InterventionNature::Autre => write!(f, "Autre"),
        }
    }
}

/// Per-hectare N/P/K contribution of a fertilization input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpkPerHa {
    pub n: Decimal,
    pub p: Decimal,
    pub k: Decimal,
}

/// One row of the intervention journal.
///
/// Every field defaults to empty/zero when the source column is absent; only
/// the status field is ever written back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterventionRecord {
    pub parcel: String,
    pub campaign: i32,
    pub date: Option<NaiveDate>,
    pub nature: InterventionNature,
    /// Nature as written in the journal, for itinerary display.
    pub nature_raw: String,
    pub status: String,
    pub product: String,
    pub dose: Decimal,
    /// Dose exactly as written, used in mix signatures.
    pub dose_raw: String,
    pub dose_unit: String,
    pub surface_ha: Decimal,
    pub volume_ha: Decimal,
    pub culture: String,
    pub target: String,
    pub tool: String,
    pub observations: String,
    pub npk: NpkPerHa,
    pub yield_q_ha: String,
    pub harvest_humidity: String,
    /// Resolved by the formulation resolver; empty until annotated.
    pub formulation: String,
}

impl Default for InterventionNature {
    fn default() -> Self {
        InterventionNature::Autre
    }
}

/// Parcel metadata for a campaign, merged from the crop-assignment sheet and
/// the static parcel reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParcelInfo {
    pub parcel: String,
    pub culture: String,
    pub variety: String,
    pub surface_ha: Decimal,
    pub pac_islet: String,
    pub previous_crop: String,
    /// N/P/K needs of the crop for the campaign, zero when not filled in.
    pub needs: NpkPerHa,
}

/// Reference row mapping a product name to its packaging formulation code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulationEntry {
    pub product: String,
    pub formulation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nature_parses_spelling_variants() {
        assert_eq!(
            InterventionNature::from_str_loose(" Traitement "),
            InterventionNature::Traitement
        );
        assert_eq!(
            InterventionNature::from_str_loose("Labour"),
            InterventionNature::TravailDuSol
        );
        assert_eq!(
            InterventionNature::from_str_loose("Déchaumage"),
            InterventionNature::TravailDuSol
        );
        assert_eq!(
            InterventionNature::from_str_loose("Semi"),
            InterventionNature::Semis
        );
        assert_eq!(
            InterventionNature::from_str_loose("Moisson"),
            InterventionNature::Recolte
        );
        assert_eq!(
            InterventionNature::from_str_loose("Irrigation"),
            InterventionNature::Autre
        );
    }
}
