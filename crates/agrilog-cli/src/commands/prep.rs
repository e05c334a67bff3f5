use std::path::PathBuf;

use agrilog_core::error::AgrilogError;
use agrilog_core::grouping::GroupingStrategy;
use agrilog_core::report::render::{ReportDocument, ReportRenderer, TextRenderer};
use agrilog_core::report::{self, report_stem};
use agrilog_core::store::xlsx::XlsxStore;
use rust_decimal::Decimal;

pub fn run(
    workbook: PathBuf,
    campaign: i32,
    selector: &str,
    volume: Option<Decimal>,
    out: Option<PathBuf>,
) -> Result<(), AgrilogError> {
    let store = XlsxStore::open(&workbook)?;
    let mixes = agrilog_core::planned_mixes(&store, campaign, GroupingStrategy::ByParcel)?;
    let mix = agrilog_core::select_mix(&mixes, selector)?;

    let sheet = report::prep_sheet(&store, mix, volume)?;
    let out = out.unwrap_or_else(|| {
        let stem = report_stem("fiche_preparation", campaign, &mix.parcels.join("_"));
        PathBuf::from(format!("{stem}.txt"))
    });

    let path = TextRenderer.render(&ReportDocument::Prep(sheet), &out)?;
    eprintln!("Written: {}", path.display());
    Ok(())
}
