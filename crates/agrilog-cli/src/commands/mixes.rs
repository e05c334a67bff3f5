use std::path::PathBuf;

use agrilog_core::error::AgrilogError;
use agrilog_core::grouping::GroupingStrategy;
use agrilog_core::store::xlsx::XlsxStore;

use crate::output;

pub fn run(
    workbook: PathBuf,
    campaign: i32,
    strategy: GroupingStrategy,
    output_format: &str,
) -> Result<(), AgrilogError> {
    let store = XlsxStore::open(&workbook)?;
    let mixes = agrilog_core::planned_mixes(&store, campaign, strategy)?;

    match output_format {
        "json" => output::json::print(&mixes)?,
        _ => output::table::print_mixes(&mixes),
    }
    Ok(())
}
