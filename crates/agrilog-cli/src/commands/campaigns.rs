use std::path::PathBuf;

use agrilog_core::error::AgrilogError;
use agrilog_core::journal;
use agrilog_core::store::xlsx::XlsxStore;

use crate::output;

pub fn run(workbook: PathBuf, output_format: &str) -> Result<(), AgrilogError> {
    let store = XlsxStore::open(&workbook)?;
    let years = journal::campaigns(&store)?;

    match output_format {
        "json" => output::json::print(&years)?,
        _ => {
            if years.is_empty() {
                println!("No campaign found in the journal.");
            }
            for year in years {
                println!("{year}");
            }
        }
    }
    Ok(())
}
