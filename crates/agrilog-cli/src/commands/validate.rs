use std::path::PathBuf;

use agrilog_core::error::AgrilogError;
use agrilog_core::store::xlsx::XlsxStore;

pub fn run(workbook: PathBuf, group_id: &str, status: Option<&str>) -> Result<(), AgrilogError> {
    let mut store = XlsxStore::open(&workbook)?;
    match agrilog_core::validate_group(&mut store, group_id, status) {
        Ok(true) => {
            println!("Updated: {group_id}");
            Ok(())
        }
        Ok(false) => {
            println!("Nothing to update for {group_id} (unknown id or already realized)");
            Ok(())
        }
        Err(e) => {
            eprintln!("Update impossible.");
            Err(e)
        }
    }
}
