use agrilog_core::error::AgrilogError;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), AgrilogError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
