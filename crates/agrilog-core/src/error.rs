use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AgrilogError {
    #[error("record store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("failed to write sheet '{sheet}': {reason}")]
    SheetWrite { sheet: String, reason: String },

    #[error("invalid group id '{raw}': expected '<parcel>_<YYYYMMDD>'")]
    InvalidGroupId { raw: String },

    #[error("no mix matches selector '{selector}'")]
    MixNotFound { selector: String },

    #[error("failed to render report to {path}: {reason}")]
    Render { path: PathBuf, reason: String },

    #[error("failed to send mail to {recipient}: {reason}")]
    Mail { recipient: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
