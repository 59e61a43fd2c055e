//! Domain error types.

/// Top-level error type for tradesync.
#[derive(Debug, thiserror::Error)]
pub enum TradesyncError {
    #[error("store error: {reason}")]
    Store { reason: String },

    #[error("store parse error in {file}: {reason}")]
    StoreParse { file: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("csv import error in {file}: {reason}")]
    CsvImport { file: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error("backend request failed: {reason}")]
    Http { reason: String },

    #[error("quote service error: {reason}")]
    Quote { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradesyncError> for std::process::ExitCode {
    fn from(err: &TradesyncError) -> Self {
        let code: u8 = match err {
            TradesyncError::Io(_) => 1,
            TradesyncError::ConfigParse { .. }
            | TradesyncError::ConfigMissing { .. }
            | TradesyncError::ConfigInvalid { .. } => 2,
            TradesyncError::Store { .. } | TradesyncError::StoreParse { .. } => 3,
            TradesyncError::InvalidInput { .. } | TradesyncError::CsvImport { .. } => 4,
            TradesyncError::Report { .. }
            | TradesyncError::Http { .. }
            | TradesyncError::Quote { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
