/// errors surfaced while loading, saving or validating run settings.
/// invariant violations inside the core are asserts, not variants here.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings json is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SettingsError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid { field, reason: reason.into() }
    }
}
