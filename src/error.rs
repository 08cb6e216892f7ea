use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Source not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Malformed tabular input: {0}")]
    Format(String),

    #[error("JSON decoding failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("JSON encoding failed: {0}")]
    Encode(serde_json::Error),

    #[error("Aggregation row does not fit {target}: {source}")]
    Aggregation {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    #[error("Invalid review: {0}")]
    InvalidReview(String),
}

impl EtlError {
    /// True when the error means the requested source does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EtlError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
