//! Error types for the analysis pipeline.

use thiserror::Error;

/// Main error type for the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parsing error in row {row}: '{value}': {source}")]
    DateParseError {
        row: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unknown ticker '{0}' is neither a legacy nor a known symbol")]
    UnknownTicker(String),

    #[error("Not enough symbols: need {needed}, have {available}")]
    InsufficientSymbols { needed: usize, available: usize },

    #[error("Not enough observations for {symbol}: need {needed}, have {available}")]
    InsufficientData {
        symbol: String,
        needed: usize,
        available: usize,
    },

    #[error("Model fit failed for {symbol}: {reason}")]
    ModelFit { symbol: String, reason: String },

    #[error("No data loaded")]
    NoData,
}

impl PipelineError {
    /// Attach a symbol to a model-fit error raised without one.
    pub fn for_symbol(self, symbol: &str) -> Self {
        match self {
            PipelineError::ModelFit { symbol: s, reason } if s.is_empty() => PipelineError::ModelFit {
                symbol: symbol.to_string(),
                reason,
            },
            PipelineError::InsufficientData {
                symbol: s,
                needed,
                available,
            } if s.is_empty() => PipelineError::InsufficientData {
                symbol: symbol.to_string(),
                needed,
                available,
            },
            other => other,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
