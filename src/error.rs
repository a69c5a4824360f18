use polars::prelude::PolarsError;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can abort a season-stats run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Side token other than "home" / "away"
    #[error("Unknown side '{0}': choose a configuration between 'home' and 'away'")]
    UnknownSide(String),

    /// Query plan / schema errors (missing columns, bad casts, ...)
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Bucket I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parameters file could not be parsed
    #[error("Parameters file error: {0}")]
    Parameters(#[from] toml::de::Error),

    /// Local warehouse errors
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Remote warehouse transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote warehouse rejected a statement or returned an unexpected payload
    #[error("Warehouse error: {0}")]
    Warehouse(String),
}
