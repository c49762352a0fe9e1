use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Dataset unavailable at {path}: {reason}")]
    DataUnavailable { path: PathBuf, reason: String },

    #[error("Schema mismatch: {}", describe_schema_gap(.table, .column.as_deref()))]
    SchemaMismatch {
        table: String,
        column: Option<String>,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

fn describe_schema_gap(table: &str, column: Option<&str>) -> String {
    match column {
        Some(column) => format!("table {} has no column {}", table, column),
        None => format!("table {} is missing", table),
    }
}

impl From<config::ConfigError> for AnalysisError {
    fn from(err: config::ConfigError) -> Self {
        AnalysisError::Config(err.to_string())
    }
}

impl AnalysisError {
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AnalysisError::DataUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for the failures that abort a run because the store itself is unusable.
    pub fn is_fatal_store_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::DataUnavailable { .. } | AnalysisError::SchemaMismatch { .. }
        )
    }
}
