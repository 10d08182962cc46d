//! Configuration and dataset loading for the dashboard

pub mod config;
pub mod sources;

use arrow::error::ArrowError;
use thiserror::Error;

// Re-exports
pub use config::{BoundaryConfig, BoundaryFormat, DashboardConfig, RenderConfig, RendererBackend};
pub use sources::{BoundaryDataset, TabularDataset, TabularRow};

/// A single row as seen by transform pipelines: field name to JSON value
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}

impl From<geojson::Error> for DataError {
    fn from(error: geojson::Error) -> Self {
        DataError::GeoJson(error.to_string())
    }
}
