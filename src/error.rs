//! Error types for the sector enricher

use crate::llm::ModelError;
use thiserror::Error;

/// Result type alias for enrichment operations
pub type Result<T> = std::result::Result<T, EnrichError>;

#[derive(Error, Debug)]
pub enum EnrichError {

    // =============================
    // Setup Errors (fatal before any work)
    // =============================

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    // =============================
    // Run Errors
    // =============================

    #[error("Model call failed: {0}")]
    ModelError(#[from] ModelError),

    // =============================
    // External Library Conversions
    // =============================

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
