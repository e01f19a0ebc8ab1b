//! Error types for radchunk
//!
//! This module provides error handling for all processing stages: ontology
//! parsing, tabular aggregation, PDF extraction, chunking, and persistence.

use thiserror::Error;

/// Main error type for radchunk operations
#[derive(Error, Debug)]
pub enum RadchunkError {
    /// Ontology (OWL/RDF) processing errors
    #[error("Ontology processing error: {0}")]
    Ontology(String),

    /// Tabular (procedure table) processing errors
    #[error("Tabular processing error: {0}")]
    Tabular(String),

    /// PDF extraction errors
    #[error("PDF processing error: {0}")]
    Pdf(String),

    /// Semantic chunking errors
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// Chunk construction/validation errors
    #[error("Chunk validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing errors
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(String),
}

/// Result type alias for radchunk operations
pub type Result<T> = std::result::Result<T, RadchunkError>;

// Implement From traits for external error types
impl From<lopdf::Error> for RadchunkError {
    fn from(err: lopdf::Error) -> Self {
        RadchunkError::Pdf(err.to_string())
    }
}

impl From<anyhow::Error> for RadchunkError {
    fn from(err: anyhow::Error) -> Self {
        RadchunkError::Generic(err.to_string())
    }
}
