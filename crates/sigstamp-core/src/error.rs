//! Error types for field placement and signing

use serde::Serialize;
use thiserror::Error;

/// Degenerate input to the aspect-fit resolver
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometryError {
    #[error("target box has zero area ({width} x {height})")]
    EmptyBox { width: f64, height: f64 },

    #[error("asset has zero area ({width} x {height})")]
    EmptyAsset { width: f64, height: f64 },
}

/// Failures reported by a [`crate::engine::DocumentEngine`]
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to load document: {0}")]
    Load(String),

    #[error("Malformed page {page}: {reason}")]
    MalformedPage { page: usize, reason: String },

    #[error("Failed to embed image: {0}")]
    Embed(String),

    #[error("Failed to draw on page {page}: {reason}")]
    Draw { page: usize, reason: String },

    #[error("Failed to serialize document: {0}")]
    Save(String),
}

/// Failures resolving a document id to bytes
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document store error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audit store failures. Never fatal to a signing request.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Audit store unavailable")]
    Unavailable,

    #[error("Audit store write failed: {0}")]
    Write(String),

    #[error("Audit store read failed: {0}")]
    Read(String),
}

/// Request-level failures of a signing run
#[derive(Error, Debug)]
pub enum SignError {
    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("PDF not found: {0}")]
    DocumentNotFound(String),

    #[error("Document source failed: {0}")]
    Source(String),

    #[error("Unsupported asset format: {0}")]
    UnsupportedAssetFormat(String),

    #[error("Field {field_id} has degenerate geometry: {source}")]
    Geometry {
        field_id: String,
        #[source]
        source: GeometryError,
    },

    #[error("Field {field_id} references page {page_index} but the document has {page_count} page(s)")]
    PageOutOfRange {
        field_id: String,
        page_index: i64,
        page_count: usize,
    },

    #[error("Compositing failed: {0}")]
    CompositingFailed(#[from] EngineError),
}

impl From<SourceError> for SignError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(id) => SignError::DocumentNotFound(id),
            SourceError::Io(e) => SignError::Source(e.to_string()),
        }
    }
}
