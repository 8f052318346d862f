//! Error types for the domain layer.
//!
//! These are raised by pure construction and parsing helpers. The engine
//! wraps them into its own store error so callers see one taxonomy.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A title, component id or story name sanitized to an empty string.
    #[error("Invalid id part '{0}': sanitizes to an empty string")]
    InvalidIdPart(String),

    /// Annotation data did not have the expected shape.
    #[error("Invalid annotations: {0}")]
    InvalidAnnotations(String),

    /// Export filter pattern failed to compile.
    #[error("Invalid export filter '{pattern}': {message}")]
    InvalidExportFilter { pattern: String, message: String },
}

impl DomainError {
    /// Creates an annotation shape error.
    pub fn invalid_annotations(msg: impl Into<String>) -> Self {
        Self::InvalidAnnotations(msg.into())
    }
}
