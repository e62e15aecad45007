// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// Rule violations on a course record never end up here; they are data and
/// live in a `ValidationReport`. These are misuse errors: a document that is
/// not a mapping, a malformed id, an update that cannot be applied.
///
/// All errors are:
/// - Cloneable (for retry logic)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid document id '{0}'")]
    InvalidIdentifier(String),

    #[error("Invalid field path '{path}': {reason}")]
    InvalidFieldPath { path: String, reason: String },

    #[error("Cannot apply update to '{path}': {reason}")]
    InvalidUpdate { path: String, reason: String },

    #[error("Unknown course level '{0}'")]
    UnknownLevel(String),

    #[error("Invalid schema rule for '{field}': {reason}")]
    InvalidSchema { field: String, reason: String },

    // ========================================================================
    // Not Found Errors (404-level equivalent)
    // ========================================================================
    #[error("Required field missing: {field}")]
    MissingField { field: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidDocument(msg) => vec![
                "Documents must be JSON objects, e.g. {\"title\": \"...\"}".into(),
                format!("Details: {}", msg),
            ],
            Self::InvalidIdentifier(id) => vec![
                format!("'{}' is not a document id", id),
                "Document ids are UUIDs, e.g. 3f2b8c4e-9d1a-4c5e-8f7a-1b2c3d4e5f60".into(),
            ],
            Self::UnknownLevel(_) => vec![
                "Supported levels: beginner, intermediate, expert".into(),
            ],
            Self::InvalidSchema { field, .. } => vec![
                format!("Fix the rule for '{}' before attaching the schema", field),
            ],
            Self::InvalidFieldPath { path, .. } | Self::InvalidUpdate { path, .. } => vec![
                format!("Check the field path '{}'", path),
                "Nested fields use dots, e.g. profile.major".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidDocument(_)
            | Self::InvalidIdentifier(_)
            | Self::InvalidFieldPath { .. }
            | Self::InvalidUpdate { .. }
            | Self::UnknownLevel(_)
            | Self::InvalidSchema { .. } => ErrorCategory::Validation,
            Self::MissingField { .. } => ErrorCategory::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Internal,
}
