//! Unified error handling for EduHub Core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.
//!
//! Note that an invalid course record is *not* an error: the validator encodes
//! it as a [`ValidationReport`](crate::domain::ValidationReport). Errors here
//! are store failures, misconfiguration, and programmer mistakes.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{DomainError, ValidationReport};

/// Root error type for EduHub Core operations.
#[derive(Debug, Error, Clone)]
pub enum EduhubError {
    /// Errors from the domain layer (malformed documents, bad paths).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (store and orchestration failures).
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl EduhubError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check your setup and try again".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in EduHub".into(),
                "Please report this issue at: https://github.com/cosecruz/eduhub/issues".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Application(ApplicationError::StoreLockError))
    }

    /// The duplicate-key condition carried by this error, if any.
    pub fn as_duplicate_key(&self) -> Option<&ApplicationError> {
        match self {
            Self::Application(e @ ApplicationError::DuplicateKey { .. }) => Some(e),
            _ => None,
        }
    }

    /// The report of a write a collection schema refused, if that is what
    /// this error is.
    pub fn as_schema_violation(&self) -> Option<&ValidationReport> {
        match self {
            Self::Application(ApplicationError::SchemaViolation { report, .. }) => Some(report),
            _ => None,
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type EduhubResult<T> = Result<T, EduhubError>;

/// Extension trait for adding context to errors.
pub trait Context<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> EduhubResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> EduhubResult<T> {
        self.map_err(|e| EduhubError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}
