//! Error types shared across ShowSync recommendation services
//!
//! `RecommendationError` is the single error type propagated out of
//! `showsync-core` and the recommendation crate's lower layers. It maps
//! directly onto the HTTP status policy described for the recommendation
//! core: validation and not-found errors are client errors, transient
//! downstream failures are retryable, and invariant violations are treated
//! as bugs rather than silently corrected.

use std::fmt;

/// Application error type for ShowSync recommendation services.
#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    /// Bad input: invalid rating, unknown feedback kind, out-of-range paging.
    #[error("validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Referenced entity (user, media, recommendation, group) does not exist.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Caller is not authenticated or not authorized for the resource.
    #[error("authorization error")]
    Authorization,

    /// A downstream dependency (catalog read, cache backend) failed
    /// transiently. Callers may retry with backoff.
    #[error("transient error calling {context}: {message}")]
    Transient {
        message: String,
        context: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A configuration value is missing, malformed, or out of range.
    #[error("configuration error: {message}")]
    Configuration { message: String, key: Option<String> },

    /// A system invariant was violated (weights don't sum to 1, duplicate
    /// active recommendation row). Fatal at startup, alerted at runtime.
    #[error("invariant violation: {message}")]
    Invariant { message: String },

    /// Database-level failure not otherwise classified.
    #[error("database error during {operation}: {message}")]
    Database { message: String, operation: String },
}

impl RecommendationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn database(message: impl fmt::Display, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.to_string(),
            operation: operation.into(),
        }
    }

    pub fn transient(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            context: context.into(),
            source: None,
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    /// Whether the failure is worth retrying with backoff.
    ///
    /// Validation, not-found, authorization, and invariant failures are
    /// never retryable; the caller made a mistake or the system is broken.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Database { .. })
    }
}

impl From<sqlx::Error> for RecommendationError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err, "query")
    }
}
