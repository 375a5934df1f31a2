//! Error types for Flashtutor
//!
//! This module defines the error taxonomy used throughout the service,
//! using `thiserror` for ergonomic error handling. Pipeline-level failures
//! that are shown to end users live in [`crate::pipeline::PipelineError`].

use thiserror::Error;

/// Main error type for Flashtutor operations
///
/// Functions return [`Result`] (an `anyhow` alias); these variants are
/// carried inside it and recovered with `downcast_ref` at the HTTP boundary.
#[derive(Error, Debug)]
pub enum FlashtutorError {
    /// Configuration-related errors. Fatal, raised only at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing credentials for the model service
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Model service unreachable, timed out, or returned an unusable response
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Malformed client input
    #[error("Validation error: {field}: {reason}")]
    Validation {
        /// Offending field (JSON path style, e.g. `flashcards[2].term`)
        field: String,
        /// Human-readable reason
        reason: String,
    },

    /// Store unavailable or write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl FlashtutorError {
    /// Shorthand for building a [`FlashtutorError::Validation`]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for Flashtutor operations
///
/// Uses `anyhow::Error` so call sites can attach context while the typed
/// [`FlashtutorError`] stays recoverable via downcasting.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = FlashtutorError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_missing_credentials_error_display() {
        let error = FlashtutorError::MissingCredentials("anthropic".to_string());
        assert_eq!(
            error.to_string(),
            "Missing credentials for provider: anthropic"
        );
    }

    #[test]
    fn test_upstream_error_display() {
        let error = FlashtutorError::Upstream("request timed out".to_string());
        assert_eq!(error.to_string(), "Upstream error: request timed out");
    }

    #[test]
    fn test_validation_error_display() {
        let error = FlashtutorError::validation("flashcards[0].term", "must not be empty");
        assert_eq!(
            error.to_string(),
            "Validation error: flashcards[0].term: must not be empty"
        );
    }

    #[test]
    fn test_persistence_error_display() {
        let error = FlashtutorError::Persistence("database is locked".to_string());
        assert_eq!(error.to_string(), "Persistence error: database is locked");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = FlashtutorError::NotFound("set 42".to_string()).into();
        assert!(matches!(
            err.downcast_ref::<FlashtutorError>(),
            Some(FlashtutorError::NotFound(_))
        ));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FlashtutorError>();
    }
}
