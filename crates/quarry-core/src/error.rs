//! Core error types for quarry.
//!
//! [`QuarryError`] covers the handful of conditions the query layer can
//! report itself. Database and driver errors never surface here; they belong
//! to whatever executes the compiled SQL.

use thiserror::Error;

/// The primary error type for quarry.
#[derive(Error, Debug)]
pub enum QuarryError {
    // ── Dispatch ─────────────────────────────────────────────────────

    /// A dynamic call matched neither a registered scope nor a builder method.
    #[error("Call to undefined method {entity}::{method}()")]
    MethodNotFound {
        /// The entity the query targets.
        entity: String,
        /// The requested method name.
        method: String,
    },

    // ── Query construction ───────────────────────────────────────────

    /// A comparison operator was not recognised.
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// A builder method received arguments of the wrong shape.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl QuarryError {
    /// Returns a short, stable code identifying the error category.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MethodNotFound { .. } => "method_not_found",
            Self::InvalidOperator(_) => "invalid_operator",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::ConfigurationError(_) => "configuration",
            Self::SerializationError(_) => "serialization",
        }
    }

    /// Shorthand for building a [`QuarryError::MethodNotFound`].
    pub fn method_not_found(entity: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            entity: entity.into(),
            method: method.into(),
        }
    }
}

/// A convenience type alias for `Result<T, QuarryError>`.
pub type QuarryResult<T> = Result<T, QuarryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_found_display() {
        let err = QuarryError::method_not_found("User", "popular");
        assert_eq!(err.to_string(), "Call to undefined method User::popular()");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            QuarryError::method_not_found("User", "x").kind(),
            "method_not_found"
        );
        assert_eq!(QuarryError::InvalidOperator("~~".into()).kind(), "invalid_operator");
        assert_eq!(QuarryError::InvalidArgument("x".into()).kind(), "invalid_argument");
        assert_eq!(QuarryError::ConfigurationError("x".into()).kind(), "configuration");
        assert_eq!(QuarryError::SerializationError("x".into()).kind(), "serialization");
    }

    #[test]
    fn test_invalid_operator_display() {
        let err = QuarryError::InvalidOperator("=~".into());
        assert_eq!(err.to_string(), "Invalid operator: =~");
    }

    #[test]
    fn test_unreadable_config_file_is_configuration_error() {
        let err = crate::settings_loader::from_json_file("/definitely/not/here/quarry.json")
            .unwrap_err();
        assert_eq!(err.kind(), "configuration");
        assert!(err.to_string().contains("Failed to read JSON file"));
    }
}
