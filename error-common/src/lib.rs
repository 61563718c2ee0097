//! Common error handling for the Ibhayi pharmacy platform.
//!
//! Every crate in the workspace funnels its failures into [`PharmacyError`] at
//! the boundaries where errors cross crate lines (binaries, service crates).
//! The HTTP layer has its own `ApiError` that knows about status codes; this
//! type deliberately does not.

use thiserror::Error;

/// Platform-wide error enum.
#[derive(Error, Debug)]
pub enum PharmacyError {
    /// Server startup / bind / shutdown errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Authentication / authorization errors
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Domain rule violations (no repeats left, insufficient stock, ...)
    #[error("Business rule violation: {0}")]
    BusinessError(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// External service errors (SMTP, file storage)
    #[error("External service error: {0}")]
    ExternalError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for platform operations.
pub type Result<T> = std::result::Result<T, PharmacyError>;

/// Log an error with its originating context.
pub fn log_error(context: &str, error: &PharmacyError) {
    tracing::error!(
        context = context,
        error = %error,
        "pharmacy platform error"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        let err = PharmacyError::BusinessError("no repeats left".into());
        assert_eq!(err.to_string(), "Business rule violation: no repeats left");
    }

    #[test]
    fn anyhow_errors_wrap_transparently() {
        let err: PharmacyError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.to_string(), "disk full");
    }
}
