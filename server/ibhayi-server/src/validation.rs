//! Request validation utilities for consistent validation across handlers
//!
//! This module provides a `RequestValidation` trait and helper macros to
//! centralize validation logic and ensure consistent error messages.

use crate::error::ApiError;

/// Trait for validating request payloads
///
/// Implement this trait for all create/update request types to ensure
/// consistent validation across the API.
pub trait RequestValidation {
    /// Validates the request and returns an error if validation fails
    ///
    /// Returns `Ok(())` if validation passes, or `Err(ApiError)` with
    /// a validation error message if validation fails.
    fn validate(&self) -> Result<(), ApiError>;
}

/// Macro for validating fields with custom predicates
///
/// # Usage
///
/// ```ignore
/// validate_field!(self.email, !self.email.trim().is_empty(), "Email is required");
/// validate_field!(self.schedule, self.schedule <= 6, "Schedule must be between 0 and 6");
/// ```
#[macro_export]
macro_rules! validate_field {
    ($field:expr, $predicate:expr, $message:expr) => {
        if !$predicate {
            return Err($crate::error::ApiError::validation($message));
        }
    };
}

/// Macro for validating required fields (non-empty strings)
#[macro_export]
macro_rules! validate_required {
    ($field:expr, $message:expr) => {
        validate_field!($field, !$field.trim().is_empty(), $message);
    };
}

/// Macro for validating string length
#[macro_export]
macro_rules! validate_length {
    ($field:expr, $min:expr, $max:expr, $message:expr) => {
        let len = $field.len();
        validate_field!($field, len >= $min && len <= $max, $message);
    };
}

/// Macro for validating email format (basic check)
#[macro_export]
macro_rules! validate_email {
    ($field:expr, $message:expr) => {
        validate_field!($field, $field.contains('@') && $field.contains('.'), $message);
    };
}

/// Macro for validating numeric ranges
#[macro_export]
macro_rules! validate_range {
    ($field:expr, $min:expr, $max:expr, $message:expr) => {
        validate_field!($field, $field >= $min && $field <= $max, $message);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    struct TestRequest {
        name: String,
        email: String,
        schedule: i32,
    }

    impl RequestValidation for TestRequest {
        fn validate(&self) -> Result<(), ApiError> {
            validate_required!(self.name, "Name is required");
            validate_length!(self.name, 2, 100, "Name must be between 2 and 100 characters");
            validate_email!(self.email, "Invalid email format");
            validate_range!(self.schedule, 0, 6, "Schedule must be between 0 and 6");
            Ok(())
        }
    }

    #[test]
    fn test_validation_success() {
        let request = TestRequest {
            name: "Panado".to_string(),
            email: "orders@medisupply.co.za".to_string(),
            schedule: 2,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_name() {
        let request = TestRequest {
            name: "".to_string(),
            email: "orders@medisupply.co.za".to_string(),
            schedule: 2,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_email() {
        let request = TestRequest {
            name: "Panado".to_string(),
            email: "invalid-email".to_string(),
            schedule: 2,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validation_schedule_out_of_range() {
        let request = TestRequest {
            name: "Panado".to_string(),
            email: "orders@medisupply.co.za".to_string(),
            schedule: 7,
        };
        assert!(request.validate().is_err());
    }
}
