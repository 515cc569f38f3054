#![forbid(unsafe_code)]

//! Error values shared by every layer.
//!
//! Validation failures are data ([`FieldError`]) and never travel through
//! `Err`. Only eager value-object construction fails hard
//! ([`VoValidationError`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code for a missing required value.
pub const ERROR_CODE_REQUIRED: &str = "REQUIRED";
/// Error code for an array shorter than its minimum length.
pub const ERROR_CODE_MIN_LENGTH: &str = "MIN_LENGTH";
/// Error code for an array longer than its maximum length.
pub const ERROR_CODE_MAX_LENGTH: &str = "MAX_LENGTH";
/// Error code for a value that cannot be read as the field's input type.
pub const ERROR_CODE_INVALID_TYPE: &str = "INVALID_TYPE";

/// A reported validation failure, ready for display.
///
/// Both fields are always populated: `message` is the fully resolved text,
/// never a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldError {
    /// Stable error code, e.g. `REQUIRED` or a rule code.
    pub code: String,
    /// Human-readable message resolved for `code`.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Failure payload of [`ValueObject::safe_create`](crate::ValueObject::safe_create).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[error("validation failed: {code}")]
pub struct CreateError {
    /// Code of the first rule that rejected the input.
    pub code: String,
}

/// Raised by [`ValueObject::create`](crate::ValueObject::create) when the
/// input breaks one of the value object's rules.
#[derive(Debug, Clone, PartialEq)]
pub struct VoValidationError<T> {
    /// Brand of the value object that refused the input.
    pub brand: String,
    /// Code of the first failing rule.
    pub code: String,
    /// The rejected input, handed back to the caller.
    pub input: T,
}

impl<T> fmt::Display for VoValidationError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: rule {} rejected the input", self.brand, self.code)
    }
}

impl<T: fmt::Debug> std::error::Error for VoValidationError<T> {}

impl<T> VoValidationError<T> {
    /// Drop the input, keeping only the code.
    #[must_use]
    pub fn into_create_error(self) -> CreateError {
        CreateError { code: self.code }
    }
}
