#![forbid(unsafe_code)]

use vorm_form::BuildError;

use crate::async_validator::BoxError;

/// Hard failures of controller operations.
///
/// Validation failures are not errors: they are reported as
/// [`FormErrors`](vorm_form::FormErrors) in the store.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// An async validator could not perform its check.
    #[error("async validator for `{field}` failed: {source}")]
    AsyncValidator {
        field: String,
        #[source]
        source: BoxError,
    },
    /// Validated values could not be converted to output.
    #[error(transparent)]
    Build(#[from] BuildError),
}

pub type Result<T, E = FormError> = std::result::Result<T, E>;
