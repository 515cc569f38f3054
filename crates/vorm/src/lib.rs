#![forbid(unsafe_code)]

//! vorm public facade crate.
//!
//! Re-exports the value-object layer ([`core`]), form schemas and the
//! validation engine ([`form`]) and, with the default `runtime` feature,
//! the reactive form controller ([`runtime`]). Most applications only need
//! the [`prelude`].
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use vorm::prelude::*;
//!
//! brand!(pub Age);
//!
//! let age: ValueObject<i64, Age> = vo(vec![rules::range(0, 150)]);
//! let schema = create_form_schema()
//!     .field("age", create_field(age, FieldOptions::new()).required())
//!     .build();
//!
//! let values = json!({"age": 200});
//! let errors = validate_form(values.as_object().unwrap(), &schema);
//! assert_eq!(errors["age"].code, "RANGE");
//! ```

// --- Core re-exports -------------------------------------------------------

pub use vorm_core::{
    Brand, Branded, CreateError, DefaultMessages, ErrorMessages, FieldError, Rule,
    StandardSchema, ValueObject, VoValidationError, brand, create_plain_rule, create_rule,
    resolve_message, rules, vo,
};

// --- Form re-exports -------------------------------------------------------

pub use vorm_form::{
    ArrayOptions, BuildError, FieldOptions, FormErrors, FormOutput, FormSchema, FormValues,
    create_array_field, create_field, create_form_schema, create_primitive_array_field,
    create_primitive_field, create_resolver, validate_form, validate_form_field,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use vorm_runtime::{
    AsyncFieldValidator, AsyncTrigger, FieldHandle, FormConfig, FormController, FormError,
    FormOptions, FormState, SubmitOutcome, ValidationMode,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for vorm applications.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value object refused its input.
    #[error(transparent)]
    Create(#[from] CreateError),
    /// Validated values could not be converted to output.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// A controller operation failed.
    #[cfg(feature = "runtime")]
    #[error(transparent)]
    Form(FormError),
}

#[cfg(feature = "runtime")]
impl From<FormError> for Error {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Build(build) => Self::Build(build),
            other => Self::Form(other),
        }
    }
}

/// Standard result type for vorm APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ArrayOptions, Brand, Branded, Error, FieldError, FieldOptions, FormErrors, FormOutput,
        FormSchema, FormValues, Result, ValueObject, brand, create_array_field, create_field,
        create_form_schema, create_primitive_array_field, create_primitive_field, rules,
        validate_form, vo,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{
        AsyncFieldValidator, AsyncTrigger, FormController, FormOptions, SubmitOutcome,
        ValidationMode,
    };

    pub use crate::{core, form};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use vorm_core as core;
pub use vorm_form as form;
#[cfg(feature = "runtime")]
pub use vorm_runtime as runtime;
