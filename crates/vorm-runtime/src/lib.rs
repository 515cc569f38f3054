#![forbid(unsafe_code)]

//! vorm runtime: reactive form state and asynchronous validation.
//!
//! - [`FormStore`] holds immutable state snapshots with whole-form and
//!   per-field subscriptions.
//! - [`AsyncValidationCoordinator`] tracks in-flight checks and debounce
//!   timers per field, discarding superseded results.
//! - [`FormController`] drives both from a [`FormSchema`](vorm_form::FormSchema)
//!   according to a [`ValidationMode`].
//!
//! # Example
//!
//! ```rust
//! use serde_json::{json, Value};
//! use vorm_core::{rules, FieldError};
//! use vorm_form::{create_form_schema, create_primitive_field, FieldOptions};
//! use vorm_runtime::{AsyncFieldValidator, FormController, FormOptions, SubmitOutcome};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), vorm_runtime::FormError> {
//! let schema = create_form_schema()
//!     .field(
//!         "username",
//!         create_primitive_field(vec![rules::min_length(3)], FieldOptions::<String>::new())
//!             .required(),
//!     )
//!     .build();
//!
//! let taken = |value: Value| async move {
//!     let error = (value == "admin").then(|| FieldError::new("TAKEN", "Username is taken"));
//!     Ok::<_, vorm_runtime::BoxError>(error)
//! };
//! let form = FormController::new(
//!     schema,
//!     FormOptions::new().async_validator("username", AsyncFieldValidator::new(taken)),
//! );
//!
//! form.set_field_value("username", json!("admin"));
//! let outcome = form.submit(|_output| async {}).await?;
//! assert!(!outcome.is_submitted());
//! assert_eq!(form.errors()["username"].code, "TAKEN");
//!
//! form.set_field_value("username", json!("ada"));
//! assert_eq!(form.submit(|_output| async {}).await?, SubmitOutcome::Submitted(()));
//! # Ok(())
//! # }
//! ```

pub mod async_validator;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod store;

pub use async_validator::{
    AsyncCheck, AsyncFieldValidator, AsyncValidator, AsyncValidators, BoxError,
};
pub use config::{
    AsyncTrigger, DEFAULT_TRACE_CAPACITY, ENV_ASYNC_TRIGGER, ENV_TRACE_CAPACITY,
    ENV_VALIDATION_MODE, FormConfig, FormOptions, ParseConfigError, ValidationMode,
};
pub use controller::{FieldHandle, FormController, SubmitOutcome};
pub use coordinator::{
    AsyncValidationCoordinator, Completion, InFlightValidation, SharedValidationCoordinator,
    ValidationEvent, ValidationToken, ValidationTrace,
};
pub use error::{FormError, Result};
pub use store::{FieldSnapshot, FormState, FormStore, Subscription};
