#![forbid(unsafe_code)]

//! The validation engine.
//!
//! - Required fields reject missing, `null` and `""` with `REQUIRED`.
//! - Optional fields accept those without running any rule.
//! - Otherwise rules run in order and the first failure is reported.
//! - Arrays check presence and length bounds first (short-circuiting), then
//!   every item independently so all bad items are reported together.
//! - The form-level resolver only runs when every field passed.

use serde_json::Value;
use tracing::{debug, trace};
use vorm_core::{
    DefaultMessages, ERROR_CODE_INVALID_TYPE, ERROR_CODE_MAX_LENGTH, ERROR_CODE_MIN_LENGTH,
    ERROR_CODE_REQUIRED, ErrorMessages, FieldError, resolve_message,
};

use crate::array_field::ArrayFieldSchema;
use crate::errors::{FieldErrors, FormErrors, index_suffix, merge_under};
use crate::field::FieldSchema;
use crate::input::{FieldInput, is_empty_value};
use crate::schema::{FormSchema, FormValues};

fn field_error(
    code: &str,
    form_messages: Option<&ErrorMessages>,
    field_messages: &ErrorMessages,
    defaults: &DefaultMessages,
) -> FieldError {
    let message = resolve_message(code, &[form_messages, Some(field_messages)], defaults);
    FieldError::new(code, message)
}

// ---------------------------------------------------------------------------
// Scalar fields
// ---------------------------------------------------------------------------

/// Validate one value against a field schema using the built-in defaults.
///
/// `None` means the value is absent. Returns `None` when the value is valid.
#[must_use]
pub fn validate_field<T: FieldInput, O>(
    value: Option<&T>,
    schema: &FieldSchema<T, O>,
    form_messages: Option<&ErrorMessages>,
) -> Option<FieldError> {
    validate_field_with(value, schema, form_messages, DefaultMessages::standard())
}

/// [`validate_field`] with an explicit default message table.
#[must_use]
pub fn validate_field_with<T: FieldInput, O>(
    value: Option<&T>,
    schema: &FieldSchema<T, O>,
    form_messages: Option<&ErrorMessages>,
    defaults: &DefaultMessages,
) -> Option<FieldError> {
    let Some(value) = value.filter(|v| !v.is_blank()) else {
        return schema.is_required().then(|| {
            field_error(ERROR_CODE_REQUIRED, form_messages, schema.messages(), defaults)
        });
    };
    let failed = schema.rules().iter().find(|rule| !rule.validate(value))?;
    Some(field_error(
        failed.code(),
        form_messages,
        schema.messages(),
        defaults,
    ))
}

/// Dynamic-value entry point: empty checks on the raw value, then conversion
/// to `T` (`INVALID_TYPE` on mismatch), then the typed rules.
pub(crate) fn validate_value<T: FieldInput, O>(
    value: Option<&Value>,
    schema: &FieldSchema<T, O>,
    form_messages: Option<&ErrorMessages>,
    defaults: &DefaultMessages,
) -> Option<FieldError> {
    let Some(raw) = value.filter(|v| !is_empty_value(Some(*v))) else {
        return validate_field_with(None, schema, form_messages, defaults);
    };
    match T::from_value(raw) {
        Some(typed) => validate_field_with(Some(&typed), schema, form_messages, defaults),
        None => Some(field_error(
            ERROR_CODE_INVALID_TYPE,
            form_messages,
            schema.messages(),
            defaults,
        )),
    }
}

// ---------------------------------------------------------------------------
// Array fields
// ---------------------------------------------------------------------------

enum ArrayShape {
    /// Optional and empty: nothing to check.
    Skip,
    /// Array-level failure; items are not checked.
    Fail(FieldError),
    /// Presence and bounds are fine; check every item.
    Items,
}

fn check_array_shape<T, O>(
    len: usize,
    schema: &ArrayFieldSchema<T, O>,
    form_messages: Option<&ErrorMessages>,
    defaults: &DefaultMessages,
) -> ArrayShape {
    let fail = |code: &str| {
        ArrayShape::Fail(field_error(code, form_messages, schema.messages(), defaults))
    };
    if len == 0 {
        return if schema.is_required() {
            fail(ERROR_CODE_REQUIRED)
        } else {
            ArrayShape::Skip
        };
    }
    if schema.min_length().is_some_and(|min| len < min) {
        return fail(ERROR_CODE_MIN_LENGTH);
    }
    if schema.max_length().is_some_and(|max| len > max) {
        return fail(ERROR_CODE_MAX_LENGTH);
    }
    ArrayShape::Items
}

/// Validate a list against an array schema using the built-in defaults.
///
/// Array-level errors are keyed `""`, item errors `"[i]"`.
#[must_use]
pub fn validate_array_field<T: FieldInput, O>(
    value: Option<&[T]>,
    schema: &ArrayFieldSchema<T, O>,
    form_messages: Option<&ErrorMessages>,
) -> FieldErrors {
    validate_array_field_with(value, schema, form_messages, DefaultMessages::standard())
}

/// [`validate_array_field`] with an explicit default message table.
#[must_use]
pub fn validate_array_field_with<T: FieldInput, O>(
    value: Option<&[T]>,
    schema: &ArrayFieldSchema<T, O>,
    form_messages: Option<&ErrorMessages>,
    defaults: &DefaultMessages,
) -> FieldErrors {
    let items = value.unwrap_or_default();
    let mut errors = FieldErrors::new();
    match check_array_shape(items.len(), schema, form_messages, defaults) {
        ArrayShape::Skip => {}
        ArrayShape::Fail(error) => {
            errors.insert(String::new(), error);
        }
        ArrayShape::Items => {
            for (i, item) in items.iter().enumerate() {
                if let Some(error) =
                    validate_field_with(Some(item), schema.item(), form_messages, defaults)
                {
                    errors.insert(index_suffix(i), error);
                }
            }
        }
    }
    errors
}

pub(crate) fn validate_array_value<T: FieldInput, O>(
    value: Option<&Value>,
    schema: &ArrayFieldSchema<T, O>,
    form_messages: Option<&ErrorMessages>,
    defaults: &DefaultMessages,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let items: &[Value] = match value {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(_) => {
            let error = field_error(
                ERROR_CODE_INVALID_TYPE,
                form_messages,
                schema.messages(),
                defaults,
            );
            errors.insert(String::new(), error);
            return errors;
        }
    };
    match check_array_shape(items.len(), schema, form_messages, defaults) {
        ArrayShape::Skip => {}
        ArrayShape::Fail(error) => {
            errors.insert(String::new(), error);
        }
        ArrayShape::Items => {
            for (i, item) in items.iter().enumerate() {
                if let Some(error) =
                    validate_value(Some(item), schema.item(), form_messages, defaults)
                {
                    errors.insert(index_suffix(i), error);
                }
            }
        }
    }
    errors
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Validate one named field of a form, returning its errors under full keys
/// (`name`, `name[i]`). Unknown names yield no errors.
#[must_use]
pub fn validate_form_field(values: &FormValues, schema: &FormSchema, name: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    if let Some(entry) = schema.field(name) {
        let field_errors = entry.validate_entry(
            values.get(name),
            schema.field_messages(name),
            schema.default_messages(),
        );
        trace!(field = name, errors = field_errors.len(), "field validated");
        merge_under(&mut errors, name, field_errors);
    }
    errors
}

/// Validate every field, then (only if all passed) the resolver.
#[must_use]
pub fn validate_form(values: &FormValues, schema: &FormSchema) -> FormErrors {
    let mut errors = FormErrors::new();
    for name in schema.fields().keys() {
        errors.extend(validate_form_field(values, schema, name));
    }
    if !errors.is_empty() {
        return errors;
    }
    if schema.has_resolver() {
        debug!("running cross-field resolver");
        if let Some(resolved) = schema.resolve(values) {
            errors.extend(resolved);
        }
    }
    errors
}
