#![forbid(unsafe_code)]

//! Built output values.
//!
//! Output types vary per field (branded values, plain primitives, lists of
//! either), so a [`FormOutput`] stores them type-erased and hands them back
//! through typed accessors.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::errors::BuildError;
use crate::schema::{FieldMap, FormValues};

/// A type-erased output value. Cheap to clone.
#[derive(Clone)]
pub struct OutputValue(Arc<dyn Any + Send + Sync>);

impl OutputValue {
    pub fn new<O: Send + Sync + 'static>(value: O) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the value as `O`, or `None` if it has another type.
    #[must_use]
    pub fn downcast_ref<O: 'static>(&self) -> Option<&O> {
        self.0.downcast_ref::<O>()
    }
}

impl fmt::Debug for OutputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutputValue(..)")
    }
}

/// Output of a successful build: one entry per schema field, `None` for
/// empty inputs.
#[derive(Debug, Clone, Default)]
pub struct FormOutput {
    values: IndexMap<String, Option<OutputValue>>,
}

impl FormOutput {
    /// Scalar output of `name` as `O`.
    #[must_use]
    pub fn get<O: 'static>(&self, name: &str) -> Option<&O> {
        self.values.get(name)?.as_ref()?.downcast_ref::<O>()
    }

    /// Array output of `name`, items typed `O`.
    #[must_use]
    pub fn get_list<O: 'static>(&self, name: &str) -> Option<&[O]> {
        self.get::<Vec<O>>(name).map(Vec::as_slice)
    }

    /// Raw entry for `name`.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&OutputValue> {
        self.values.get(name)?.as_ref()
    }

    /// `true` when `name` is a schema field whose input was empty.
    #[must_use]
    pub fn is_absent(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(None))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, name: String, value: Option<OutputValue>) {
        self.values.insert(name, value);
    }
}

/// Convert validated input values into output values.
///
/// Empty scalars (missing, `null`, `""`) and empty or non-list arrays become
/// absent entries. Everything else goes through the field's value object, or
/// passes through unchanged for plain fields.
///
/// Inputs are expected to have passed [`validate_form`](crate::validate_form);
/// a value that a value object refuses is reported as [`BuildError`].
pub fn build_output_values(values: &FormValues, fields: &FieldMap) -> Result<FormOutput, BuildError> {
    let mut output = FormOutput::default();
    for (name, entry) in fields {
        let value = values.get(name);
        let built = entry.build_entry(name, value).inspect_err(|err| {
            debug!(field = %err.field, code = %err.code, "output build failed");
        })?;
        output.insert(name.clone(), built);
    }
    Ok(output)
}

/// List items of an array input, or `None` when the array is absent/empty.
pub(crate) fn array_items(value: Option<&Value>) -> Option<&Vec<Value>> {
    match value {
        Some(Value::Array(items)) if !items.is_empty() => Some(items),
        _ => None,
    }
}
