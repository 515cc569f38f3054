#![forbid(unsafe_code)]

//! Form schemas: named fields in declaration order, form-level message
//! overrides, an optional cross-field resolver and the default message table.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use vorm_core::{DefaultMessages, ERROR_CODE_INVALID_TYPE, ErrorMessages};

use crate::array_field::ArrayFieldSchema;
use crate::errors::{BuildError, FieldErrors, FormErrors, error_key, index_suffix};
use crate::field::FieldSchema;
use crate::input::{FieldInput, display_value, is_empty_value};
use crate::output::{OutputValue, array_items};
use crate::validate::{validate_array_value, validate_value};

/// Raw form input: field name → dynamic value.
pub type FormValues = serde_json::Map<String, Value>;

/// Fields of a form in declaration order.
pub type FieldMap = IndexMap<String, Arc<dyn SchemaEntry>>;

/// Cross-field check run once every field passes on its own.
pub type Resolver = Arc<dyn Fn(&FormValues) -> Option<FormErrors> + Send + Sync>;

/// A field of any input/output type, seen through dynamic values.
///
/// Implemented by [`FieldSchema`] and [`ArrayFieldSchema`]; `is_array` tells
/// them apart.
pub trait SchemaEntry: Send + Sync {
    fn is_array(&self) -> bool;

    fn is_required(&self) -> bool;

    /// Brand of the backing value object, if any.
    fn brand(&self) -> Option<&str>;

    /// Validate a dynamic value. Keys are relative to the field name: `""`
    /// for the field itself, `"[i]"` for array items.
    fn validate_entry(
        &self,
        value: Option<&Value>,
        form_messages: Option<&ErrorMessages>,
        defaults: &DefaultMessages,
    ) -> FieldErrors;

    /// Build the output value for a validated input. `name` is used in errors.
    fn build_entry(&self, name: &str, value: Option<&Value>)
    -> Result<Option<OutputValue>, BuildError>;

    /// Apply the field's `parse` to raw text, if it has one.
    fn parse_raw(&self, _raw: &str) -> Option<Value> {
        None
    }

    /// Display text for a value: `format` when configured and applicable,
    /// otherwise the plain rendering (`""` for missing values).
    fn format_value(&self, value: Option<&Value>) -> String {
        display_value(value)
    }
}

impl<T, O> SchemaEntry for FieldSchema<T, O>
where
    T: FieldInput,
    O: Send + Sync + 'static,
{
    fn is_array(&self) -> bool {
        false
    }

    fn is_required(&self) -> bool {
        FieldSchema::is_required(self)
    }

    fn brand(&self) -> Option<&str> {
        self.source().brand()
    }

    fn validate_entry(
        &self,
        value: Option<&Value>,
        form_messages: Option<&ErrorMessages>,
        defaults: &DefaultMessages,
    ) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(error) = validate_value(value, self, form_messages, defaults) {
            errors.insert(String::new(), error);
        }
        errors
    }

    fn build_entry(
        &self,
        name: &str,
        value: Option<&Value>,
    ) -> Result<Option<OutputValue>, BuildError> {
        let Some(value) = value.filter(|v| !is_empty_value(Some(*v))) else {
            return Ok(None);
        };
        build_one(self, name, value).map(|out| Some(OutputValue::new(out)))
    }

    fn parse_raw(&self, raw: &str) -> Option<Value> {
        FieldSchema::parse_raw(self, raw).map(|parsed| parsed.to_value())
    }

    fn format_value(&self, value: Option<&Value>) -> String {
        value
            .and_then(T::from_value)
            .and_then(|typed| FieldSchema::format_value(self, &typed))
            .unwrap_or_else(|| display_value(value))
    }
}

impl<T, O> SchemaEntry for ArrayFieldSchema<T, O>
where
    T: FieldInput,
    O: Send + Sync + 'static,
{
    fn is_array(&self) -> bool {
        true
    }

    fn is_required(&self) -> bool {
        ArrayFieldSchema::is_required(self)
    }

    fn brand(&self) -> Option<&str> {
        self.item().source().brand()
    }

    fn validate_entry(
        &self,
        value: Option<&Value>,
        form_messages: Option<&ErrorMessages>,
        defaults: &DefaultMessages,
    ) -> FieldErrors {
        validate_array_value(value, self, form_messages, defaults)
    }

    fn build_entry(
        &self,
        name: &str,
        value: Option<&Value>,
    ) -> Result<Option<OutputValue>, BuildError> {
        let Some(items) = array_items(value) else {
            return Ok(None);
        };
        let built = items
            .iter()
            .enumerate()
            .map(|(i, item)| build_one(self.item(), &error_key(name, &index_suffix(i)), item))
            .collect::<Result<Vec<O>, _>>()?;
        Ok(Some(OutputValue::new(built)))
    }
}

fn build_one<T: FieldInput, O>(
    field: &FieldSchema<T, O>,
    key: &str,
    value: &Value,
) -> Result<O, BuildError> {
    let input = T::from_value(value).ok_or_else(|| BuildError {
        field: key.to_string(),
        brand: field.source().brand().map(str::to_string),
        code: ERROR_CODE_INVALID_TYPE.to_string(),
    })?;
    field.create(input).map_err(|err| BuildError {
        field: key.to_string(),
        brand: Some(err.brand),
        code: err.code,
    })
}

// ---------------------------------------------------------------------------
// FormSchema
// ---------------------------------------------------------------------------

/// Immutable description of a form.
#[derive(Clone)]
pub struct FormSchema {
    fields: FieldMap,
    messages: IndexMap<String, ErrorMessages>,
    resolver: Option<Resolver>,
    defaults: DefaultMessages,
}

impl FormSchema {
    #[must_use]
    pub fn builder() -> FormSchemaBuilder {
        FormSchemaBuilder::default()
    }

    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Arc<dyn SchemaEntry>> {
        self.fields.get(name)
    }

    /// Form-level message override for `name`; takes priority over the
    /// field's own messages.
    #[must_use]
    pub fn field_messages(&self, name: &str) -> Option<&ErrorMessages> {
        self.messages.get(name)
    }

    #[must_use]
    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Run the cross-field resolver, if any.
    #[must_use]
    pub fn resolve(&self, values: &FormValues) -> Option<FormErrors> {
        self.resolver.as_ref().and_then(|resolver| resolver(values))
    }

    #[must_use]
    pub fn default_messages(&self) -> &DefaultMessages {
        &self.defaults
    }
}

impl fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSchema")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("messages", &self.messages)
            .field("resolver", &self.resolver.is_some())
            .field("defaults", &self.defaults)
            .finish()
    }
}

/// Builder for [`FormSchema`].
#[derive(Default)]
pub struct FormSchemaBuilder {
    fields: FieldMap,
    messages: IndexMap<String, ErrorMessages>,
    resolver: Option<Resolver>,
    defaults: Option<DefaultMessages>,
}

impl FormSchemaBuilder {
    /// Add a field. Re-adding a name replaces the earlier field in place.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, entry: impl SchemaEntry + 'static) -> Self {
        self.fields.insert(name.into(), Arc::new(entry));
        self
    }

    /// Form-level messages for one field.
    #[must_use]
    pub fn messages(mut self, name: impl Into<String>, messages: ErrorMessages) -> Self {
        self.messages.insert(name.into(), messages);
        self
    }

    #[must_use]
    pub fn resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&FormValues) -> Option<FormErrors> + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Replace the built-in default message table.
    #[must_use]
    pub fn default_messages(mut self, defaults: DefaultMessages) -> Self {
        self.defaults = Some(defaults);
        self
    }

    #[must_use]
    pub fn build(self) -> FormSchema {
        FormSchema {
            fields: self.fields,
            messages: self.messages,
            resolver: self.resolver,
            defaults: self
                .defaults
                .unwrap_or_else(|| DefaultMessages::standard().clone()),
        }
    }
}

/// Start a form schema; same as [`FormSchema::builder`].
#[must_use]
pub fn create_form_schema() -> FormSchemaBuilder {
    FormSchema::builder()
}
