#![forbid(unsafe_code)]

//! Adapter for form libraries that accept a `(values) -> { values, errors }`
//! resolver with `{ type, message }` errors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::output::{FormOutput, build_output_values};
use crate::schema::{FormSchema, FormValues};
use crate::validate::validate_form;

/// One error in the adapter's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverFieldError {
    /// The error code.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// Resolver result: built values and no errors, or empty values and errors.
#[derive(Debug, Clone, Default)]
pub struct ResolverResult {
    pub values: FormOutput,
    pub errors: IndexMap<String, ResolverFieldError>,
}

impl ResolverResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Wrap `schema` as a resolver.
///
/// String inputs of fields with a `parse` function are parsed first; the
/// parsed values are what gets validated and built.
pub fn create_resolver(schema: FormSchema) -> impl Fn(&FormValues) -> ResolverResult + Send + Sync {
    move |values: &FormValues| {
        let parsed = apply_parse(values, &schema);
        let errors = validate_form(&parsed, &schema);
        if !errors.is_empty() {
            return ResolverResult {
                values: FormOutput::default(),
                errors: errors
                    .into_iter()
                    .map(|(key, err)| {
                        let error = ResolverFieldError {
                            kind: err.code,
                            message: err.message,
                        };
                        (key, error)
                    })
                    .collect(),
            };
        }
        match build_output_values(&parsed, schema.fields()) {
            Ok(values) => ResolverResult {
                values,
                errors: IndexMap::new(),
            },
            Err(err) => {
                let mut errors = IndexMap::new();
                errors.insert(
                    err.field.clone(),
                    ResolverFieldError {
                        kind: err.code.clone(),
                        message: err.to_string(),
                    },
                );
                ResolverResult {
                    values: FormOutput::default(),
                    errors,
                }
            }
        }
    }
}

fn apply_parse(values: &FormValues, schema: &FormSchema) -> FormValues {
    let mut parsed = values.clone();
    for (name, entry) in schema.fields() {
        let Some(Value::String(raw)) = values.get(name) else {
            continue;
        };
        if let Some(value) = entry.parse_raw(raw) {
            parsed.insert(name.clone(), value);
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vorm_core::{Branded, ValueObject, brand, rules, vo};

    use super::*;
    use crate::field::{FieldOptions, create_field, create_primitive_field};
    use crate::schema::create_form_schema;

    brand!(Email);

    fn schema() -> FormSchema {
        let email: ValueObject<String, Email> = vo(vec![rules::email()]);
        create_form_schema()
            .field("email", create_field(email, FieldOptions::new()).required())
            .field(
                "age",
                create_primitive_field(
                    vec![rules::min(18_i64)],
                    FieldOptions::new().parse(|raw: &str| raw.trim().parse::<i64>().unwrap_or(0)),
                )
                .optional(),
            )
            .build()
    }

    #[test]
    fn errors_use_type_and_message() {
        let resolve = create_resolver(schema());
        let input = json!({"email": "", "age": "12"});
        let result = resolve(input.as_object().unwrap());
        assert!(!result.is_valid());
        assert!(result.values.is_empty());
        assert_eq!(result.errors["email"].kind, "REQUIRED");
        assert_eq!(result.errors["email"].message, "This field is required");
        assert_eq!(result.errors["age"].kind, "MIN");
        assert_eq!(
            serde_json::to_value(&result.errors["age"]).unwrap(),
            json!({"type": "MIN", "message": "MIN"})
        );
    }

    #[test]
    fn success_returns_built_values() {
        let resolve = create_resolver(schema());
        let input = json!({"email": "a@example.com", "age": " 30 "});
        let result = resolve(input.as_object().unwrap());
        assert!(result.is_valid());
        let email = result.values.get::<Branded<String, Email>>("email").unwrap();
        assert_eq!(email.as_str(), "a@example.com");
        assert_eq!(result.values.get::<i64>("age"), Some(&30));
    }
}
