#![forbid(unsafe_code)]

//! vorm form schemas.
//!
//! Fields bind a value object (or plain rules) to a required/optional policy
//! and messages; forms group fields, per-field message overrides and an
//! optional cross-field resolver. The engine validates dynamic
//! [`FormValues`] against a [`FormSchema`] and, once clean, builds typed
//! output values.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use vorm_core::{brand, rules, vo, Branded, ValueObject};
//! use vorm_form::{
//!     FieldOptions, build_output_values, create_field, create_form_schema, validate_form,
//! };
//!
//! brand!(Email);
//!
//! let email: ValueObject<String, Email> = vo(vec![rules::email()]);
//! let schema = create_form_schema()
//!     .field("email", create_field(email, FieldOptions::new()).required())
//!     .build();
//!
//! let bad = json!({"email": ""});
//! let errors = validate_form(bad.as_object().unwrap(), &schema);
//! assert_eq!(errors["email"].code, "REQUIRED");
//!
//! let good = json!({"email": "ada@example.com"});
//! assert!(validate_form(good.as_object().unwrap(), &schema).is_empty());
//! let output = build_output_values(good.as_object().unwrap(), schema.fields()).unwrap();
//! let email = output.get::<Branded<String, Email>>("email").unwrap();
//! assert_eq!(email.as_str(), "ada@example.com");
//! ```

pub mod array_field;
pub mod errors;
pub mod field;
pub mod input;
pub mod output;
pub mod resolver;
pub mod schema;
mod standard;
pub mod validate;

pub use array_field::{
    ArrayFieldFactory, ArrayFieldSchema, ArrayOptions, create_array_field,
    create_primitive_array_field,
};
pub use errors::{BuildError, FieldErrors, FieldPath, FormErrors, error_key, parse_field_path};
pub use field::{
    FieldFactory, FieldOptions, FieldSchema, FieldSource, FormatFn, ParseFn, SiteOptions,
    create_field, create_primitive_field,
};
pub use input::{FieldInput, display_value, is_empty_value};
pub use output::{FormOutput, OutputValue, build_output_values};
pub use resolver::{ResolverFieldError, ResolverResult, create_resolver};
pub use schema::{
    FieldMap, FormSchema, FormSchemaBuilder, FormValues, Resolver, SchemaEntry, create_form_schema,
};
pub use validate::{
    validate_array_field, validate_array_field_with, validate_field, validate_field_with,
    validate_form, validate_form_field,
};
