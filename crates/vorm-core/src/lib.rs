#![forbid(unsafe_code)]

//! vorm core: branded values, validation rules and value objects.
//!
//! This crate provides the leaf building blocks the form engine is made of:
//! - [`Brand`] / [`Branded`] - zero-cost nominal wrappers that keep two
//!   validated values of the same base type apart at compile time
//! - [`Rule`] - a named predicate, usually produced by a rule factory
//!   ([`create_rule`], [`create_plain_rule`]) or taken from [`rules`]
//! - [`ValueObject`] - a brand plus an ordered rule list with eager
//!   ([`ValueObject::create`]) and non-failing ([`ValueObject::safe_create`])
//!   construction
//! - [`ErrorMessages`] / [`resolve_message`] - priority lookup from error
//!   code to display text
//!
//! # Example
//!
//! ```rust
//! use vorm_core::{brand, rules, vo, ValueObject};
//!
//! brand!(pub Username);
//!
//! let username: ValueObject<String, Username> =
//!     vo(vec![rules::min_length(3), rules::max_length(16)]);
//!
//! let name = username.create("alice".to_string()).unwrap();
//! assert_eq!(name.as_str(), "alice");
//! assert_eq!(username.safe_create("al".to_string()).unwrap_err().code, "MIN_LENGTH");
//! ```

pub mod brand;
pub mod error;
pub mod messages;
pub mod rule;
pub mod rules;
pub mod standard_schema;
pub mod value_object;

pub use brand::{Brand, Branded};
pub use error::{
    CreateError, ERROR_CODE_INVALID_TYPE, ERROR_CODE_MAX_LENGTH, ERROR_CODE_MIN_LENGTH,
    ERROR_CODE_REQUIRED, FieldError, VoValidationError,
};
pub use messages::{DefaultMessages, ErrorMessages, MessageContext, merge_messages, resolve_message};
pub use rule::{Rule, create_plain_rule, create_rule};
pub use standard_schema::{Issue, PathSegment, STANDARD_SCHEMA_VERSION, StandardSchema, VENDOR};
pub use value_object::{CreateResult, ValueObject, ValueObjectLike, vo};
