#![forbid(unsafe_code)]

//! Value-object definitions: a brand plus an ordered rule list.

use std::fmt;
use std::marker::PhantomData;

use tracing::trace;

use crate::brand::{Brand, Branded};
use crate::error::{CreateError, VoValidationError};
use crate::rule::Rule;

/// Result of [`ValueObject::safe_create`].
pub type CreateResult<T> = Result<T, CreateError>;

/// Anything a field can be built from: rules to validate with and a
/// constructor that turns a valid input into the output value.
///
/// [`ValueObject`] is the canonical implementation; custom types may
/// implement this to plug their own output types into a form.
pub trait ValueObjectLike<T>: Send + Sync {
    /// Value produced by [`create`](Self::create).
    type Output;

    /// Brand name used in construction failures.
    fn brand(&self) -> &str;

    /// Rules in evaluation order.
    fn rules(&self) -> &[Rule<T>];

    /// Validate `input` and convert it, failing on the first broken rule.
    fn create(&self, input: T) -> Result<Self::Output, VoValidationError<T>>;
}

/// A rule-validated constructor for [`Branded<T, B>`] values.
pub struct ValueObject<T, B: Brand> {
    rules: Vec<Rule<T>>,
    _brand: PhantomData<fn() -> B>,
}

/// Define a value object branded `B` with rules evaluated in the given order.
#[must_use]
pub fn vo<T, B: Brand>(rules: Vec<Rule<T>>) -> ValueObject<T, B> {
    ValueObject {
        rules,
        _brand: PhantomData,
    }
}

impl<T, B: Brand> ValueObject<T, B> {
    #[must_use]
    pub fn brand(&self) -> &'static str {
        B::NAME
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    /// Brand `input`, or return the brand, failing code and the input back.
    pub fn create(&self, input: T) -> Result<Branded<T, B>, VoValidationError<T>> {
        match self.first_failure(&input) {
            None => Ok(Branded::new_unchecked(input)),
            Some(code) => Err(VoValidationError {
                brand: B::NAME.to_string(),
                code: code.to_string(),
                input,
            }),
        }
    }

    /// Same checks as [`create`](Self::create), reporting only the code.
    pub fn safe_create(&self, input: T) -> CreateResult<Branded<T, B>> {
        match self.first_failure(&input) {
            None => Ok(Branded::new_unchecked(input)),
            Some(code) => Err(CreateError {
                code: code.to_string(),
            }),
        }
    }

    fn first_failure(&self, input: &T) -> Option<&str> {
        let failed = self.rules.iter().find(|rule| !rule.validate(input))?;
        trace!(brand = B::NAME, code = failed.code(), "value object rejected input");
        Some(failed.code())
    }
}

impl<T, B> ValueObjectLike<T> for ValueObject<T, B>
where
    T: Send + Sync + 'static,
    B: Brand,
{
    type Output = Branded<T, B>;

    fn brand(&self) -> &str {
        B::NAME
    }

    fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    fn create(&self, input: T) -> Result<Self::Output, VoValidationError<T>> {
        ValueObject::create(self, input)
    }
}

impl<T, B: Brand> Clone for ValueObject<T, B> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
            _brand: PhantomData,
        }
    }
}

impl<T, B: Brand> fmt::Debug for ValueObject<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueObject")
            .field("brand", &B::NAME)
            .field("rules", &self.rules)
            .finish()
    }
}
