#![forbid(unsafe_code)]

//! Asynchronous field validators.
//!
//! A validator receives the field's current value and resolves to `Ok(None)`
//! when the value is acceptable, `Ok(Some(error))` when it is not, or `Err`
//! when the check itself could not be carried out (network down, etc.).

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;
use vorm_core::FieldError;

use crate::config::AsyncTrigger;

/// Failure of the check itself, as opposed to a validation error.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Result of one asynchronous check.
pub type AsyncCheck = Result<Option<FieldError>, BoxError>;

/// An asynchronous check over a dynamic field value.
///
/// Implemented for any `Fn(Value) -> impl Future<Output = AsyncCheck>`.
pub trait AsyncValidator: Send + Sync {
    fn validate(&self, value: Value) -> BoxFuture<'static, AsyncCheck>;
}

impl<F, Fut> AsyncValidator for F
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = AsyncCheck> + Send + 'static,
{
    fn validate(&self, value: Value) -> BoxFuture<'static, AsyncCheck> {
        self(value).boxed()
    }
}

/// An async validator bound to a field, with its trigger and debounce.
#[derive(Clone)]
pub struct AsyncFieldValidator {
    validator: Arc<dyn AsyncValidator>,
    on: Option<AsyncTrigger>,
    debounce: Option<Duration>,
}

impl fmt::Debug for AsyncFieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFieldValidator")
            .field("on", &self.on)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl AsyncFieldValidator {
    pub fn new(validator: impl AsyncValidator + 'static) -> Self {
        Self {
            validator: Arc::new(validator),
            on: None,
            debounce: None,
        }
    }

    /// Run on `trigger` instead of the form's default trigger.
    #[must_use]
    pub fn on(mut self, trigger: AsyncTrigger) -> Self {
        self.on = Some(trigger);
        self
    }

    /// Delay `change`-triggered checks until input has been quiet for `delay`.
    ///
    /// Has no effect on other triggers. A zero delay runs immediately.
    #[must_use]
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }

    /// The explicitly configured trigger, if any.
    #[must_use]
    pub fn trigger(&self) -> Option<AsyncTrigger> {
        self.on
    }

    /// The configured trigger, else `default`.
    #[must_use]
    pub fn trigger_or(&self, default: AsyncTrigger) -> AsyncTrigger {
        self.on.unwrap_or(default)
    }

    #[must_use]
    pub fn debounce_delay(&self) -> Option<Duration> {
        self.debounce.filter(|delay| !delay.is_zero())
    }

    /// Start a check of `value`.
    pub fn check(&self, value: Value) -> BoxFuture<'static, AsyncCheck> {
        self.validator.validate(value)
    }
}

/// Async validators keyed by field name.
pub type AsyncValidators = IndexMap<String, AsyncFieldValidator>;
