#![forbid(unsafe_code)]

//! Form controller: the store, the schema and the async coordinator wired
//! together according to a [`ValidationMode`].
//!
//! Synchronous validation always finishes before a field's async check is
//! scheduled, and a field whose synchronous rules fail never reaches its
//! async validator. Background checks (triggered by `change`/`blur`) run as
//! tokio tasks; `validate_async` and `submit` await theirs in place.
//!
//! Only results the coordinator reports as [`Completion::Applied`] reach the
//! store. The `is_validating` flag mirrors the coordinator and is rewritten
//! under the same lock as every result.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{AbortHandle, AbortRegistration, Abortable, BoxFuture, join_all};
use parking_lot::ReentrantMutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, warn};
use vorm_core::FieldError;
use vorm_form::{
    FormErrors, FormOutput, FormSchema, FormValues, build_output_values, display_value,
    parse_field_path, validate_form, validate_form_field,
};

use crate::async_validator::{AsyncCheck, AsyncFieldValidator, AsyncValidators};
use crate::config::{AsyncTrigger, FormConfig, FormOptions, ValidationMode};
use crate::coordinator::{Completion, SharedValidationCoordinator, ValidationToken};
use crate::error::{FormError, Result};
use crate::store::{FormState, FormStore};

// ---------------------------------------------------------------------------
// FormController
// ---------------------------------------------------------------------------

struct Inner {
    schema: FormSchema,
    store: FormStore,
    config: FormConfig,
    validators: AsyncValidators,
    coordinator: SharedValidationCoordinator,
    defaults: FormValues,
    /// Serializes coordinator decisions with the store writes they allow.
    sync: ReentrantMutex<()>,
}

/// A live form. Cloning yields another handle to the same form.
#[derive(Clone)]
pub struct FormController {
    inner: Arc<Inner>,
}

impl fmt::Debug for FormController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("config", &self.inner.config)
            .field("fields", &self.inner.schema.fields().len())
            .field("async_validators", &self.inner.validators.len())
            .finish_non_exhaustive()
    }
}

/// What [`FormController::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<R = ()> {
    /// Every check passed and the handler ran, returning `R`.
    Submitted(R),
    /// Synchronous or asynchronous errors blocked the handler.
    Invalid(FormErrors),
}

impl<R> SubmitOutcome<R> {
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

impl FormController {
    #[must_use]
    pub fn new(schema: FormSchema, options: FormOptions) -> Self {
        let FormOptions {
            default_values,
            config,
            async_validators,
        } = options;
        Self {
            inner: Arc::new(Inner {
                schema,
                store: FormStore::new(default_values.clone()),
                coordinator: SharedValidationCoordinator::with_trace_capacity(
                    config.trace_capacity,
                ),
                config,
                validators: async_validators,
                defaults: default_values,
                sync: ReentrantMutex::new(()),
            }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &FormStore {
        &self.inner.store
    }

    #[must_use]
    pub fn schema(&self) -> &FormSchema {
        &self.inner.schema
    }

    #[must_use]
    pub fn config(&self) -> &FormConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn coordinator(&self) -> &SharedValidationCoordinator {
        &self.inner.coordinator
    }

    #[must_use]
    pub fn state(&self) -> Arc<FormState> {
        self.inner.store.get_state()
    }

    #[must_use]
    pub fn values(&self) -> FormValues {
        self.state().values.clone()
    }

    #[must_use]
    pub fn errors(&self) -> FormErrors {
        self.state().errors.clone()
    }

    /// No error is currently recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.state().errors.is_empty()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state().is_dirty
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.state().is_submitting
    }

    #[must_use]
    pub fn is_validating(&self) -> bool {
        self.state().is_validating
    }

    // -- Mutations ----------------------------------------------------------

    /// Store `value`; validate per the mode (`OnChange`, or `OnTouched` once
    /// the field has been touched).
    ///
    /// Async work started for the previous value is cancelled.
    pub fn set_field_value(&self, name: &str, value: Value) {
        let _guard = self.inner.sync.lock();
        self.inner.store.set_field_value(name, value);
        self.cancel_async(name);
        let validate = match self.inner.config.mode {
            ValidationMode::OnChange => true,
            ValidationMode::OnTouched => self.state().is_touched(name),
            ValidationMode::OnBlur | ValidationMode::OnSubmit => false,
        };
        if validate {
            self.validate_single_field(name, Some(AsyncTrigger::Change));
        }
    }

    /// Mark `name` touched; validate per the mode.
    ///
    /// In `OnChange`/`OnSubmit` modes no synchronous error is written, but
    /// `blur` async checks still run when the synchronous rules pass.
    pub fn set_field_touched(&self, name: &str) {
        let _guard = self.inner.sync.lock();
        self.inner.store.set_field_touched(name, true);
        match self.inner.config.mode {
            ValidationMode::OnBlur | ValidationMode::OnTouched => {
                self.validate_single_field(name, Some(AsyncTrigger::Blur));
            }
            ValidationMode::OnChange | ValidationMode::OnSubmit => {
                if self.inner.schema.field(name).is_some() {
                    self.schedule_async(name, AsyncTrigger::Blur);
                }
            }
        }
    }

    pub fn set_field_error(&self, name: &str, error: FieldError) {
        self.inner.store.set_field_error(name, error);
    }

    /// Clear one error, or all of them when `name` is `None`.
    pub fn clear_field_error(&self, name: Option<&str>) {
        self.inner.store.clear_field_error(name);
    }

    /// Restore the defaults (with `values` merged over them), cancel every
    /// async check and timer, and clear errors, touched fields and flags.
    pub fn reset(&self, values: Option<FormValues>) {
        let _guard = self.inner.sync.lock();
        let mut next = self.inner.defaults.clone();
        if let Some(values) = values {
            next.extend(values);
        }
        let cancelled = self.inner.coordinator.cancel_all();
        debug!(cancelled, "form reset");
        self.inner.store.reset(next);
    }

    // -- Validation ---------------------------------------------------------

    /// Validate one field, or the whole form (resolver included).
    ///
    /// Writes the result to the store and returns whether it was clean.
    /// Unknown field names are valid.
    pub fn validate(&self, name: Option<&str>) -> bool {
        let _guard = self.inner.sync.lock();
        let state = self.state();
        match name {
            Some(name) => {
                if self.inner.schema.field(name).is_none() {
                    return true;
                }
                let errors = validate_form_field(&state.values, &self.inner.schema, name);
                let clean = errors.is_empty();
                self.write_field_errors(name, errors);
                clean
            }
            None => {
                let errors = validate_form(&state.values, &self.inner.schema);
                let clean = errors.is_empty();
                self.inner.store.set_errors(errors);
                clean
            }
        }
    }

    /// [`validate`](Self::validate), then the async validators of the
    /// validated fields, awaited.
    ///
    /// A check superseded by a newer one for the same field counts as clean.
    pub async fn validate_async(&self, name: Option<&str>) -> Result<bool> {
        if !self.validate(name) {
            return Ok(false);
        }
        let values = self.state().values.clone();
        match name {
            Some(name) => {
                if self.inner.schema.field(name).is_none() {
                    return Ok(true);
                }
                let Some(validator) = self.inner.validators.get(name) else {
                    return Ok(true);
                };
                let error = self.run_check(name, field_value(&values, name), validator).await?;
                Ok(error.is_none())
            }
            None => {
                let checks = self.inner.validators.iter().map(|(name, validator)| {
                    self.run_check(name, field_value(&values, name), validator)
                });
                let mut clean = true;
                for result in join_all(checks).await {
                    clean &= result?.is_none();
                }
                Ok(clean)
            }
        }
    }

    /// Validate everything, run every async validator concurrently, and
    /// hand the built output to `handler` only if nothing failed.
    ///
    /// `is_submitting` is true while `handler` runs, and reset afterwards
    /// even if the returned future is dropped.
    pub async fn submit<F, Fut, R>(&self, handler: F) -> Result<SubmitOutcome<R>>
    where
        F: FnOnce(FormOutput) -> Fut,
        Fut: Future<Output = R>,
    {
        let values = {
            let _guard = self.inner.sync.lock();
            let values = self.state().values.clone();
            let errors = validate_form(&values, &self.inner.schema);
            self.inner.store.set_errors(errors.clone());
            if !errors.is_empty() {
                debug!(errors = errors.len(), "submit blocked by field errors");
                return Ok(SubmitOutcome::Invalid(errors));
            }
            values
        };

        let checks = self.inner.validators.iter().map(|(name, validator)| {
            let values = &values;
            async move {
                if !self.sync_passes(values, name) {
                    return Ok((name, None));
                }
                let error = self.run_check(name, field_value(values, name), validator).await?;
                Ok::<_, FormError>((name, error))
            }
        });
        let mut async_errors = FormErrors::new();
        for result in join_all(checks).await {
            if let (name, Some(error)) = result? {
                async_errors.insert(name.clone(), error);
            }
        }
        if !async_errors.is_empty() {
            debug!(errors = async_errors.len(), "submit blocked by async errors");
            return Ok(SubmitOutcome::Invalid(async_errors));
        }

        self.inner.store.set_is_submitting(true);
        let _submitting = SubmittingGuard(&self.inner.store);
        let output = build_output_values(&values, self.inner.schema.fields())?;
        debug!(fields = output.len(), "submitting");
        Ok(SubmitOutcome::Submitted(handler(output).await))
    }

    /// A view of one field with change/blur callbacks.
    #[must_use]
    pub fn field(&self, name: &str) -> FieldHandle {
        let state = self.state();
        let value = state.values.get(name).cloned();
        let formatted_value = match self.inner.schema.field(name) {
            Some(entry) => entry.format_value(value.as_ref()),
            None => display_value(value.as_ref()),
        };
        FieldHandle {
            is_dirty: value.as_ref() != self.inner.defaults.get(name),
            is_touched: state.is_touched(name),
            error: state.errors.get(name).cloned(),
            item_errors: state.item_errors(name),
            formatted_value,
            value,
            name: name.to_string(),
            controller: self.clone(),
        }
    }

    // -- Internals ----------------------------------------------------------

    fn sync_passes(&self, values: &FormValues, name: &str) -> bool {
        validate_form_field(values, &self.inner.schema, name).is_empty()
    }

    /// Write the synchronous outcome of `name` into the store.
    ///
    /// Array fields own several keys (`tags`, `tags[0]`, ...), all replaced.
    fn write_field_errors(&self, name: &str, mut errors: FormErrors) {
        let is_array = self
            .inner
            .schema
            .field(name)
            .is_some_and(|entry| entry.is_array());
        if is_array {
            let mut next: FormErrors = self
                .state()
                .errors
                .iter()
                .filter(|(key, _)| parse_field_path(key).name != name)
                .map(|(key, error)| (key.clone(), error.clone()))
                .collect();
            next.extend(errors);
            self.inner.store.set_errors(next);
            return;
        }
        match errors.shift_remove(name) {
            Some(error) => self.inner.store.set_field_error(name, error),
            None => self.inner.store.clear_field_error(Some(name)),
        }
    }

    fn validate_single_field(&self, name: &str, trigger: Option<AsyncTrigger>) {
        if self.inner.schema.field(name).is_none() {
            return;
        }
        let errors = validate_form_field(&self.state().values, &self.inner.schema, name);
        let clean = errors.is_empty();
        self.write_field_errors(name, errors);
        match (clean, trigger) {
            (true, Some(trigger)) => self.schedule_async(name, trigger),
            (false, _) => self.cancel_async(name),
            (true, None) => {}
        }
    }

    /// Drop the in-flight check and pending timer of `name`; their results
    /// never reach the store.
    fn cancel_async(&self, name: &str) {
        if self.inner.coordinator.cancel_field(name) > 0 {
            self.sync_validating();
        }
    }

    /// Start (or debounce) the async check of `name` if its trigger is
    /// `trigger` and its synchronous rules pass.
    fn schedule_async(&self, name: &str, trigger: AsyncTrigger) {
        let Some(validator) = self.inner.validators.get(name) else {
            return;
        };
        if validator.trigger_or(self.inner.config.default_trigger) != trigger {
            return;
        }
        let values = self.state().values.clone();
        if !self.sync_passes(&values, name) {
            self.cancel_async(name);
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!(field = name, "no async runtime, skipping async validation");
            return;
        };

        let value = field_value(&values, name);
        let delay = validator
            .debounce_delay()
            .filter(|_| trigger == AsyncTrigger::Change);
        match delay {
            Some(delay) => self.spawn_debounced(&runtime, name, value, validator, delay),
            None => {
                self.inner.coordinator.cancel_debounce(name);
                self.spawn_check(&runtime, name, value, validator);
            }
        }
    }

    fn spawn_check(&self, runtime: &Handle, name: &str, value: Value, validator: &AsyncFieldValidator) {
        let (token, registration) = self.begin_check(name);
        let check = validator.check(value);
        let controller = self.clone();
        let name = name.to_string();
        runtime.spawn(async move {
            controller.finish_in_background(&name, token, registration, check).await;
        });
    }

    fn spawn_debounced(
        &self,
        runtime: &Handle,
        name: &str,
        value: Value,
        validator: &AsyncFieldValidator,
        delay: Duration,
    ) {
        let coordinator = &self.inner.coordinator;
        let generation = coordinator.schedule_debounce(name, delay);
        let (handle, timer_registration) = AbortHandle::new_pair();
        coordinator.attach_debounce(name, generation, handle);

        let controller = self.clone();
        let validator = validator.clone();
        let name = name.to_string();
        let timer = async move {
            tokio::time::sleep(delay).await;
            let check = {
                let _guard = controller.inner.sync.lock();
                if !controller.inner.coordinator.fire_debounce(&name, generation) {
                    return;
                }
                let (token, registration) = controller.begin_check(&name);
                (token, registration, validator.check(value))
            };
            let (token, registration, check) = check;
            controller
                .finish_in_background(&name, token, registration, check)
                .await;
        };
        runtime.spawn(Abortable::new(timer, timer_registration));
    }

    async fn finish_in_background(
        &self,
        name: &str,
        token: ValidationToken,
        registration: AbortRegistration,
        check: BoxFuture<'static, AsyncCheck>,
    ) {
        if let Err(err) = self.drive_check(name, token, registration, check).await {
            warn!(field = name, %token, error = %err, "background async validation failed");
        }
    }

    /// Issue a token for `name` (aborting its previous check) and raise
    /// `is_validating`.
    fn begin_check(&self, name: &str) -> (ValidationToken, AbortRegistration) {
        let _guard = self.inner.sync.lock();
        let started = self.inner.coordinator.begin(name);
        self.sync_validating();
        started
    }

    async fn run_check(
        &self,
        name: &str,
        value: Value,
        validator: &AsyncFieldValidator,
    ) -> Result<Option<FieldError>> {
        self.inner.coordinator.cancel_debounce(name);
        let (token, registration) = self.begin_check(name);
        self.drive_check(name, token, registration, validator.check(value))
            .await
    }

    /// Await `check` unless aborted; apply its result if still current.
    ///
    /// Aborted or stale checks report no error.
    async fn drive_check(
        &self,
        name: &str,
        token: ValidationToken,
        registration: AbortRegistration,
        check: BoxFuture<'static, AsyncCheck>,
    ) -> Result<Option<FieldError>> {
        let outcome = Abortable::new(check, registration).await;
        let _guard = self.inner.sync.lock();
        let result = match outcome {
            Err(_aborted) => {
                debug!(field = name, %token, "async check aborted");
                return Ok(None);
            }
            Ok(Err(source)) => {
                self.inner.coordinator.fail_validation(name, token);
                Err(FormError::AsyncValidator {
                    field: name.to_string(),
                    source,
                })
            }
            Ok(Ok(error)) => {
                let completion =
                    self.inner
                        .coordinator
                        .complete_validation(name, token, error.is_none());
                match (completion, error) {
                    (Completion::Stale, _) => Ok(None),
                    (Completion::Applied, Some(error)) => {
                        self.inner.store.set_field_error(name, error.clone());
                        Ok(Some(error))
                    }
                    (Completion::Applied, None) => {
                        self.inner.store.clear_field_error(Some(name));
                        Ok(None)
                    }
                }
            }
        };
        self.sync_validating();
        result
    }

    /// Mirror the coordinator's in-flight state into the store.
    fn sync_validating(&self) {
        let validating = self.inner.coordinator.is_validating();
        if self.state().is_validating != validating {
            self.inner.store.set_is_validating(validating);
        }
    }
}

fn field_value(values: &FormValues, name: &str) -> Value {
    values.get(name).cloned().unwrap_or(Value::Null)
}

struct SubmittingGuard<'a>(&'a FormStore);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.set_is_submitting(false);
    }
}

// ---------------------------------------------------------------------------
// FieldHandle
// ---------------------------------------------------------------------------

/// One field as seen when the handle was created, plus input callbacks.
#[derive(Debug, Clone)]
pub struct FieldHandle {
    name: String,
    value: Option<Value>,
    formatted_value: String,
    error: Option<FieldError>,
    item_errors: FormErrors,
    is_dirty: bool,
    is_touched: bool,
    controller: FormController,
}

impl FieldHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The field's `format` output, else the plain rendering of the value.
    #[must_use]
    pub fn formatted_value(&self) -> &str {
        &self.formatted_value
    }

    #[must_use]
    pub fn error(&self) -> Option<&FieldError> {
        self.error.as_ref()
    }

    /// Per-item errors of an array field, keyed `name[i]`.
    #[must_use]
    pub fn item_errors(&self) -> &FormErrors {
        &self.item_errors
    }

    /// The value differs from its default.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.is_touched
    }

    /// Feed raw text: parsed when the field has `parse`, else stored as text.
    pub fn on_change(&self, raw: &str) {
        let parsed = self
            .controller
            .schema()
            .field(&self.name)
            .and_then(|entry| entry.parse_raw(raw))
            .unwrap_or_else(|| Value::String(raw.to_string()));
        self.controller.set_field_value(&self.name, parsed);
    }

    pub fn on_blur(&self) {
        self.controller.set_field_touched(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vorm_core::rules;
    use vorm_form::{
        ArrayOptions, FieldOptions, create_form_schema, create_primitive_array_field,
        create_primitive_field,
    };

    use super::*;

    fn values(value: Value) -> FormValues {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn schema() -> FormSchema {
        create_form_schema()
            .field(
                "name",
                create_primitive_field(vec![rules::min_length(2)], FieldOptions::<String>::new())
                    .required(),
            )
            .field(
                "age",
                create_primitive_field(
                    vec![rules::min(18_i64)],
                    FieldOptions::new()
                        .parse(|raw: &str| raw.trim().parse::<i64>().unwrap_or(0))
                        .format(|age: &i64| format!("{age} years")),
                )
                .optional(),
            )
            .field(
                "tags",
                create_primitive_array_field(vec![rules::min_length(2)], None)
                    .build(ArrayOptions::optional().min_length(2)),
            )
            .build()
    }

    fn accept_all(_: Value) -> impl Future<Output = AsyncCheck> {
        async { Ok(None) }
    }

    fn controller(mode: ValidationMode) -> FormController {
        FormController::new(
            schema(),
            FormOptions::new()
                .default_values(values(json!({"name": "", "age": 30})))
                .mode(mode),
        )
    }

    #[test]
    fn on_submit_mode_does_not_validate_on_change() {
        let form = controller(ValidationMode::OnSubmit);
        form.set_field_value("name", json!("x"));
        form.set_field_touched("name");
        assert!(form.is_valid());
        assert!(form.is_dirty());
        assert!(!form.validate(None));
        assert_eq!(form.errors()["name"].code, "MIN_LENGTH");
    }

    #[test]
    fn on_change_mode_validates_each_change() {
        let form = controller(ValidationMode::OnChange);
        form.set_field_value("name", json!("x"));
        assert_eq!(form.errors()["name"].code, "MIN_LENGTH");
        form.set_field_value("name", json!("xy"));
        assert!(form.is_valid());
    }

    #[test]
    fn on_blur_mode_validates_on_touch_only() {
        let form = controller(ValidationMode::OnBlur);
        form.set_field_value("name", json!("x"));
        assert!(form.is_valid());
        form.set_field_touched("name");
        assert_eq!(form.errors()["name"].code, "MIN_LENGTH");
    }

    #[test]
    fn on_touched_mode_validates_changes_after_first_blur() {
        let form = controller(ValidationMode::OnTouched);
        form.set_field_value("name", json!("x"));
        assert!(form.is_valid());
        form.set_field_touched("name");
        assert!(!form.is_valid());
        form.set_field_value("name", json!("xyz"));
        assert!(form.is_valid());
    }

    #[test]
    fn single_field_validate_leaves_other_errors() {
        let form = controller(ValidationMode::OnSubmit);
        form.set_field_value("age", json!(3));
        assert!(!form.validate(None));
        assert_eq!(form.errors().len(), 2);
        form.set_field_value("name", json!("neo"));
        assert!(form.validate(Some("name")));
        assert_eq!(form.errors().keys().collect::<Vec<_>>(), ["age"]);
        assert!(form.validate(Some("unknown")));
    }

    #[test]
    fn array_field_validation_replaces_its_keys() {
        let form = controller(ValidationMode::OnChange);
        form.set_field_value("tags", json!(["a", "b"]));
        let mut keys: Vec<_> = form.errors().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["tags[0]", "tags[1]"]);

        form.set_field_value("tags", json!(["ok", "b"]));
        assert_eq!(form.errors().keys().collect::<Vec<_>>(), ["tags[1]"]);
        form.set_field_value("tags", json!(["ok"]));
        assert_eq!(form.errors()["tags"].code, "MIN_LENGTH");
        assert_eq!(form.errors().len(), 1);
        form.set_field_value("tags", json!([]));
        assert!(form.is_valid());
    }

    #[test]
    fn array_handle_exposes_item_errors() {
        let form = controller(ValidationMode::OnChange);
        form.set_field_value("tags", json!(["ok", "b", "c"]));
        let tags = form.field("tags");
        assert!(tags.error().is_none());
        assert_eq!(
            tags.item_errors().keys().collect::<Vec<_>>(),
            ["tags[1]", "tags[2]"]
        );
        assert_eq!(tags.item_errors()["tags[1]"].code, "MIN_LENGTH");

        form.set_field_value("tags", json!(["ok", "fine"]));
        assert!(form.field("tags").item_errors().is_empty());
        assert!(form.field("name").item_errors().is_empty());
    }

    #[test]
    fn field_handle_reads_and_writes() {
        let form = controller(ValidationMode::OnChange);
        let age = form.field("age");
        assert_eq!(age.formatted_value(), "30 years");
        assert!(!age.is_dirty());

        age.on_change(" 12 ");
        let age = form.field("age");
        assert_eq!(age.value(), Some(&json!(12)));
        assert!(age.is_dirty());
        assert_eq!(age.error().map(|e| e.code.as_str()), Some("MIN"));

        let name = form.field("name");
        name.on_change("neo");
        name.on_blur();
        let name = form.field("name");
        assert_eq!(name.value(), Some(&json!("neo")));
        assert_eq!(name.formatted_value(), "neo");
        assert!(name.is_touched());

        assert_eq!(form.field("missing").formatted_value(), "");
    }

    #[test]
    fn reset_merges_over_defaults() {
        let form = controller(ValidationMode::OnChange);
        form.set_field_value("name", json!("x"));
        form.set_field_touched("name");
        form.reset(Some(values(json!({"name": "fresh"}))));

        let state = form.state();
        assert_eq!(state.values["name"], "fresh");
        assert_eq!(state.values["age"], 30);
        assert!(state.errors.is_empty() && state.touched_fields.is_empty());
        assert!(!state.is_dirty);

        form.reset(None);
        assert_eq!(form.values()["name"], "");
    }

    #[test]
    fn background_checks_need_a_runtime() {
        let form = FormController::new(
            schema(),
            FormOptions::new()
                .default_values(values(json!({"name": "neo"})))
                .async_validator(
                    "name",
                    AsyncFieldValidator::new(accept_all),
                ),
        );
        form.set_field_touched("name");
        assert!(!form.is_validating());
        assert!(form.coordinator().trace().is_empty());
    }
}
