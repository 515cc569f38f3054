#![forbid(unsafe_code)]

//! Reactive form store.
//!
//! The store owns one immutable [`FormState`] at a time. Every mutation
//! builds a new state behind a new `Arc`, so snapshots handed out earlier
//! stay valid and can be compared by pointer identity.
//!
//! Two subscription scopes exist:
//!
//! - whole-form listeners, notified on every mutation;
//! - per-field listeners, notified only when a mutation names their field,
//!   or when a mutation touches the whole form (`set_errors`, `reset`, ...).
//!
//! Per-field snapshots are cached and only rebuilt for the fields a mutation
//! names. Listeners run after the internal lock is released and may call
//! back into the store.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;
use vorm_core::FieldError;
use vorm_form::{FormErrors, FormValues, parse_field_path};

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One immutable state record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub values: FormValues,
    pub errors: FormErrors,
    /// Set by the first value change, cleared by reset.
    pub is_dirty: bool,
    pub is_submitting: bool,
    pub is_validating: bool,
    pub touched_fields: IndexSet<String>,
}

impl FormState {
    fn with_values(values: FormValues) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_touched(&self, name: &str) -> bool {
        self.touched_fields.contains(name)
    }

    /// Errors recorded under `name[i]` keys, in insertion order.
    #[must_use]
    pub fn item_errors(&self, name: &str) -> FormErrors {
        self.errors
            .iter()
            .filter(|(key, _)| {
                let path = parse_field_path(key);
                path.index.is_some() && path.name == name
            })
            .map(|(key, error)| (key.clone(), error.clone()))
            .collect()
    }
}

/// The slice of state one field cares about.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSnapshot {
    pub value: Option<Value>,
    pub error: Option<FieldError>,
    /// Per-item errors of an array field, keyed `name[i]`.
    pub item_errors: FormErrors,
    pub is_touched: bool,
}

impl FieldSnapshot {
    fn of(state: &FormState, name: &str) -> Self {
        Self {
            value: state.values.get(name).cloned(),
            error: state.errors.get(name).cloned(),
            item_errors: state.item_errors(name),
            is_touched: state.is_touched(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

type StateListener = Arc<dyn Fn(&Arc<FormState>) + Send + Sync>;
type FieldListener = Arc<dyn Fn(&Arc<FieldSnapshot>) + Send + Sync>;

/// Which fields a mutation concerns.
enum Changed<'a> {
    All,
    Field(&'a str),
}

#[derive(Default)]
struct Inner {
    state: Arc<FormState>,
    field_cache: HashMap<String, Arc<FieldSnapshot>>,
    listeners: IndexMap<u64, StateListener>,
    field_listeners: HashMap<String, IndexMap<u64, FieldListener>>,
    next_id: u64,
}

impl Inner {
    fn field_snapshot(&mut self, name: &str) -> Arc<FieldSnapshot> {
        if let Some(cached) = self.field_cache.get(name) {
            return Arc::clone(cached);
        }
        let snapshot = Arc::new(FieldSnapshot::of(&self.state, name));
        self.field_cache
            .insert(name.to_string(), Arc::clone(&snapshot));
        snapshot
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Notifications gathered under the lock, delivered after it is released.
struct Pending {
    state: Arc<FormState>,
    listeners: Vec<StateListener>,
    fields: Vec<(Arc<FieldSnapshot>, Vec<FieldListener>)>,
}

impl Pending {
    fn deliver(self) {
        for listener in &self.listeners {
            listener(&self.state);
        }
        for (snapshot, listeners) in &self.fields {
            for listener in listeners {
                listener(snapshot);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FormStore
// ---------------------------------------------------------------------------

/// A cloneable handle to one form's reactive state.
#[derive(Clone, Default)]
pub struct FormStore {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for FormStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FormStore")
            .field("state", &inner.state)
            .field("listeners", &inner.listeners.len())
            .field("field_listeners", &inner.field_listeners.len())
            .finish()
    }
}

impl FormStore {
    /// A store whose initial values are `values`.
    #[must_use]
    pub fn new(values: FormValues) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: Arc::new(FormState::with_values(values)),
                ..Inner::default()
            })),
        }
    }

    /// Listen to every mutation.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<FormState>) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = inner.next_id();
        inner.listeners.insert(id, Arc::new(listener));
        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
            field: None,
        }
    }

    /// The current state. Same `Arc` until the next mutation.
    #[must_use]
    pub fn get_snapshot(&self) -> Arc<FormState> {
        Arc::clone(&self.inner.lock().state)
    }

    /// Alias of [`get_snapshot`](Self::get_snapshot).
    #[must_use]
    pub fn get_state(&self) -> Arc<FormState> {
        self.get_snapshot()
    }

    /// Listen to mutations concerning `name`.
    pub fn subscribe_field<F>(&self, name: &str, listener: F) -> Subscription
    where
        F: Fn(&Arc<FieldSnapshot>) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = inner.next_id();
        inner
            .field_listeners
            .entry(name.to_string())
            .or_default()
            .insert(id, Arc::new(listener));
        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
            field: Some(name.to_string()),
        }
    }

    /// The cached snapshot of `name`, rebuilt only after a mutation names it.
    #[must_use]
    pub fn get_field_snapshot(&self, name: &str) -> Arc<FieldSnapshot> {
        self.inner.lock().field_snapshot(name)
    }

    // -- Mutations ----------------------------------------------------------

    pub fn set_field_value(&self, name: &str, value: Value) {
        self.mutate(Changed::Field(name), |state| {
            state.values.insert(name.to_string(), value);
            state.is_dirty = true;
        });
    }

    pub fn set_field_touched(&self, name: &str, touched: bool) {
        self.mutate(Changed::Field(name), |state| {
            if touched {
                state.touched_fields.insert(name.to_string());
            } else {
                state.touched_fields.shift_remove(name);
            }
        });
    }

    pub fn set_field_error(&self, name: &str, error: FieldError) {
        self.mutate(Changed::Field(name), |state| {
            state.errors.insert(name.to_string(), error);
        });
    }

    /// Clear the error of `name`, or every error when `name` is `None`.
    pub fn clear_field_error(&self, name: Option<&str>) {
        match name {
            Some(name) => self.mutate(Changed::Field(name), |state| {
                state.errors.shift_remove(name);
            }),
            None => self.mutate(Changed::All, |state| state.errors.clear()),
        }
    }

    /// Replace every error.
    pub fn set_errors(&self, errors: FormErrors) {
        self.mutate(Changed::All, |state| state.errors = errors);
    }

    pub fn set_is_submitting(&self, is_submitting: bool) {
        self.mutate(Changed::All, |state| state.is_submitting = is_submitting);
    }

    pub fn set_is_validating(&self, is_validating: bool) {
        self.mutate(Changed::All, |state| state.is_validating = is_validating);
    }

    /// Start over from `values`: no errors, nothing touched, all flags false.
    pub fn reset(&self, values: FormValues) {
        self.mutate(Changed::All, |state| *state = FormState::with_values(values));
    }

    fn mutate(&self, changed: Changed<'_>, apply: impl FnOnce(&mut FormState)) {
        let pending = {
            let mut inner = self.inner.lock();
            let mut next = FormState::clone(&inner.state);
            apply(&mut next);
            inner.state = Arc::new(next);

            let listeners: Vec<_> = inner.listeners.values().cloned().collect();
            let fields = match changed {
                Changed::Field(key) => {
                    trace!(field = key, "store mutation");
                    // An item key (`tags[1]`) also concerns its array field.
                    let owner = parse_field_path(key);
                    let mut names = vec![key];
                    if owner.index.is_some() {
                        names.push(owner.name.as_str());
                    }
                    let mut fields = Vec::new();
                    for name in names {
                        inner.field_cache.remove(name);
                        let listeners: Vec<_> = match inner.field_listeners.get(name) {
                            Some(listeners) if !listeners.is_empty() => {
                                listeners.values().cloned().collect()
                            }
                            _ => continue,
                        };
                        fields.push((inner.field_snapshot(name), listeners));
                    }
                    fields
                }
                Changed::All => {
                    trace!("store mutation (all fields)");
                    inner.field_cache.clear();
                    let names: Vec<String> = inner
                        .field_listeners
                        .iter()
                        .filter(|(_, listeners)| !listeners.is_empty())
                        .map(|(name, _)| name.clone())
                        .collect();
                    names
                        .into_iter()
                        .map(|name| {
                            let listeners: Vec<_> = inner.field_listeners[&name]
                                .values()
                                .cloned()
                                .collect();
                            (inner.field_snapshot(&name), listeners)
                        })
                        .collect()
                }
            };
            Pending {
                state: Arc::clone(&inner.state),
                listeners,
                fields,
            }
        };
        pending.deliver();
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    store: Weak<Mutex<Inner>>,
    id: u64,
    field: Option<String>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("field", &self.field)
            .finish()
    }
}

impl Subscription {
    /// Unsubscribe now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(store) = self.store.upgrade() else {
            return;
        };
        let mut inner = store.lock();
        match &self.field {
            None => {
                inner.listeners.shift_remove(&self.id);
            }
            Some(name) => {
                if let Some(listeners) = inner.field_listeners.get_mut(name) {
                    listeners.shift_remove(&self.id);
                    if listeners.is_empty() {
                        inner.field_listeners.remove(name);
                    }
                }
            }
        }
    }
}
