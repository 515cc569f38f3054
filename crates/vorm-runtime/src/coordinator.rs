#![forbid(unsafe_code)]

//! Per-field async validation bookkeeping with token-based staleness.
//!
//! Every asynchronous check is issued a monotonically increasing
//! [`ValidationToken`]. A field has at most one in-flight check; starting a
//! new one aborts the previous one through its abort handle and marks its
//! token stale, so even a result that slips past the abort is discarded.
//! Debounced `change` checks go through a second, timer-shaped slot per field.
//!
//! # Invariants
//!
//! 1. **Monotonic tokens**: `Started` tokens strictly increase across fields.
//! 2. **One in flight**: a field never has two checks whose results apply.
//! 3. **Staleness**: a result is applied only if its token is the field's
//!    in-flight token when it completes.
//! 4. **Reset**: [`AsyncValidationCoordinator::cancel_all`] leaves nothing in
//!    flight and nothing scheduled.
//!
//! The coordinator holds no reference to the store: callers apply results
//! only when [`complete_validation`](AsyncValidationCoordinator::complete_validation)
//! says [`Completion::Applied`].

use std::collections::VecDeque;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{AbortHandle, AbortRegistration};
use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::DEFAULT_TRACE_CAPACITY;

// ---------------------------------------------------------------------------
// ValidationToken
// ---------------------------------------------------------------------------

/// A monotonically increasing token identifying one asynchronous check.
///
/// Token 0 is reserved for "no check".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ValidationToken(u64);

impl ValidationToken {
    /// The null token.
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ValidationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ValidationEvent
// ---------------------------------------------------------------------------

/// A lifecycle event recorded in the [`ValidationTrace`].
///
/// Events carry no timestamps so that identical operation sequences produce
/// identical checksums.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidationEvent {
    /// A debounced check was scheduled.
    Scheduled {
        field: String,
        generation: u64,
        delay_ms: u64,
    },
    Started {
        field: String,
        token: ValidationToken,
    },
    /// An in-flight check was aborted. `superseded_by` is NONE on reset.
    Cancelled {
        field: String,
        token: ValidationToken,
        superseded_by: ValidationToken,
    },
    Completed {
        field: String,
        token: ValidationToken,
        is_valid: bool,
    },
    Applied {
        field: String,
        token: ValidationToken,
        is_valid: bool,
    },
    StaleDiscarded {
        field: String,
        token: ValidationToken,
        /// The field's in-flight token when the result arrived (NONE if idle).
        current_token: ValidationToken,
    },
    /// The validator itself returned an error.
    Failed {
        field: String,
        token: ValidationToken,
    },
    /// Everything was cancelled; `cancelled` counts checks and timers.
    Reset { cancelled: usize },
}

impl ValidationEvent {
    /// The token this event concerns, NONE for `Scheduled` and `Reset`.
    #[must_use]
    pub fn token(&self) -> ValidationToken {
        match self {
            Self::Started { token, .. }
            | Self::Cancelled { token, .. }
            | Self::Completed { token, .. }
            | Self::Applied { token, .. }
            | Self::StaleDiscarded { token, .. }
            | Self::Failed { token, .. } => *token,
            Self::Scheduled { .. } | Self::Reset { .. } => ValidationToken::NONE,
        }
    }

    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Scheduled { field, .. }
            | Self::Started { field, .. }
            | Self::Cancelled { field, .. }
            | Self::Completed { field, .. }
            | Self::Applied { field, .. }
            | Self::StaleDiscarded { field, .. }
            | Self::Failed { field, .. } => Some(field),
            Self::Reset { .. } => None,
        }
    }

    /// Event type name for logging.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Scheduled { .. } => "scheduled",
            Self::Started { .. } => "started",
            Self::Cancelled { .. } => "cancelled",
            Self::Completed { .. } => "completed",
            Self::Applied { .. } => "applied",
            Self::StaleDiscarded { .. } => "stale_discarded",
            Self::Failed { .. } => "failed",
            Self::Reset { .. } => "reset",
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationTrace
// ---------------------------------------------------------------------------

/// A bounded log of validation events.
///
/// When full, the oldest event is dropped. A capacity of 0 records nothing.
#[derive(Debug, Clone)]
pub struct ValidationTrace {
    events: VecDeque<ValidationEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for ValidationTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationTrace {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TRACE_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_TRACE_CAPACITY)),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: ValidationEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &ValidationEvent> {
        self.events.iter()
    }

    /// Number of events evicted to respect the capacity.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn contains_event_type(&self, token: ValidationToken, event_type: &str) -> bool {
        self.events
            .iter()
            .any(|e| e.token() == token && e.event_type() == event_type)
    }

    #[must_use]
    pub fn events_for_token(&self, token: ValidationToken) -> Vec<&ValidationEvent> {
        self.events.iter().filter(|e| e.token() == token).collect()
    }

    #[must_use]
    pub fn events_for_field(&self, field: &str) -> Vec<&ValidationEvent> {
        self.events
            .iter()
            .filter(|e| e.field() == Some(field))
            .collect()
    }

    /// Event type names in order, handy for assertions.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.iter().map(ValidationEvent::event_type).collect()
    }

    /// Checksum over the retained events and their order.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for event in &self.events {
            event.hash(&mut hasher);
        }
        hasher.finish()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Check the trace against the coordinator's invariants.
    ///
    /// Returns one message per violation.
    #[must_use]
    pub fn verify_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        // 1: start tokens strictly increase.
        let mut last_started = ValidationToken::NONE;
        for event in &self.events {
            if let ValidationEvent::Started { token, .. } = event {
                if *token <= last_started {
                    violations.push(format!(
                        "Non-monotonic start token: {token} after {last_started}"
                    ));
                }
                last_started = *token;
            }
        }

        // 2: a cancelled token never applies.
        let mut cancelled: Vec<ValidationToken> = Vec::new();
        for event in &self.events {
            match event {
                ValidationEvent::Cancelled { token, .. } => cancelled.push(*token),
                ValidationEvent::Applied { token, .. } if cancelled.contains(token) => {
                    violations.push(format!("Applied after cancel: {token}"));
                }
                _ => {}
            }
        }

        // 3: a stale token is never the in-flight one, and never newer.
        for event in &self.events {
            if let ValidationEvent::StaleDiscarded {
                token,
                current_token,
                ..
            } = event
                && (token == current_token || (!current_token.is_none() && token > current_token))
            {
                violations.push(format!(
                    "StaleDiscarded with non-stale token: {token} vs {current_token}"
                ));
            }
        }

        violations
    }
}

// ---------------------------------------------------------------------------
// Per-field state
// ---------------------------------------------------------------------------

/// An asynchronous check that has started and not yet completed.
#[derive(Debug, Clone)]
pub struct InFlightValidation {
    pub token: ValidationToken,
    pub started_at: Instant,
}

#[derive(Debug)]
struct PendingDebounce {
    generation: u64,
    handle: Option<AbortHandle>,
}

#[derive(Debug, Default)]
struct FieldSlot {
    in_flight: Option<InFlightValidation>,
    task: Option<AbortHandle>,
    debounce: Option<PendingDebounce>,
}

/// What became of a completed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The check was current; its result may be written.
    Applied,
    /// The check was superseded or cancelled; drop its result.
    Stale,
}

impl Completion {
    #[must_use]
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

// ---------------------------------------------------------------------------
// AsyncValidationCoordinator
// ---------------------------------------------------------------------------

/// Tracks in-flight checks and debounce timers for every field of a form.
pub struct AsyncValidationCoordinator {
    next_token: u64,
    next_generation: u64,
    fields: IndexMap<String, FieldSlot>,
    trace: ValidationTrace,
}

impl fmt::Debug for AsyncValidationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncValidationCoordinator")
            .field("next_token", &self.next_token)
            .field("in_flight_count", &self.in_flight_count())
            .field("trace_events", &self.trace.len())
            .finish()
    }
}

impl Default for AsyncValidationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncValidationCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_trace_capacity(DEFAULT_TRACE_CAPACITY)
    }

    #[must_use]
    pub fn with_trace_capacity(capacity: usize) -> Self {
        Self {
            next_token: 1,
            next_generation: 1,
            fields: IndexMap::new(),
            trace: ValidationTrace::with_capacity(capacity),
        }
    }

    fn slot(&mut self, field: &str) -> &mut FieldSlot {
        if !self.fields.contains_key(field) {
            self.fields.insert(field.to_string(), FieldSlot::default());
        }
        &mut self.fields[field]
    }

    /// Start a check for `field`, aborting any check already in flight there.
    pub fn start_validation(&mut self, field: &str) -> ValidationToken {
        let token = ValidationToken(self.next_token);
        self.next_token += 1;

        let slot = self.slot(field);
        let previous = slot.in_flight.take();
        if let Some(task) = slot.task.take() {
            task.abort();
        }
        slot.in_flight = Some(InFlightValidation {
            token,
            started_at: Instant::now(),
        });

        if let Some(previous) = previous {
            debug!(field, token = %previous.token, superseded_by = %token, "async check cancelled");
            self.trace.push(ValidationEvent::Cancelled {
                field: field.to_string(),
                token: previous.token,
                superseded_by: token,
            });
        }
        debug!(field, %token, "async check started");
        self.trace.push(ValidationEvent::Started {
            field: field.to_string(),
            token,
        });
        token
    }

    /// Register the abort handle of the task running `token`.
    ///
    /// Returns `false` (and aborts `handle`) if `token` is no longer in flight.
    pub fn attach_task(&mut self, field: &str, token: ValidationToken, handle: AbortHandle) -> bool {
        let slot = self.slot(field);
        if slot.in_flight.as_ref().map(|f| f.token) != Some(token) {
            handle.abort();
            return false;
        }
        if let Some(old) = slot.task.replace(handle) {
            old.abort();
        }
        true
    }

    /// [`start_validation`](Self::start_validation) plus
    /// [`attach_task`](Self::attach_task) for a fresh abort pair.
    ///
    /// Wrap the check in `Abortable::new(check, registration)`.
    pub fn begin(&mut self, field: &str) -> (ValidationToken, AbortRegistration) {
        let (handle, registration) = AbortHandle::new_pair();
        let token = self.start_validation(field);
        self.attach_task(field, token, handle);
        (token, registration)
    }

    /// Record that `token` finished; say whether its result may be written.
    pub fn complete_validation(
        &mut self,
        field: &str,
        token: ValidationToken,
        is_valid: bool,
    ) -> Completion {
        self.trace.push(ValidationEvent::Completed {
            field: field.to_string(),
            token,
            is_valid,
        });

        let slot = self.slot(field);
        let current = slot.in_flight.as_ref().map_or(ValidationToken::NONE, |f| f.token);
        if current != token {
            debug!(field, %token, current_token = %current, "stale async result discarded");
            self.trace.push(ValidationEvent::StaleDiscarded {
                field: field.to_string(),
                token,
                current_token: current,
            });
            return Completion::Stale;
        }

        slot.in_flight = None;
        slot.task = None;
        self.trace.push(ValidationEvent::Applied {
            field: field.to_string(),
            token,
            is_valid,
        });
        Completion::Applied
    }

    /// Record that the validator for `token` errored; release its slot.
    ///
    /// Returns whether `token` was still current.
    pub fn fail_validation(&mut self, field: &str, token: ValidationToken) -> bool {
        self.trace.push(ValidationEvent::Failed {
            field: field.to_string(),
            token,
        });
        let slot = self.slot(field);
        if slot.in_flight.as_ref().map(|f| f.token) != Some(token) {
            return false;
        }
        slot.in_flight = None;
        slot.task = None;
        true
    }

    /// Schedule a debounced check for `field`, replacing any pending one.
    ///
    /// Returns the generation the timer must present to
    /// [`fire_debounce`](Self::fire_debounce).
    pub fn schedule_debounce(&mut self, field: &str, delay: Duration) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;

        let slot = self.slot(field);
        if let Some(PendingDebounce {
            handle: Some(handle),
            ..
        }) = slot.debounce.take()
        {
            handle.abort();
        }
        slot.debounce = Some(PendingDebounce {
            generation,
            handle: None,
        });

        self.trace.push(ValidationEvent::Scheduled {
            field: field.to_string(),
            generation,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        });
        generation
    }

    /// Register the abort handle of the timer for `generation`.
    ///
    /// Returns `false` (and aborts `handle`) if the timer was already replaced.
    pub fn attach_debounce(&mut self, field: &str, generation: u64, handle: AbortHandle) -> bool {
        match self.slot(field).debounce.as_mut() {
            Some(pending) if pending.generation == generation => {
                pending.handle = Some(handle);
                true
            }
            _ => {
                handle.abort();
                false
            }
        }
    }

    /// Claim the pending timer. Only the latest generation may fire.
    pub fn fire_debounce(&mut self, field: &str, generation: u64) -> bool {
        let slot = self.slot(field);
        match slot.debounce {
            Some(PendingDebounce { generation: g, .. }) if g == generation => {
                slot.debounce = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending timer of `field`, if any.
    pub fn cancel_debounce(&mut self, field: &str) -> bool {
        let Some(pending) = self.fields.get_mut(field).and_then(|slot| slot.debounce.take())
        else {
            return false;
        };
        if let Some(handle) = pending.handle {
            handle.abort();
        }
        debug!(field, generation = pending.generation, "debounce cancelled");
        true
    }

    /// Abort the in-flight check and pending timer of `field`.
    ///
    /// Returns how many were cancelled.
    pub fn cancel_field(&mut self, field: &str) -> usize {
        let Some(slot) = self.fields.get_mut(field) else {
            return 0;
        };
        let mut cancelled = 0;
        if let Some(task) = slot.task.take() {
            task.abort();
        }
        let in_flight = slot.in_flight.take();
        if let Some(pending) = slot.debounce.take() {
            cancelled += 1;
            if let Some(handle) = pending.handle {
                handle.abort();
            }
        }
        if let Some(in_flight) = in_flight {
            cancelled += 1;
            debug!(field, token = %in_flight.token, "async check cancelled");
            self.trace.push(ValidationEvent::Cancelled {
                field: field.to_string(),
                token: in_flight.token,
                superseded_by: ValidationToken::NONE,
            });
        }
        cancelled
    }

    /// Abort every in-flight check and pending timer.
    ///
    /// Returns how many checks and timers were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        let mut events = Vec::new();
        for (field, slot) in &mut self.fields {
            if let Some(task) = slot.task.take() {
                task.abort();
            }
            if let Some(in_flight) = slot.in_flight.take() {
                cancelled += 1;
                events.push(ValidationEvent::Cancelled {
                    field: field.clone(),
                    token: in_flight.token,
                    superseded_by: ValidationToken::NONE,
                });
            }
            if let Some(pending) = slot.debounce.take() {
                cancelled += 1;
                if let Some(handle) = pending.handle {
                    handle.abort();
                }
            }
        }
        for event in events {
            self.trace.push(event);
        }
        debug!(cancelled, "async validation reset");
        self.trace.push(ValidationEvent::Reset { cancelled });
        cancelled
    }

    /// True while any field has a check in flight.
    ///
    /// Pending debounce timers do not count.
    #[must_use]
    pub fn is_validating(&self) -> bool {
        self.fields.values().any(|slot| slot.in_flight.is_some())
    }

    #[must_use]
    pub fn is_field_validating(&self, field: &str) -> bool {
        self.fields
            .get(field)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    /// Fields with a check in flight, in first-seen order.
    #[must_use]
    pub fn validating_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, slot)| slot.in_flight.is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.fields
            .values()
            .filter(|slot| slot.in_flight.is_some())
            .count()
    }

    #[must_use]
    pub fn has_pending_debounce(&self, field: &str) -> bool {
        self.fields
            .get(field)
            .is_some_and(|slot| slot.debounce.is_some())
    }

    /// The in-flight token of `field`, NONE if idle.
    #[must_use]
    pub fn current_token(&self, field: &str) -> ValidationToken {
        self.fields
            .get(field)
            .and_then(|slot| slot.in_flight.as_ref())
            .map_or(ValidationToken::NONE, |f| f.token)
    }

    #[must_use]
    pub fn in_flight(&self, field: &str) -> Option<&InFlightValidation> {
        self.fields.get(field).and_then(|slot| slot.in_flight.as_ref())
    }

    #[must_use]
    pub fn trace(&self) -> &ValidationTrace {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    pub fn verify_trace(&self) -> Result<(), Vec<String>> {
        let violations = self.trace.verify_invariants();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

// ---------------------------------------------------------------------------
// Shared wrapper
// ---------------------------------------------------------------------------

/// A cloneable, thread-safe handle to one [`AsyncValidationCoordinator`].
#[derive(Clone, Default)]
pub struct SharedValidationCoordinator {
    inner: Arc<Mutex<AsyncValidationCoordinator>>,
}

impl fmt::Debug for SharedValidationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.lock().fmt(f)
    }
}

impl SharedValidationCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_trace_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AsyncValidationCoordinator::with_trace_capacity(
                capacity,
            ))),
        }
    }

    pub fn start_validation(&self, field: &str) -> ValidationToken {
        self.inner.lock().start_validation(field)
    }

    pub fn attach_task(&self, field: &str, token: ValidationToken, handle: AbortHandle) -> bool {
        self.inner.lock().attach_task(field, token, handle)
    }

    pub fn begin(&self, field: &str) -> (ValidationToken, AbortRegistration) {
        self.inner.lock().begin(field)
    }

    pub fn complete_validation(
        &self,
        field: &str,
        token: ValidationToken,
        is_valid: bool,
    ) -> Completion {
        self.inner.lock().complete_validation(field, token, is_valid)
    }

    pub fn fail_validation(&self, field: &str, token: ValidationToken) -> bool {
        self.inner.lock().fail_validation(field, token)
    }

    pub fn schedule_debounce(&self, field: &str, delay: Duration) -> u64 {
        self.inner.lock().schedule_debounce(field, delay)
    }

    pub fn attach_debounce(&self, field: &str, generation: u64, handle: AbortHandle) -> bool {
        self.inner.lock().attach_debounce(field, generation, handle)
    }

    pub fn fire_debounce(&self, field: &str, generation: u64) -> bool {
        self.inner.lock().fire_debounce(field, generation)
    }

    pub fn cancel_debounce(&self, field: &str) -> bool {
        self.inner.lock().cancel_debounce(field)
    }

    pub fn cancel_field(&self, field: &str) -> usize {
        self.inner.lock().cancel_field(field)
    }

    pub fn cancel_all(&self) -> usize {
        self.inner.lock().cancel_all()
    }

    #[must_use]
    pub fn is_validating(&self) -> bool {
        self.inner.lock().is_validating()
    }

    #[must_use]
    pub fn is_field_validating(&self, field: &str) -> bool {
        self.inner.lock().is_field_validating(field)
    }

    #[must_use]
    pub fn validating_fields(&self) -> Vec<String> {
        self.inner.lock().validating_fields()
    }

    #[must_use]
    pub fn has_pending_debounce(&self, field: &str) -> bool {
        self.inner.lock().has_pending_debounce(field)
    }

    #[must_use]
    pub fn current_token(&self, field: &str) -> ValidationToken {
        self.inner.lock().current_token(field)
    }

    /// A copy of the trace.
    #[must_use]
    pub fn trace(&self) -> ValidationTrace {
        self.inner.lock().trace().clone()
    }

    #[must_use]
    pub fn trace_checksum(&self) -> u64 {
        self.inner.lock().trace().checksum()
    }

    pub fn verify_trace(&self) -> Result<(), Vec<String>> {
        self.inner.lock().verify_trace()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
