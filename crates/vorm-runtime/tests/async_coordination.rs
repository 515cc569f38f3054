//! Async validation through the form controller, on a paused clock.
//!
//! # Invariants
//!
//! 1. **Debounce**: rapid qualifying changes collapse into one call carrying
//!    the last value; pending timers do not raise `is_validating`.
//! 2. **Sync first**: a field whose synchronous rules fail never reaches its
//!    async validator, and work started for an earlier value (timer or
//!    in-flight check) is dropped without touching the store.
//! 3. **Cancellation**: a newer check for a field aborts the older one, whose
//!    result never reaches the store.
//! 4. **Triggers**: a validator only runs for its own trigger.
//! 5. **isValidating**: true exactly while some field has a check in flight.
//! 6. **Reset**: cancels every check and timer; nothing writes afterwards.
//! 7. **Submit**: async checks run concurrently after sync validation; the
//!    handler runs only when every check passes.

use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::time::{Instant, sleep};
use vorm_core::{FieldError, rules};
use vorm_form::{FieldOptions, FormSchema, create_form_schema, create_primitive_field};
use vorm_runtime::{
    AsyncFieldValidator, AsyncTrigger, BoxError, FormController, FormError, FormOptions,
    SubmitOutcome, ValidationMode,
};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Records every value a validator is called with.
#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    fn calls(&self) -> Vec<Value> {
        self.calls.lock().clone()
    }
}

/// Rejects `"admin"` after `latency`.
fn username_check(recorder: &Recorder, latency: Duration) -> AsyncFieldValidator {
    let recorder = recorder.clone();
    AsyncFieldValidator::new(move |value: Value| {
        recorder.calls.lock().push(value.clone());
        async move {
            sleep(latency).await;
            let error = (value == "admin").then(|| FieldError::new("TAKEN", "Username is taken"));
            Ok::<_, BoxError>(error)
        }
    })
}

/// Like [`username_check`], but `"admin"` takes 200ms and anything else 10ms.
fn slow_admin_check(recorder: &Recorder) -> AsyncFieldValidator {
    let recorder = recorder.clone();
    AsyncFieldValidator::new(move |value: Value| {
        recorder.calls.lock().push(value.clone());
        async move {
            let is_admin = value == "admin";
            sleep(if is_admin { ms(200) } else { ms(10) }).await;
            let error = is_admin.then(|| FieldError::new("TAKEN", "Username is taken"));
            Ok::<_, BoxError>(error)
        }
    })
}

fn schema() -> FormSchema {
    create_form_schema()
        .field(
            "username",
            create_primitive_field(vec![rules::min_length(3)], FieldOptions::<String>::new())
                .required(),
        )
        .field(
            "email",
            create_primitive_field(vec![rules::email()], FieldOptions::<String>::new())
                .optional(),
        )
        .build()
}

fn form(mode: ValidationMode, validator: AsyncFieldValidator) -> FormController {
    init_tracing();
    FormController::new(
        schema(),
        FormOptions::new()
            .mode(mode)
            .async_validator("username", validator),
    )
}

// ============================================================================
// 1. Debounce
// ============================================================================

#[tokio::test(start_paused = true)]
async fn debounce_collapses_rapid_changes() {
    let recorder = Recorder::default();
    let check = username_check(&recorder, ms(50))
        .on(AsyncTrigger::Change)
        .debounce(ms(300));
    let form = form(ValidationMode::OnChange, check);

    for value in ["ada", "adam", "adams"] {
        form.set_field_value("username", json!(value));
        sleep(ms(100)).await;
    }
    assert!(recorder.calls().is_empty());
    assert!(!form.is_validating());

    sleep(ms(400)).await;
    assert_eq!(recorder.calls(), vec![json!("adams")]);
    assert!(!form.is_validating());
    assert!(form.is_valid());

    let trace = form.coordinator().trace();
    assert_eq!(
        trace.event_types(),
        [
            "scheduled",
            "scheduled",
            "scheduled",
            "started",
            "completed",
            "applied"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn debounced_result_is_written() {
    let recorder = Recorder::default();
    let check = username_check(&recorder, ms(50))
        .on(AsyncTrigger::Change)
        .debounce(ms(300));
    let form = form(ValidationMode::OnChange, check);

    form.set_field_value("username", json!("admin"));
    sleep(ms(310)).await;
    assert!(form.is_validating());
    sleep(ms(100)).await;
    assert_eq!(form.errors()["username"].code, "TAKEN");
    assert!(!form.is_validating());
}

// ============================================================================
// 2. Sync first
// ============================================================================

#[tokio::test(start_paused = true)]
async fn sync_failure_skips_async_check() {
    let recorder = Recorder::default();
    let check = username_check(&recorder, ms(50)).on(AsyncTrigger::Change);
    let form = form(ValidationMode::OnChange, check);

    form.set_field_value("username", json!("ab"));
    sleep(ms(500)).await;
    assert!(recorder.calls().is_empty());
    assert_eq!(form.errors()["username"].code, "MIN_LENGTH");

    let outcome = form.validate_async(Some("username")).await.unwrap();
    assert!(!outcome);
    assert!(recorder.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn sync_failure_drops_pending_debounce() {
    let recorder = Recorder::default();
    let check = username_check(&recorder, ms(50))
        .on(AsyncTrigger::Change)
        .debounce(ms(300));
    let form = form(ValidationMode::OnChange, check);

    form.set_field_value("username", json!("alice"));
    sleep(ms(100)).await;
    form.set_field_value("username", json!("al"));
    assert_eq!(form.errors()["username"].code, "MIN_LENGTH");
    assert!(!form.coordinator().has_pending_debounce("username"));

    sleep(ms(500)).await;
    assert!(recorder.calls().is_empty());
    assert_eq!(form.values()["username"], "al");
    assert_eq!(form.errors()["username"].code, "MIN_LENGTH");
}

#[tokio::test(start_paused = true)]
async fn sync_failure_discards_in_flight_result() {
    let recorder = Recorder::default();
    let check = username_check(&recorder, ms(200)).on(AsyncTrigger::Change);
    let form = form(ValidationMode::OnChange, check);

    form.set_field_value("username", json!("alice"));
    sleep(ms(50)).await;
    assert!(form.is_validating());
    form.set_field_value("username", json!("al"));
    assert!(!form.is_validating());

    sleep(ms(500)).await;
    assert_eq!(recorder.calls(), vec![json!("alice")]);
    assert_eq!(form.errors()["username"].code, "MIN_LENGTH");
    assert!(!form.is_validating());

    let trace = form.coordinator().trace();
    let started = trace
        .events()
        .find(|e| e.event_type() == "started")
        .map(|e| e.token())
        .unwrap();
    assert!(trace.contains_event_type(started, "cancelled"));
    assert!(!trace.contains_event_type(started, "applied"));
    assert!(form.coordinator().verify_trace().is_ok());
}

#[tokio::test(start_paused = true)]
async fn value_change_discards_check_for_old_value() {
    let recorder = Recorder::default();
    let form = form(ValidationMode::OnSubmit, slow_admin_check(&recorder));

    form.set_field_value("username", json!("admin"));
    form.set_field_touched("username");
    sleep(ms(50)).await;
    form.set_field_value("username", json!("ada"));
    assert!(!form.is_validating());

    sleep(ms(500)).await;
    assert!(form.is_valid(), "result for old value leaked: {:?}", form.errors());
}

// ============================================================================
// 3. Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn newer_check_cancels_older() {
    let recorder = Recorder::default();
    let form = form(ValidationMode::OnBlur, slow_admin_check(&recorder));

    form.set_field_value("username", json!("admin"));
    form.set_field_touched("username");
    sleep(ms(50)).await;
    form.set_field_value("username", json!("ada"));
    form.set_field_touched("username");
    sleep(ms(500)).await;

    assert_eq!(recorder.calls(), vec![json!("admin"), json!("ada")]);
    assert!(form.is_valid(), "cancelled result leaked: {:?}", form.errors());
    assert!(!form.is_validating());

    let trace = form.coordinator().trace();
    let first = trace
        .events()
        .find(|e| e.event_type() == "started")
        .map(|e| e.token())
        .unwrap();
    assert!(trace.contains_event_type(first, "cancelled"));
    assert!(!trace.contains_event_type(first, "completed"));
    assert!(form.coordinator().verify_trace().is_ok());
}

#[tokio::test(start_paused = true)]
async fn superseded_awaited_check_reports_clean() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let check = AsyncFieldValidator::new(move |_: Value| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                sleep(ms(200)).await;
                return Ok::<_, BoxError>(Some(FieldError::new("TAKEN", "Username is taken")));
            }
            sleep(ms(10)).await;
            Ok(None)
        }
    });
    let form = form(ValidationMode::OnSubmit, check);
    form.set_field_value("username", json!("ada"));

    let (first, second) = tokio::join!(
        form.validate_async(Some("username")),
        form.validate_async(Some("username"))
    );
    assert!(first.unwrap());
    assert!(second.unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    sleep(ms(500)).await;
    assert!(form.is_valid());
    assert!(!form.is_validating());
}

// ============================================================================
// 4. Triggers
// ============================================================================

#[tokio::test(start_paused = true)]
async fn change_validator_ignores_blur() {
    let recorder = Recorder::default();
    let check = username_check(&recorder, ms(10)).on(AsyncTrigger::Change);
    let form = form(ValidationMode::OnBlur, check);

    form.set_field_value("username", json!("ada"));
    form.set_field_touched("username");
    sleep(ms(100)).await;
    assert!(recorder.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn blur_validator_runs_on_touch_in_any_mode() {
    let recorder = Recorder::default();
    let form = form(ValidationMode::OnChange, username_check(&recorder, ms(10)));

    form.set_field_value("username", json!("ada"));
    sleep(ms(100)).await;
    assert!(recorder.calls().is_empty());

    form.set_field_touched("username");
    sleep(ms(100)).await;
    assert_eq!(recorder.calls(), vec![json!("ada")]);
}

#[tokio::test(start_paused = true)]
async fn on_submit_touch_checks_async_without_writing_sync_errors() {
    let recorder = Recorder::default();
    let form = form(ValidationMode::OnSubmit, username_check(&recorder, ms(10)));

    form.set_field_value("username", json!("ab"));
    form.set_field_touched("username");
    sleep(ms(100)).await;
    assert!(form.is_valid());
    assert!(recorder.calls().is_empty());

    form.set_field_value("username", json!("admin"));
    form.set_field_touched("username");
    sleep(ms(100)).await;
    assert_eq!(form.errors()["username"].code, "TAKEN");
}

#[tokio::test(start_paused = true)]
async fn submit_only_validator_waits_for_submit() {
    let recorder = Recorder::default();
    let check = username_check(&recorder, ms(10)).on(AsyncTrigger::Submit);
    let form = form(ValidationMode::OnChange, check);

    form.set_field_value("username", json!("admin"));
    form.set_field_touched("username");
    sleep(ms(100)).await;
    assert!(recorder.calls().is_empty());

    let outcome = form.submit(|_| async {}).await.unwrap();
    assert!(!outcome.is_submitted());
    assert_eq!(recorder.calls(), vec![json!("admin")]);
}

// ============================================================================
// 5. isValidating
// ============================================================================

#[tokio::test(start_paused = true)]
async fn is_validating_tracks_in_flight_checks() {
    let recorder = Recorder::default();
    let form = form(ValidationMode::OnBlur, username_check(&recorder, ms(100)));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = form.store().subscribe(move |state| {
        let mut seen = sink.lock();
        if seen.last() != Some(&state.is_validating) {
            seen.push(state.is_validating);
        }
    });

    form.set_field_value("username", json!("admin"));
    form.set_field_touched("username");
    assert!(form.is_validating());
    sleep(ms(50)).await;
    assert!(form.is_validating());
    sleep(ms(100)).await;
    assert!(!form.is_validating());
    assert_eq!(*seen.lock(), vec![false, true, false]);
    assert_eq!(form.errors()["username"].code, "TAKEN");
}

// ============================================================================
// 6. Reset
// ============================================================================

#[tokio::test(start_paused = true)]
async fn reset_cancels_in_flight_checks() {
    let recorder = Recorder::default();
    let form = form(ValidationMode::OnBlur, slow_admin_check(&recorder));

    form.set_field_value("username", json!("admin"));
    form.set_field_touched("username");
    sleep(ms(50)).await;
    form.reset(None);
    assert!(!form.is_validating());

    sleep(ms(500)).await;
    assert!(form.is_valid());
    assert!(!form.is_validating());
    assert_eq!(recorder.calls().len(), 1);
    let trace = form.coordinator().trace();
    assert!(trace.event_types().contains(&"reset"));
    assert!(!trace.event_types().contains(&"completed"));
}

#[tokio::test(start_paused = true)]
async fn reset_clears_pending_debounce() {
    let recorder = Recorder::default();
    let check = username_check(&recorder, ms(10))
        .on(AsyncTrigger::Change)
        .debounce(ms(300));
    let form = form(ValidationMode::OnChange, check);

    form.set_field_value("username", json!("admin"));
    sleep(ms(100)).await;
    form.reset(None);
    sleep(ms(1000)).await;
    assert!(recorder.calls().is_empty());
    assert!(form.is_valid());
}

// ============================================================================
// Validator failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn validator_errors_propagate_and_release() {
    init_tracing();
    let check = AsyncFieldValidator::new(|_: Value| async {
        sleep(ms(10)).await;
        Err::<Option<FieldError>, BoxError>("service unavailable".into())
    });
    let form = form(ValidationMode::OnBlur, check);
    form.set_field_value("username", json!("ada"));

    let err = form.validate_async(Some("username")).await.unwrap_err();
    assert!(matches!(&err, FormError::AsyncValidator { field, .. } if field == "username"));
    assert!(err.to_string().contains("service unavailable"));
    assert!(!form.is_validating());

    // In the background the failure is only logged.
    form.set_field_touched("username");
    sleep(ms(100)).await;
    assert!(!form.is_validating());
    assert!(form.is_valid());
    assert!(form.coordinator().trace().event_types().contains(&"failed"));
}

// ============================================================================
// 7. Submit
// ============================================================================

#[tokio::test(start_paused = true)]
async fn submit_hands_built_output_to_handler() {
    let recorder = Recorder::default();
    let form = form(ValidationMode::OnSubmit, username_check(&recorder, ms(10)));
    form.set_field_value("username", json!("ada"));

    let store = form.store().clone();
    let outcome = form
        .submit(move |output| async move {
            let submitting = store.get_state().is_submitting;
            (output.get::<String>("username").cloned(), submitting)
        })
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Submitted((Some("ada".to_string()), true))
    );
    assert!(!form.is_submitting());
}

#[tokio::test(start_paused = true)]
async fn submit_blocked_by_sync_errors() {
    let recorder = Recorder::default();
    let form = form(ValidationMode::OnSubmit, username_check(&recorder, ms(10)));
    let ran = AtomicBool::new(false);
    let flag = &ran;

    let outcome = form
        .submit(move |_| async move { flag.store(true, Ordering::SeqCst) })
        .await
        .unwrap();
    match outcome {
        SubmitOutcome::Invalid(errors) => assert_eq!(errors["username"].code, "REQUIRED"),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(!ran.load(Ordering::SeqCst));
    assert!(recorder.calls().is_empty());
    assert_eq!(form.errors()["username"].code, "REQUIRED");
}

#[tokio::test(start_paused = true)]
async fn submit_blocked_by_async_errors() {
    let recorder = Recorder::default();
    let form = form(ValidationMode::OnSubmit, username_check(&recorder, ms(10)));
    form.set_field_value("username", json!("admin"));
    let ran = AtomicBool::new(false);
    let flag = &ran;

    let outcome = form
        .submit(move |_| async move { flag.store(true, Ordering::SeqCst) })
        .await
        .unwrap();
    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("submit should have been blocked");
    };
    assert_eq!(errors["username"].code, "TAKEN");
    assert!(!ran.load(Ordering::SeqCst));
    assert!(!form.is_submitting());
}

#[tokio::test(start_paused = true)]
async fn submit_runs_async_checks_concurrently() {
    init_tracing();
    let slow = |_: Value| async {
        sleep(ms(100)).await;
        Ok::<_, BoxError>(None)
    };
    let form = FormController::new(
        schema(),
        FormOptions::new()
            .async_validator("username", AsyncFieldValidator::new(slow))
            .async_validator("email", AsyncFieldValidator::new(slow)),
    );
    form.set_field_value("username", json!("ada"));
    form.set_field_value("email", json!("ada@example.com"));

    let start = Instant::now();
    let outcome = form.submit(|_| async {}).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Submitted(()));
    assert!(start.elapsed() < ms(150), "took {:?}", start.elapsed());
}
