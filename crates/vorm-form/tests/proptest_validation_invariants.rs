//! Property-based invariant tests for the validation engine.
//!
//! 1. Rule ordering: when several rules fail, the first declared one is
//!    reported by `create`, `safe_create` and `validate_field` alike.
//! 2. Empty-optional invariance: optional fields accept missing, `null` and
//!    `""` whatever their rules.
//! 3. `safe_create` succeeds exactly when `validate_field` on a required field
//!    built from the same value object reports nothing.
//! 4. Array indexing: item errors appear exactly at the indexes of bad items.
//! 5. Message priority: form-level beats field-level beats defaults.
//! 6. Field paths: `parse_field_path(error_key(name, "[i]"))` recovers both.

use proptest::prelude::*;
use serde_json::{Value, json};
use vorm_core::{ErrorMessages, Rule, ValueObject, brand, rules, vo};
use vorm_form::{
    ArrayOptions, FieldOptions, create_field, create_form_schema, create_primitive_array_field,
    error_key, parse_field_path, validate_array_field, validate_field, validate_form,
};

brand!(Code);

// ── Strategies ────────────────────────────────────────────────────────────

fn code_vo(min: usize, max: usize) -> ValueObject<String, Code> {
    vo(vec![
        rules::min_length(min),
        rules::max_length(max),
        Rule::new("ALNUM", |v: &String| v.chars().all(char::is_alphanumeric)),
    ])
}

fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _-]{0,12}"
}

// ── 1. Rule ordering ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn first_declared_failure_is_reported(input in text(), min in 0usize..8, span in 0usize..8) {
        let code = code_vo(min, min + span);
        let expected = code
            .rules()
            .iter()
            .find(|rule| !rule.validate(&input))
            .map(|rule| rule.code().to_string());

        let field = create_field(code.clone(), FieldOptions::new()).required();
        let from_field = validate_field(Some(&input), &field, None).map(|e| e.code);
        let from_safe = code.safe_create(input.clone()).err().map(|e| e.code);
        let from_create = code.create(input.clone()).err().map(|e| e.code);

        if input.is_empty() {
            prop_assert_eq!(from_field.as_deref(), Some("REQUIRED"));
        } else {
            prop_assert_eq!(&from_field, &expected);
        }
        prop_assert_eq!(&from_safe, &expected);
        prop_assert_eq!(&from_create, &expected);
    }
}

// ── 2. Empty-optional invariance ──────────────────────────────────────────

proptest! {
    #[test]
    fn optional_empty_is_always_valid(min in 1usize..20) {
        let optional = create_field(code_vo(min, min), FieldOptions::new()).optional();
        prop_assert!(validate_field(None, &optional, None).is_none());
        prop_assert!(validate_field(Some(&String::new()), &optional, None).is_none());

        let schema = create_form_schema().field("code", optional).build();
        for value in [json!({}), json!({"code": null}), json!({"code": ""})] {
            prop_assert!(validate_form(value.as_object().unwrap(), &schema).is_empty());
        }
    }
}

// ── 3. safe_create ⇔ validate_field ───────────────────────────────────────

proptest! {
    #[test]
    fn safe_create_agrees_with_validate_field(input in "[a-z0-9!]{1,10}", min in 0usize..6) {
        let code = code_vo(min, 8);
        let field = create_field(code.clone(), FieldOptions::new()).required();
        prop_assert_eq!(
            code.safe_create(input.clone()).is_ok(),
            validate_field(Some(&input), &field, None).is_none()
        );
    }
}

// ── 4. Array indexing ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn item_errors_sit_at_bad_indexes(items in prop::collection::vec("[a-z]{0,4}", 1..10)) {
        let tags = create_primitive_array_field(vec![rules::min_length(2)], None)
            .build(ArrayOptions::optional());
        let errors = validate_array_field(Some(items.as_slice()), &tags, None);

        let expected: Vec<String> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.chars().count() < 2)
            .map(|(i, _)| format!("[{i}]"))
            .collect();
        let actual: Vec<String> = errors.keys().cloned().collect();
        prop_assert_eq!(actual, expected);
    }
}

// ── 5. Message priority ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn form_messages_win_over_field_messages(form_msg in "[A-Z]{1,6}", field_msg in "[a-z]{1,6}") {
        let field = create_field(
            code_vo(3, 3),
            FieldOptions::new().messages(ErrorMessages::map([("MIN_LENGTH", field_msg.clone())])),
        )
        .required();
        let form = ErrorMessages::map([("MIN_LENGTH", form_msg.clone())]);
        let short = "x".to_string();

        let with_form = validate_field(Some(&short), &field, Some(&form)).unwrap();
        let without_form = validate_field(Some(&short), &field, None).unwrap();
        prop_assert_eq!(with_form.message, form_msg);
        prop_assert_eq!(without_form.message, field_msg);
    }
}

// ── 6. Field paths ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn error_keys_parse_back(name in "[a-zA-Z_][a-zA-Z0-9_]{0,10}", index in 0usize..10_000) {
        let path = parse_field_path(&error_key(&name, &format!("[{index}]")));
        prop_assert_eq!(path.name, name.clone());
        prop_assert_eq!(path.index, Some(index));
        prop_assert_eq!(parse_field_path(&name).index, None);
    }
}

#[test]
fn array_form_values_use_bracketed_keys() {
    let schema = create_form_schema()
        .field(
            "tags",
            create_primitive_array_field(vec![rules::min_length(2)], None)
                .build(ArrayOptions::optional()),
        )
        .build();
    let values: Value = json!({"tags": ["ab", "x"]});
    let errors = validate_form(values.as_object().unwrap(), &schema);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["tags[1]"].code, "MIN_LENGTH");
}
