#![forbid(unsafe_code)]

//! Standard Schema v1 for whole forms.

use serde_json::Value;
use vorm_core::{Issue, StandardSchema};

use crate::output::{FormOutput, build_output_values};
use crate::schema::{FormSchema, FormValues};
use crate::validate::validate_form;

impl StandardSchema for FormSchema {
    type Output = FormOutput;

    /// Non-object inputs are validated as an empty form.
    fn validate(&self, value: &Value) -> Result<FormOutput, Vec<Issue>> {
        let empty = FormValues::new();
        let values = value.as_object().unwrap_or(&empty);
        let errors = validate_form(values, self);
        if !errors.is_empty() {
            return Err(errors
                .into_iter()
                .map(|(key, error)| {
                    let message = if error.message.is_empty() {
                        error.code
                    } else {
                        error.message
                    };
                    Issue::at_key(message, key)
                })
                .collect());
        }
        build_output_values(values, self.fields())
            .map_err(|err| vec![Issue::at_key(err.code, err.field)])
    }
}
