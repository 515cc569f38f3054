#![forbid(unsafe_code)]

//! Runtime configuration: validation mode, default async trigger, trace size.
//!
//! Values come from code (`FormConfig::default().with_mode(..)`), from serde
//! (any format), or from the environment via [`FormConfig::from_env`].
//!
//! | Variable | Values | Default |
//! |---|---|---|
//! | `VORM_VALIDATION_MODE` | `onChange`, `onBlur`, `onTouched`, `onSubmit` | `onSubmit` |
//! | `VORM_ASYNC_TRIGGER` | `change`, `blur`, `submit` | `blur` |
//! | `VORM_TRACE_CAPACITY` | non-negative integer, `0` disables | `256` |

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;
use vorm_form::FormValues;

use crate::async_validator::AsyncValidators;

pub const ENV_VALIDATION_MODE: &str = "VORM_VALIDATION_MODE";
pub const ENV_ASYNC_TRIGGER: &str = "VORM_ASYNC_TRIGGER";
pub const ENV_TRACE_CAPACITY: &str = "VORM_TRACE_CAPACITY";

/// Default number of coordinator events kept for inspection.
pub const DEFAULT_TRACE_CAPACITY: usize = 256;

/// Error returned when a mode or trigger name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseConfigError {
    pub kind: &'static str,
    pub value: String,
}

/// Lowercase and drop `_`/`-` so `onBlur`, `on_blur` and `ON-BLUR` agree.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// ValidationMode
// ---------------------------------------------------------------------------

/// When synchronous field validation runs automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    /// Every value change validates the field.
    OnChange,
    /// Touching (blurring) a field validates it.
    OnBlur,
    /// Blur validates; changes validate once the field has been touched.
    OnTouched,
    /// Nothing validates until submit or an explicit `validate` call.
    #[default]
    OnSubmit,
}

impl ValidationMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnChange => "onChange",
            Self::OnBlur => "onBlur",
            Self::OnTouched => "onTouched",
            Self::OnSubmit => "onSubmit",
        }
    }
}

impl FromStr for ValidationMode {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "onchange" => Ok(Self::OnChange),
            "onblur" => Ok(Self::OnBlur),
            "ontouched" => Ok(Self::OnTouched),
            "onsubmit" => Ok(Self::OnSubmit),
            _ => Err(ParseConfigError {
                kind: "validation mode",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AsyncTrigger
// ---------------------------------------------------------------------------

/// The interaction that schedules a field's asynchronous check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AsyncTrigger {
    Change,
    #[default]
    Blur,
    /// Only whole-form submission (or `validate_async`) runs the check.
    Submit,
}

impl AsyncTrigger {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Change => "change",
            Self::Blur => "blur",
            Self::Submit => "submit",
        }
    }
}

impl FromStr for AsyncTrigger {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "change" => Ok(Self::Change),
            "blur" => Ok(Self::Blur),
            "submit" => Ok(Self::Submit),
            _ => Err(ParseConfigError {
                kind: "async trigger",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for AsyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FormConfig
// ---------------------------------------------------------------------------

/// Behavior knobs for a [`FormController`](crate::FormController).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    pub mode: ValidationMode,
    /// Trigger for async validators that do not name their own.
    pub default_trigger: AsyncTrigger,
    /// Coordinator trace size; `0` disables tracing.
    pub trace_capacity: usize,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::default(),
            default_trigger: AsyncTrigger::default(),
            trace_capacity: DEFAULT_TRACE_CAPACITY,
        }
    }
}

impl FormConfig {
    #[must_use]
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_default_trigger(mut self, trigger: AsyncTrigger) -> Self {
        self.default_trigger = trigger;
        self
    }

    #[must_use]
    pub fn with_trace_capacity(mut self, capacity: usize) -> Self {
        self.trace_capacity = capacity;
        self
    }

    /// Read overrides from the process environment.
    ///
    /// Unrecognized values are logged and leave the default in place.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Read overrides through `get`, which maps a variable name to its value.
    #[must_use]
    pub fn from_env_with<F>(mut get: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = get(ENV_VALIDATION_MODE) {
            match value.parse() {
                Ok(mode) => config.mode = mode,
                Err(err) => warn!(var = ENV_VALIDATION_MODE, %err, "ignoring config override"),
            }
        }

        if let Some(value) = get(ENV_ASYNC_TRIGGER) {
            match value.parse() {
                Ok(trigger) => config.default_trigger = trigger,
                Err(err) => warn!(var = ENV_ASYNC_TRIGGER, %err, "ignoring config override"),
            }
        }

        if let Some(value) = get(ENV_TRACE_CAPACITY) {
            match value.trim().parse::<usize>() {
                Ok(capacity) => config.trace_capacity = capacity,
                Err(err) => warn!(
                    var = ENV_TRACE_CAPACITY,
                    value = %value,
                    %err,
                    "ignoring config override"
                ),
            }
        }

        config
    }
}

// ---------------------------------------------------------------------------
// FormOptions
// ---------------------------------------------------------------------------

/// Everything a controller needs besides the schema.
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    pub default_values: FormValues,
    pub config: FormConfig,
    pub async_validators: AsyncValidators,
}

impl FormOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn default_values(mut self, values: FormValues) -> Self {
        self.default_values = values;
        self
    }

    #[must_use]
    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: ValidationMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Attach an asynchronous validator to `name`.
    #[must_use]
    pub fn async_validator(
        mut self,
        name: impl Into<String>,
        validator: crate::async_validator::AsyncFieldValidator,
    ) -> Self {
        self.async_validators.insert(name.into(), validator);
        self
    }
}
