#![forbid(unsafe_code)]

//! Conversion between dynamic form values and typed field inputs.
//!
//! Form values travel as [`serde_json::Value`]. A missing key and
//! `Value::Null` both mean "no value"; `""` is the empty string and counts as
//! empty too.

use serde_json::{Number, Value};

/// A type a field can validate.
pub trait FieldInput: Clone + Send + Sync + 'static {
    /// Read a typed value, or `None` if `value` has the wrong shape.
    fn from_value(value: &Value) -> Option<Self>;

    /// Convert back to a dynamic value.
    fn to_value(&self) -> Value;

    /// Whether this value counts as empty for required/optional checks.
    fn is_blank(&self) -> bool {
        false
    }

    /// Default textual rendering when the field has no `format`.
    fn display(&self) -> String;
}

/// `true` for a missing value, `null`, or the empty string.
#[must_use]
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Render a dynamic value as display text (`null` and missing become `""`).
#[must_use]
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl FieldInput for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn is_blank(&self) -> bool {
        self.is_empty()
    }

    fn display(&self) -> String {
        self.clone()
    }
}

impl FieldInput for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn display(&self) -> String {
        self.to_string()
    }
}

impl FieldInput for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn is_blank(&self) -> bool {
        is_empty_value(Some(self))
    }

    fn display(&self) -> String {
        display_value(Some(self))
    }
}

macro_rules! impl_signed {
    ($($t:ty),+) => {$(
        impl FieldInput for $t {
            fn from_value(value: &Value) -> Option<Self> {
                value.as_i64().and_then(|n| <$t>::try_from(n).ok())
            }

            fn to_value(&self) -> Value {
                Value::Number(Number::from(*self))
            }

            fn display(&self) -> String {
                self.to_string()
            }
        }
    )+};
}

macro_rules! impl_unsigned {
    ($($t:ty),+) => {$(
        impl FieldInput for $t {
            fn from_value(value: &Value) -> Option<Self> {
                value.as_u64().and_then(|n| <$t>::try_from(n).ok())
            }

            fn to_value(&self) -> Value {
                Value::Number(Number::from(*self))
            }

            fn display(&self) -> String {
                self.to_string()
            }
        }
    )+};
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(u8, u16, u32, u64, usize);

impl FieldInput for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn to_value(&self) -> Value {
        Number::from_f64(*self).map_or(Value::Null, Value::Number)
    }

    fn display(&self) -> String {
        self.to_string()
    }
}

impl FieldInput for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64().map(|n| n as f32)
    }

    fn to_value(&self) -> Value {
        Number::from_f64(f64::from(*self)).map_or(Value::Null, Value::Number)
    }

    fn display(&self) -> String {
        self.to_string()
    }
}
