#![forbid(unsafe_code)]

//! Error maps and error-key addressing.
//!
//! Scalar fields report under their bare name. Array fields report
//! array-level problems under the bare name and per-item problems under
//! `name[index]`.

use indexmap::IndexMap;
use thiserror::Error;
use vorm_core::FieldError;

/// Errors for a whole form, keyed by error key, in field declaration order.
pub type FormErrors = IndexMap<String, FieldError>;

/// Errors for one field keyed relative to the field name: `""` for the field
/// itself, `"[i]"` for array items.
pub type FieldErrors = IndexMap<String, FieldError>;

/// Output construction failed for a field that was expected to be valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot build output for `{field}`: {code}")]
pub struct BuildError {
    /// Error key of the offending value.
    pub field: String,
    /// Brand of the value object that refused it, when there was one.
    pub brand: Option<String>,
    /// Failing rule code, or `INVALID_TYPE`.
    pub code: String,
}

/// Compose an error key from a field name and a relative suffix.
#[must_use]
pub fn error_key(name: &str, suffix: &str) -> String {
    let mut key = String::with_capacity(name.len() + suffix.len());
    key.push_str(name);
    key.push_str(suffix);
    key
}

/// Relative key of an array item.
#[must_use]
pub fn index_suffix(index: usize) -> String {
    format!("[{index}]")
}

/// An error key split into its field name and optional item index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub name: String,
    pub index: Option<usize>,
}

/// Split `tags[1]` into `("tags", Some(1))`. Keys without a trailing numeric
/// index are returned whole.
#[must_use]
pub fn parse_field_path(key: &str) -> FieldPath {
    let indexed = key
        .strip_suffix(']')
        .and_then(|head| head.rsplit_once('['))
        .and_then(|(name, digits)| digits.parse::<usize>().ok().map(|i| (name, i)));
    match indexed {
        Some((name, index)) => FieldPath {
            name: name.to_string(),
            index: Some(index),
        },
        None => FieldPath {
            name: key.to_string(),
            index: None,
        },
    }
}

/// Prefix every relative key in `field_errors` with `name` and append them to
/// `into`.
pub(crate) fn merge_under(into: &mut FormErrors, name: &str, field_errors: FieldErrors) {
    for (suffix, error) in field_errors {
        into.insert(error_key(name, &suffix), error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compose() {
        assert_eq!(error_key("tags", &index_suffix(3)), "tags[3]");
        assert_eq!(error_key("email", ""), "email");
    }

    #[test]
    fn parses_indexed_paths() {
        assert_eq!(
            parse_field_path("tags[12]"),
            FieldPath {
                name: "tags".to_string(),
                index: Some(12)
            }
        );
        assert_eq!(parse_field_path("email").index, None);
        assert_eq!(parse_field_path("odd[x]").name, "odd[x]");
        assert_eq!(parse_field_path("[0]").name, "");
    }

    #[test]
    fn merge_prefixes_keys() {
        let mut all = FormErrors::new();
        let mut field = FieldErrors::new();
        field.insert(String::new(), FieldError::new("MIN_LENGTH", "m"));
        field.insert(index_suffix(1), FieldError::new("PATTERN", "p"));
        merge_under(&mut all, "tags", field);
        let keys: Vec<_> = all.keys().cloned().collect();
        assert_eq!(keys, vec!["tags", "tags[1]"]);
    }
}
