#![forbid(unsafe_code)]

//! Built-in rules for common patterns.
//!
//! Every function here returns a fresh [`Rule`]; parameterized ones close over
//! their argument the same way factories from [`create_rule`](crate::create_rule)
//! do. Codes are stable identifiers meant for message lookup.

use regex::Regex;

use crate::error::{ERROR_CODE_MAX_LENGTH, ERROR_CODE_MIN_LENGTH};
use crate::rule::Rule;

/// Error code for pattern mismatches.
pub const ERROR_CODE_PATTERN: &str = "PATTERN";
/// Error code for malformed email addresses.
pub const ERROR_CODE_EMAIL: &str = "EMAIL";
/// Error code for malformed URLs.
pub const ERROR_CODE_URL: &str = "URL";
/// Error code for values outside an inclusive range.
pub const ERROR_CODE_RANGE: &str = "RANGE";
/// Error code for values below a minimum.
pub const ERROR_CODE_MIN: &str = "MIN";
/// Error code for values above a maximum.
pub const ERROR_CODE_MAX: &str = "MAX";
/// Error code for whitespace-only strings.
pub const ERROR_CODE_NOT_BLANK: &str = "NOT_BLANK";

/// At least `min` characters (Unicode scalar values, not bytes).
#[must_use]
pub fn min_length(min: usize) -> Rule<String> {
    Rule::new(ERROR_CODE_MIN_LENGTH, move |value: &String| {
        value.chars().count() >= min
    })
}

/// At most `max` characters.
#[must_use]
pub fn max_length(max: usize) -> Rule<String> {
    Rule::new(ERROR_CODE_MAX_LENGTH, move |value: &String| {
        value.chars().count() <= max
    })
}

/// The whole value matches `regex` somewhere (use anchors for full matches).
#[must_use]
pub fn pattern(regex: Regex) -> Rule<String> {
    Rule::new(ERROR_CODE_PATTERN, move |value: &String| regex.is_match(value))
}

/// Rejects strings made only of whitespace.
#[must_use]
pub fn not_blank() -> Rule<String> {
    Rule::new(ERROR_CODE_NOT_BLANK, |value: &String| {
        !value.trim().is_empty()
    })
}

/// A plausible email address: `local@domain.tld`, TLD of two or more
/// characters, no empty domain labels.
#[must_use]
pub fn email() -> Rule<String> {
    Rule::new(ERROR_CODE_EMAIL, |value: &String| is_email(value))
}

/// An `http://` or `https://` URL with a non-empty remainder.
#[must_use]
pub fn url() -> Rule<String> {
    Rule::new(ERROR_CODE_URL, |value: &String| is_url(value, false))
}

/// An `https://` URL with a non-empty remainder.
#[must_use]
pub fn https_url() -> Rule<String> {
    Rule::new(ERROR_CODE_URL, |value: &String| is_url(value, true))
}

/// Inclusive range check.
#[must_use]
pub fn range<T>(min: T, max: T) -> Rule<T>
where
    T: PartialOrd + Send + Sync + 'static,
{
    Rule::new(ERROR_CODE_RANGE, move |value: &T| {
        *value >= min && *value <= max
    })
}

/// Inclusive lower bound.
#[must_use]
pub fn min<T>(min: T) -> Rule<T>
where
    T: PartialOrd + Send + Sync + 'static,
{
    Rule::new(ERROR_CODE_MIN, move |value: &T| *value >= min)
}

/// Inclusive upper bound.
#[must_use]
pub fn max<T>(max: T) -> Rule<T>
where
    T: PartialOrd + Send + Sync + 'static,
{
    Rule::new(ERROR_CODE_MAX, move |value: &T| *value <= max)
}

fn is_email(value: &str) -> bool {
    let trimmed = value.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if !domain.contains('.') {
        return false;
    }
    if domain.split('.').any(str::is_empty) {
        return false;
    }
    domain
        .rsplit('.')
        .next()
        .is_some_and(|tld| tld.chars().count() >= 2)
}

fn is_url(value: &str, require_https: bool) -> bool {
    let trimmed = value.trim();
    let rest = if let Some(rest) = trimmed.strip_prefix("https://") {
        rest
    } else if !require_https && let Some(rest) = trimmed.strip_prefix("http://") {
        rest
    } else {
        return false;
    };
    !rest.is_empty()
}
