#![forbid(unsafe_code)]

//! Message sources and the code → text resolution order.
//!
//! Sources are consulted in priority order (form-level override first, then
//! field-level). A function source answers every code it returns a non-empty
//! string for; a map source answers the codes it has keys for. When nothing
//! answers, the [`DefaultMessages`] table is tried, and finally the code is
//! returned unchanged so a message is always displayable.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::error::ERROR_CODE_REQUIRED;

/// Argument passed to function-valued message sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageContext<'a> {
    /// The error code being resolved.
    pub code: &'a str,
}

type MessageFn = Arc<dyn Fn(&MessageContext<'_>) -> String + Send + Sync>;

/// A source of user-facing messages for error codes.
#[derive(Clone)]
pub enum ErrorMessages {
    /// Static code → message table.
    Map(BTreeMap<String, String>),
    /// Computed messages; an empty return means "no message for this code".
    Func(MessageFn),
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self::Map(BTreeMap::new())
    }
}

impl ErrorMessages {
    /// Build a map source from `(code, message)` pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a function source.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&MessageContext<'_>) -> String + Send + Sync + 'static,
    {
        Self::Func(Arc::new(f))
    }

    /// Message this source supplies for `code`, if any. Empty strings count as
    /// no message.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<String> {
        let found = match self {
            Self::Map(map) => map.get(code).cloned(),
            Self::Func(f) => Some(f(&MessageContext { code })),
        };
        found.filter(|msg| !msg.is_empty())
    }

    /// `true` for function sources.
    #[must_use]
    pub fn is_func(&self) -> bool {
        matches!(self, Self::Func(_))
    }
}

impl fmt::Debug for ErrorMessages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ErrorMessages {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::map(iter)
    }
}

/// Combine definition-level and use-site messages.
///
/// Two maps merge key by key with use-site entries winning. As soon as either
/// side is a function there is nothing to merge: the use-site source replaces
/// the definition-level one outright.
#[must_use]
pub fn merge_messages(
    definition: Option<&ErrorMessages>,
    site: Option<&ErrorMessages>,
) -> ErrorMessages {
    match (definition, site) {
        (None, None) => ErrorMessages::default(),
        (None, Some(site)) => site.clone(),
        (Some(definition), None) => definition.clone(),
        (Some(ErrorMessages::Map(base)), Some(ErrorMessages::Map(over))) => {
            let mut merged = base.clone();
            merged.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
            ErrorMessages::Map(merged)
        }
        (Some(_), Some(site)) => site.clone(),
    }
}

// ---------------------------------------------------------------------------
// Default table
// ---------------------------------------------------------------------------

static STANDARD: LazyLock<DefaultMessages> = LazyLock::new(DefaultMessages::default);

/// Last-resort messages consulted after every configured source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultMessages {
    entries: BTreeMap<String, String>,
}

impl Default for DefaultMessages {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            ERROR_CODE_REQUIRED.to_string(),
            "This field is required".to_string(),
        );
        Self { entries }
    }
}

impl DefaultMessages {
    /// The shared built-in table.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// A table with no entries at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace the default for `code`.
    #[must_use]
    pub fn with(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.entries.insert(code.into(), message.into());
        self
    }

    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }
}

/// Resolve `code` to display text.
///
/// `sources` is ordered highest priority first; `None` entries are skipped.
/// Never fails: when no source and no default applies, returns `code`.
#[must_use]
pub fn resolve_message(
    code: &str,
    sources: &[Option<&ErrorMessages>],
    defaults: &DefaultMessages,
) -> String {
    sources
        .iter()
        .flatten()
        .find_map(|source| source.lookup(code))
        .or_else(|| defaults.lookup(code).map(str::to_string))
        .unwrap_or_else(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn std_defaults() -> &'static DefaultMessages {
        DefaultMessages::standard()
    }

    #[test]
    fn form_level_beats_field_level() {
        let form = ErrorMessages::map([("CODE", "A")]);
        let field = ErrorMessages::map([("CODE", "B")]);
        assert_eq!(
            resolve_message("CODE", &[Some(&form), Some(&field)], std_defaults()),
            "A"
        );
        assert_eq!(
            resolve_message("CODE", &[None, Some(&field)], std_defaults()),
            "B"
        );
    }

    #[test]
    fn falls_back_to_default_then_code() {
        assert_eq!(
            resolve_message("REQUIRED", &[None, None], std_defaults()),
            "This field is required"
        );
        assert_eq!(resolve_message("EMAIL", &[], std_defaults()), "EMAIL");
    }

    #[test]
    fn function_source_with_empty_result_defers() {
        let func = ErrorMessages::from_fn(|ctx| {
            if ctx.code == "PATTERN" {
                "bad pattern".to_string()
            } else {
                String::new()
            }
        });
        let field = ErrorMessages::map([("MIN_LENGTH", "too short")]);
        let sources = [Some(&func), Some(&field)];
        assert_eq!(resolve_message("PATTERN", &sources, std_defaults()), "bad pattern");
        assert_eq!(resolve_message("MIN_LENGTH", &sources, std_defaults()), "too short");
    }

    #[test]
    fn empty_map_entry_is_not_a_message() {
        let form = ErrorMessages::map([("REQUIRED", "")]);
        assert_eq!(
            resolve_message("REQUIRED", &[Some(&form)], std_defaults()),
            "This field is required"
        );
    }

    #[test]
    fn custom_default_table() {
        let defaults = DefaultMessages::empty().with("REQUIRED", "Pflichtfeld");
        assert_eq!(resolve_message("REQUIRED", &[], &defaults), "Pflichtfeld");
        assert_eq!(resolve_message("REQUIRED", &[], &DefaultMessages::empty()), "REQUIRED");
    }

    #[test]
    fn merge_maps_site_wins() {
        let def = ErrorMessages::map([("A", "def-a"), ("B", "def-b")]);
        let site = ErrorMessages::map([("B", "site-b")]);
        let merged = merge_messages(Some(&def), Some(&site));
        assert_eq!(merged.lookup("A").as_deref(), Some("def-a"));
        assert_eq!(merged.lookup("B").as_deref(), Some("site-b"));
    }

    #[test]
    fn merge_function_replaces_outright() {
        let def = ErrorMessages::map([("A", "def-a")]);
        let site = ErrorMessages::from_fn(|ctx| format!("site:{}", ctx.code));
        let merged = merge_messages(Some(&def), Some(&site));
        assert!(merged.is_func());
        assert_eq!(merged.lookup("A").as_deref(), Some("site:A"));

        // Function on the definition side: the site map replaces it.
        let def = ErrorMessages::from_fn(|_| "def".to_string());
        let site = ErrorMessages::map([("B", "site-b")]);
        let merged = merge_messages(Some(&def), Some(&site));
        assert!(!merged.is_func());
        assert_eq!(merged.lookup("A"), None);
    }

    #[test]
    fn merge_with_missing_sides() {
        let only = ErrorMessages::map([("A", "a")]);
        assert_eq!(merge_messages(None, Some(&only)).lookup("A").as_deref(), Some("a"));
        assert_eq!(merge_messages(Some(&only), None).lookup("A").as_deref(), Some("a"));
        assert_eq!(merge_messages(None, None).lookup("A"), None);
    }
}
