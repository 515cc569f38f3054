#![forbid(unsafe_code)]

//! Named predicates and rule factories.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A named boolean predicate over a value.
///
/// Rules are immutable and cheap to clone; clones share the predicate.
pub struct Rule<T> {
    code: Cow<'static, str>,
    predicate: Predicate<T>,
}

impl<T> Rule<T> {
    /// Create a rule from a code and a predicate returning `true` for valid
    /// values.
    pub fn new<F>(code: impl Into<Cow<'static, str>>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            code: code.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// The code reported when this rule fails.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns `true` if `value` satisfies the rule.
    #[must_use]
    pub fn validate(&self, value: &T) -> bool {
        (self.predicate)(value)
    }
}

impl<T> Clone for Rule<T> {
    fn clone(&self) -> Self {
        Self {
            code: self.code.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("code", &self.code).finish()
    }
}

/// Build a parameterized rule factory.
///
/// The returned closure captures `code` and `predicate`; every call with a
/// parameter yields an independent [`Rule`] closing over that parameter.
///
/// ```rust
/// use vorm_core::create_rule;
///
/// let min_len = create_rule("MIN_LENGTH", |value: &String, min: &usize| {
///     value.chars().count() >= *min
/// });
/// let at_least_3 = min_len(3);
/// let at_least_8 = min_len(8);
///
/// assert!(at_least_3.validate(&"abcd".to_string()));
/// assert!(!at_least_8.validate(&"abcd".to_string()));
/// assert_eq!(at_least_8.code(), "MIN_LENGTH");
/// ```
pub fn create_rule<T, P, F>(
    code: impl Into<Cow<'static, str>>,
    predicate: F,
) -> impl Fn(P) -> Rule<T> + Clone + Send + Sync + 'static
where
    T: 'static,
    P: Send + Sync + 'static,
    F: Fn(&T, &P) -> bool + Send + Sync + 'static,
{
    let code: Cow<'static, str> = code.into();
    let predicate = Arc::new(predicate);
    move |param: P| {
        let predicate = Arc::clone(&predicate);
        Rule::new(code.clone(), move |value: &T| (*predicate)(value, &param))
    }
}

/// Build a factory for a rule that takes no parameter.
///
/// ```rust
/// use vorm_core::create_plain_rule;
///
/// let no_spaces = create_plain_rule("NO_SPACES", |value: &String| !value.contains(' '));
/// assert!(no_spaces().validate(&"alice".to_string()));
/// assert!(!no_spaces().validate(&"a b".to_string()));
/// ```
pub fn create_plain_rule<T, F>(
    code: impl Into<Cow<'static, str>>,
    predicate: F,
) -> impl Fn() -> Rule<T> + Clone + Send + Sync + 'static
where
    T: 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    let rule = Rule::new(code, predicate);
    move || rule.clone()
}
