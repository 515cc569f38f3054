#![forbid(unsafe_code)]

//! Field schemas and their two-stage factories.
//!
//! A factory is built once per field *kind* (definition-level messages,
//! `parse`, `format`) and then called once per use site (`required`, use-site
//! messages). Rules are copied into every schema the factory builds.

use std::fmt;
use std::sync::Arc;

use vorm_core::{ErrorMessages, Rule, ValueObjectLike, VoValidationError, merge_messages};

/// Converts raw text (e.g. from a text input) into a field input.
pub type ParseFn<T> = Arc<dyn Fn(&str) -> T + Send + Sync>;
/// Renders a field input for display.
pub type FormatFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Where a field's output value comes from.
pub enum FieldSource<T, O> {
    /// Backed by a value object: output is whatever its `create` returns.
    ValueObject(Arc<dyn ValueObjectLike<T, Output = O>>),
    /// Plain field: the input is converted by the given function.
    Primitive(fn(T) -> O),
}

impl<T, O> FieldSource<T, O> {
    /// Produce the output value for an already validated input.
    pub fn create(&self, input: T) -> Result<O, VoValidationError<T>> {
        match self {
            Self::ValueObject(vo) => vo.create(input),
            Self::Primitive(convert) => Ok(convert(input)),
        }
    }

    /// Brand of the backing value object, if any.
    #[must_use]
    pub fn brand(&self) -> Option<&str> {
        match self {
            Self::ValueObject(vo) => Some(vo.brand()),
            Self::Primitive(_) => None,
        }
    }

    #[must_use]
    pub fn is_value_object(&self) -> bool {
        matches!(self, Self::ValueObject(_))
    }
}

impl<T, O> Clone for FieldSource<T, O> {
    fn clone(&self) -> Self {
        match self {
            Self::ValueObject(vo) => Self::ValueObject(Arc::clone(vo)),
            Self::Primitive(convert) => Self::Primitive(*convert),
        }
    }
}

impl<T, O> fmt::Debug for FieldSource<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueObject(vo) => f.debug_tuple("ValueObject").field(&vo.brand()).finish(),
            Self::Primitive(_) => f.write_str("Primitive"),
        }
    }
}

pub(crate) fn identity<T>(value: T) -> T {
    value
}

// ---------------------------------------------------------------------------
// FieldSchema
// ---------------------------------------------------------------------------

/// A fully configured field: source, required policy, messages, rules and
/// optional text conversions.
pub struct FieldSchema<T, O = T> {
    source: FieldSource<T, O>,
    required: bool,
    messages: ErrorMessages,
    rules: Vec<Rule<T>>,
    parse: Option<ParseFn<T>>,
    format: Option<FormatFn<T>>,
}

impl<T, O> FieldSchema<T, O> {
    #[must_use]
    pub fn source(&self) -> &FieldSource<T, O> {
        &self.source
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Messages after merging definition-level and use-site configuration.
    #[must_use]
    pub fn messages(&self) -> &ErrorMessages {
        &self.messages
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    #[must_use]
    pub fn has_parse(&self) -> bool {
        self.parse.is_some()
    }

    /// Apply `parse`, if configured.
    pub fn parse_raw(&self, raw: &str) -> Option<T> {
        self.parse.as_ref().map(|parse| parse(raw))
    }

    /// Apply `format`, if configured.
    pub fn format_value(&self, value: &T) -> Option<String> {
        self.format.as_ref().map(|format| format(value))
    }

    /// Produce the output value; see [`FieldSource::create`].
    pub fn create(&self, input: T) -> Result<O, VoValidationError<T>> {
        self.source.create(input)
    }
}

impl<T, O> Clone for FieldSchema<T, O> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            required: self.required,
            messages: self.messages.clone(),
            rules: self.rules.clone(),
            parse: self.parse.clone(),
            format: self.format.clone(),
        }
    }
}

impl<T, O> fmt::Debug for FieldSchema<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("source", &self.source)
            .field("required", &self.required)
            .field("messages", &self.messages)
            .field("rules", &self.rules)
            .field("parse", &self.parse.is_some())
            .field("format", &self.format.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Definition-level options shared by every use of a field kind.
pub struct FieldOptions<T> {
    messages: Option<ErrorMessages>,
    parse: Option<ParseFn<T>>,
    format: Option<FormatFn<T>>,
}

impl<T> Default for FieldOptions<T> {
    fn default() -> Self {
        Self {
            messages: None,
            parse: None,
            format: None,
        }
    }
}

impl<T> FieldOptions<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(mut self, messages: ErrorMessages) -> Self {
        self.messages = Some(messages);
        self
    }

    #[must_use]
    pub fn parse<F>(mut self, parse: F) -> Self
    where
        F: Fn(&str) -> T + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(parse));
        self
    }

    #[must_use]
    pub fn format<F>(mut self, format: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.format = Some(Arc::new(format));
        self
    }
}

/// Use-site options.
#[derive(Debug, Clone, Default)]
pub struct SiteOptions {
    pub required: bool,
    pub messages: Option<ErrorMessages>,
}

impl SiteOptions {
    #[must_use]
    pub fn required() -> Self {
        Self {
            required: true,
            messages: None,
        }
    }

    #[must_use]
    pub fn optional() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(mut self, messages: ErrorMessages) -> Self {
        self.messages = Some(messages);
        self
    }
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

/// Second stage of field construction.
pub struct FieldFactory<T, O = T> {
    source: FieldSource<T, O>,
    rules: Vec<Rule<T>>,
    messages: Option<ErrorMessages>,
    parse: Option<ParseFn<T>>,
    format: Option<FormatFn<T>>,
}

impl<T, O> FieldFactory<T, O> {
    pub(crate) fn without_text(
        source: FieldSource<T, O>,
        rules: Vec<Rule<T>>,
        messages: Option<ErrorMessages>,
    ) -> Self {
        Self {
            source,
            rules,
            messages,
            parse: None,
            format: None,
        }
    }

    /// Build a schema for one use site.
    #[must_use]
    pub fn build(&self, site: SiteOptions) -> FieldSchema<T, O> {
        FieldSchema {
            source: self.source.clone(),
            required: site.required,
            messages: merge_messages(self.messages.as_ref(), site.messages.as_ref()),
            rules: self.rules.clone(),
            parse: self.parse.clone(),
            format: self.format.clone(),
        }
    }

    /// `build(SiteOptions::required())`.
    #[must_use]
    pub fn required(&self) -> FieldSchema<T, O> {
        self.build(SiteOptions::required())
    }

    /// `build(SiteOptions::optional())`.
    #[must_use]
    pub fn optional(&self) -> FieldSchema<T, O> {
        self.build(SiteOptions::optional())
    }
}

impl<T, O> Clone for FieldFactory<T, O> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            rules: self.rules.clone(),
            messages: self.messages.clone(),
            parse: self.parse.clone(),
            format: self.format.clone(),
        }
    }
}

/// Start a field backed by a value object. Rules are taken from `vo`.
pub fn create_field<T, V>(vo: V, options: FieldOptions<T>) -> FieldFactory<T, V::Output>
where
    T: 'static,
    V: ValueObjectLike<T> + 'static,
{
    let rules = vo.rules().to_vec();
    FieldFactory {
        source: FieldSource::ValueObject(Arc::new(vo)),
        rules,
        messages: options.messages,
        parse: options.parse,
        format: options.format,
    }
}

/// Start a plain field validated by explicit `rules`; output equals input.
#[must_use]
pub fn create_primitive_field<T>(rules: Vec<Rule<T>>, options: FieldOptions<T>) -> FieldFactory<T> {
    FieldFactory {
        source: FieldSource::Primitive(identity::<T>),
        rules,
        messages: options.messages,
        parse: options.parse,
        format: options.format,
    }
}
