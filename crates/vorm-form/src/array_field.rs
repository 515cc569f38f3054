#![forbid(unsafe_code)]

//! Array fields: an item schema plus array-level policy.
//!
//! The item schema is always required. Only the array's own `required` flag
//! decides whether a missing or empty array is acceptable.

use std::fmt;
use std::sync::Arc;

use vorm_core::{ErrorMessages, Rule, ValueObjectLike, merge_messages};

use crate::field::{FieldFactory, FieldSchema, FieldSource, SiteOptions, identity};

/// A validated list of items sharing one item schema.
pub struct ArrayFieldSchema<T, O = T> {
    item: FieldSchema<T, O>,
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    messages: ErrorMessages,
}

impl<T, O> ArrayFieldSchema<T, O> {
    #[must_use]
    pub fn item(&self) -> &FieldSchema<T, O> {
        &self.item
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    #[must_use]
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Array-level messages (`REQUIRED`, `MIN_LENGTH`, `MAX_LENGTH`, ...).
    #[must_use]
    pub fn messages(&self) -> &ErrorMessages {
        &self.messages
    }
}

impl<T, O> Clone for ArrayFieldSchema<T, O> {
    fn clone(&self) -> Self {
        Self {
            item: self.item.clone(),
            required: self.required,
            min_length: self.min_length,
            max_length: self.max_length,
            messages: self.messages.clone(),
        }
    }
}

impl<T, O> fmt::Debug for ArrayFieldSchema<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayFieldSchema")
            .field("item", &self.item)
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("messages", &self.messages)
            .finish()
    }
}

/// Use-site options for an array field.
#[derive(Debug, Clone, Default)]
pub struct ArrayOptions {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub messages: Option<ErrorMessages>,
}

impl ArrayOptions {
    #[must_use]
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn optional() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    #[must_use]
    pub fn messages(mut self, messages: ErrorMessages) -> Self {
        self.messages = Some(messages);
        self
    }
}

/// Second stage of array-field construction.
pub struct ArrayFieldFactory<T, O = T> {
    item: FieldFactory<T, O>,
    messages: Option<ErrorMessages>,
}

impl<T, O> ArrayFieldFactory<T, O> {
    /// Build an array schema for one use site. Use-site messages reach both
    /// the array and its items.
    #[must_use]
    pub fn build(&self, options: ArrayOptions) -> ArrayFieldSchema<T, O> {
        let item = self.item.build(SiteOptions {
            required: true,
            messages: options.messages.clone(),
        });
        ArrayFieldSchema {
            item,
            required: options.required,
            min_length: options.min_length,
            max_length: options.max_length,
            messages: merge_messages(self.messages.as_ref(), options.messages.as_ref()),
        }
    }
}

impl<T, O> Clone for ArrayFieldFactory<T, O> {
    fn clone(&self) -> Self {
        Self {
            item: self.item.clone(),
            messages: self.messages.clone(),
        }
    }
}

/// Start an array field whose items are value objects.
pub fn create_array_field<T, V>(
    vo: V,
    messages: Option<ErrorMessages>,
) -> ArrayFieldFactory<T, V::Output>
where
    T: 'static,
    V: ValueObjectLike<T> + 'static,
{
    let rules = vo.rules().to_vec();
    ArrayFieldFactory {
        item: FieldFactory::without_text(
            FieldSource::ValueObject(Arc::new(vo)),
            rules,
            messages.clone(),
        ),
        messages,
    }
}

/// Start an array field whose items are plain values checked by `rules`.
#[must_use]
pub fn create_primitive_array_field<T>(
    rules: Vec<Rule<T>>,
    messages: Option<ErrorMessages>,
) -> ArrayFieldFactory<T> {
    ArrayFieldFactory {
        item: FieldFactory::without_text(
            FieldSource::Primitive(identity::<T>),
            rules,
            messages.clone(),
        ),
        messages,
    }
}

#[cfg(test)]
mod tests {
    use vorm_core::{ValueObject, brand, rules, vo};

    use super::*;

    brand!(Tag);

    #[test]
    fn item_is_always_required() {
        let tags = create_primitive_array_field(vec![rules::min_length(2)], None)
            .build(ArrayOptions::optional().max_length(3));
        assert!(!tags.is_required());
        assert!(tags.item().is_required());
        assert_eq!(tags.max_length(), Some(3));
        assert_eq!(tags.min_length(), None);
    }

    #[test]
    fn messages_reach_array_and_item() {
        let tag: ValueObject<String, Tag> = vo(vec![rules::min_length(2)]);
        let factory = create_array_field(
            tag,
            Some(ErrorMessages::map([("MIN_LENGTH", "definition")])),
        );
        let schema = factory.build(
            ArrayOptions::required()
                .min_length(1)
                .messages(ErrorMessages::map([("MAX_LENGTH", "too many")])),
        );
        for source in [schema.messages(), schema.item().messages()] {
            assert_eq!(source.lookup("MIN_LENGTH").as_deref(), Some("definition"));
            assert_eq!(source.lookup("MAX_LENGTH").as_deref(), Some("too many"));
        }
        assert_eq!(schema.item().source().brand(), Some("Tag"));
    }
}
