#![forbid(unsafe_code)]

//! Nominal brands over shared runtime representations.
//!
//! A [`Branded<T, B>`] is laid out exactly like `T`; the brand exists only in
//! the type system. Two value objects over `String` (say `Email` and
//! `Password`) therefore produce values that cannot be swapped by accident
//! even though both are plain strings at runtime.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;

use serde::{Serialize, Serializer};

/// A nominal tag attached to a base type.
///
/// Tags are normally declared with [`brand!`](crate::brand!), which produces
/// an uninhabited type whose only purpose is to carry [`Brand::NAME`].
pub trait Brand: 'static {
    /// Brand name reported in construction failures.
    const NAME: &'static str;
}

/// Declare one or more brand tag types.
///
/// ```rust
/// use vorm_core::{brand, Brand};
///
/// brand!(pub Email, pub(crate) Password);
/// assert_eq!(Email::NAME, "Email");
/// ```
#[macro_export]
macro_rules! brand {
    ($($vis:vis $name:ident),+ $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            $vis enum $name {}

            impl $crate::Brand for $name {
                const NAME: &'static str = stringify!($name);
            }
        )+
    };
}

/// A value of type `T` that passed the rules of the value object branded `B`.
///
/// Only a value object can mint one, so holding a `Branded<T, B>` is proof of
/// validation.
#[repr(transparent)]
pub struct Branded<T, B: Brand> {
    value: T,
    // fn() -> B keeps auto traits independent of the (uninhabited) tag.
    _brand: PhantomData<fn() -> B>,
}

impl<T, B: Brand> Branded<T, B> {
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self {
            value,
            _brand: PhantomData,
        }
    }

    /// Name of the brand this value carries.
    #[must_use]
    pub fn brand(&self) -> &'static str {
        B::NAME
    }

    /// Borrow the underlying value.
    #[must_use]
    pub fn as_inner(&self) -> &T {
        &self.value
    }

    /// Strip the brand and return the underlying value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T, B: Brand> Deref for Branded<T, B> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T, B: Brand> AsRef<T> for Branded<T, B> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T: Clone, B: Brand> Clone for Branded<T, B> {
    fn clone(&self) -> Self {
        Self::new_unchecked(self.value.clone())
    }
}

impl<T: Copy, B: Brand> Copy for Branded<T, B> {}

impl<T: fmt::Debug, B: Brand> fmt::Debug for Branded<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", B::NAME, self.value)
    }
}

impl<T: fmt::Display, B: Brand> fmt::Display for Branded<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: PartialEq, B: Brand> PartialEq for Branded<T, B> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq, B: Brand> Eq for Branded<T, B> {}

impl<T: PartialEq, B: Brand> PartialEq<T> for Branded<T, B> {
    fn eq(&self, other: &T) -> bool {
        &self.value == other
    }
}

impl<T: PartialOrd, B: Brand> PartialOrd for Branded<T, B> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<T: Ord, B: Brand> Ord for Branded<T, B> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T: Hash, B: Brand> Hash for Branded<T, B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: Serialize, B: Brand> Serialize for Branded<T, B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}
