#![forbid(unsafe_code)]

//! Standard Schema v1 interop.
//!
//! A vendor-neutral validation contract: `validate` takes an untyped value and
//! returns either the typed output or a list of issues with optional paths.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::brand::{Brand, Branded};
use crate::error::ERROR_CODE_INVALID_TYPE;
use crate::value_object::ValueObject;

/// Version of the contract implemented here.
pub const STANDARD_SCHEMA_VERSION: u32 = 1;
/// Vendor name reported by every schema in this workspace.
pub const VENDOR: &str = "vorm";

/// One step of an issue path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
}

impl Issue {
    /// An issue at the root of the validated value.
    #[must_use]
    pub fn root(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// An issue attached to a named key.
    #[must_use]
    pub fn at_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Some(vec![PathSegment::Key(key.into())]),
        }
    }
}

/// The Standard Schema v1 contract.
pub trait StandardSchema {
    type Output;

    fn version(&self) -> u32 {
        STANDARD_SCHEMA_VERSION
    }

    fn vendor(&self) -> &'static str {
        VENDOR
    }

    /// Validate an untyped value.
    fn validate(&self, value: &Value) -> Result<Self::Output, Vec<Issue>>;
}

impl<T, B> StandardSchema for ValueObject<T, B>
where
    T: DeserializeOwned,
    B: Brand,
{
    type Output = Branded<T, B>;

    fn validate(&self, value: &Value) -> Result<Self::Output, Vec<Issue>> {
        let input: T = serde_json::from_value(value.clone())
            .map_err(|_| vec![Issue::root(ERROR_CODE_INVALID_TYPE)])?;
        self.safe_create(input)
            .map_err(|err| vec![Issue::root(err.code)])
    }
}
