//! Conversion of result payloads into typed values.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use wamp_rpc_core::{Arguments, Value};

use crate::{ExtractError, ResultPosition};

/// Turns a result payload into the caller's value.
///
/// Progressive calls run the same extractor over every intermediate result.
pub trait ResultExtractor: Send + Sync + 'static {
    type Output: Send + 'static;

    fn extract(&self, arguments: &Arguments) -> Result<Self::Output, ExtractError>;
}

fn convert<T: DeserializeOwned>(value: &Value, position: ResultPosition) -> Result<T, ExtractError> {
    T::deserialize(value).map_err(|source| ExtractError::ResultTypeMismatch { position, source })
}

/// Extracts at most one value.
///
/// The value is the first positional result or, when there are no positional
/// results, the named result under [`named_key`](Self::named_key).
pub struct SingleValueExtractor<T> {
    has_return_value: bool,
    named_key: Cow<'static, str>,
    tolerate_extra: bool,
    _value: PhantomData<fn() -> T>,
}

impl<T> SingleValueExtractor<T> {
    pub const DEFAULT_NAMED_KEY: &'static str = "value";

    fn with_return(has_return_value: bool) -> Self {
        Self {
            has_return_value,
            named_key: Cow::Borrowed(Self::DEFAULT_NAMED_KEY),
            tolerate_extra: false,
            _value: PhantomData,
        }
    }

    pub fn has_return_value(&self) -> bool {
        self.has_return_value
    }

    pub fn named_key(&self) -> &str {
        &self.named_key
    }
}

impl SingleValueExtractor<()> {
    /// For procedures whose result is ignored. Never fails.
    pub fn void() -> Self {
        Self::with_return(false)
    }
}

impl<T: DeserializeOwned> SingleValueExtractor<T> {
    /// For procedures returning one value.
    pub fn returning() -> Self {
        Self::with_return(true)
    }

    /// Read the named fallback from `key` instead of `"value"`.
    pub fn with_named_key(mut self, key: impl Into<Cow<'static, str>>) -> Self {
        self.named_key = key.into();
        self
    }

    /// Ignore positional values after the first instead of failing.
    pub fn tolerate_extra(mut self) -> Self {
        self.tolerate_extra = true;
        self
    }
}

impl<T> fmt::Debug for SingleValueExtractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleValueExtractor")
            .field("type", &std::any::type_name::<T>())
            .field("has_return_value", &self.has_return_value)
            .field("named_key", &self.named_key)
            .field("tolerate_extra", &self.tolerate_extra)
            .finish()
    }
}

impl<T: DeserializeOwned + Send + 'static> ResultExtractor for SingleValueExtractor<T> {
    type Output = T;

    fn extract(&self, arguments: &Arguments) -> Result<T, ExtractError> {
        if !self.has_return_value {
            // Only reachable for `T = ()`, which deserializes from null.
            return convert(&Value::Null, ResultPosition::Index(0));
        }

        match arguments.positional.as_slice() {
            [] => match arguments.named.get(self.named_key.as_ref()) {
                Some(value) => convert(value, ResultPosition::Named(self.named_key.to_string())),
                None => Err(ExtractError::MissingResult),
            },
            [first] => convert(first, ResultPosition::Index(0)),
            [first, ..] if self.tolerate_extra => convert(first, ResultPosition::Index(0)),
            values => Err(ExtractError::UnexpectedResults {
                count: values.len(),
            }),
        }
    }
}

/// Extracts every positional value, in order.
pub struct MultiValueExtractor<T> {
    _value: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> MultiValueExtractor<T> {
    pub fn new() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Default for MultiValueExtractor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MultiValueExtractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiValueExtractor")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned + Send + 'static> ResultExtractor for MultiValueExtractor<T> {
    type Output = Vec<T>;

    fn extract(&self, arguments: &Arguments) -> Result<Vec<T>, ExtractError> {
        arguments
            .positional
            .iter()
            .enumerate()
            .map(|(index, value)| convert(value, ResultPosition::Index(index)))
            .collect()
    }
}
