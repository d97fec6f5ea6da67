use serde_json::{Map, Value};

/// Positional and named payload of a call, a result or an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    /// Ordered positional values (`Arguments` in WAMP terms).
    pub positional: Vec<Value>,
    /// Named values (`ArgumentsKw`).
    pub named: Map<String, Value>,
}

impl Arguments {
    /// An empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// A payload with only positional values.
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            named: Map::new(),
        }
    }

    /// A payload with only named values.
    pub fn named<K: Into<String>>(values: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self {
            positional: Vec::new(),
            named: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Add a named value, replacing any previous value under the same key.
    pub fn with_named(mut self, key: impl Into<String>, value: Value) -> Self {
        self.named.insert(key.into(), value);
        self
    }

    /// True when there are neither positional nor named values.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// Details attached to a RESULT message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultDetails {
    /// More results follow for the same request.
    pub progress: bool,
}

impl ResultDetails {
    /// Details of an intermediate result.
    pub fn progressive() -> Self {
        Self { progress: true }
    }

    /// Details of the terminal result.
    pub fn terminal() -> Self {
        Self { progress: false }
    }
}
