use std::time::Duration;

use wamp_rpc_core::CancelMode;

const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_PENDING: usize = 8192;

/// Limits applied by an [`InvocationHandler`](crate::InvocationHandler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokerConfig {
    /// Default timeout for calls that do not set their own. `None` waits forever.
    pub call_timeout: Option<Duration>,
    /// Maximum number of outstanding calls.
    pub max_pending: usize,
    /// Mode of the CANCEL sent when a call times out or its future is dropped.
    pub cancel_mode: CancelMode,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Some(Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS)),
            max_pending: DEFAULT_MAX_PENDING,
            cancel_mode: CancelMode::default(),
        }
    }
}

impl InvokerConfig {
    /// Defaults overridden by `WAMP_CALL_TIMEOUT_MS` (`0` disables the
    /// timeout) and `WAMP_MAX_PENDING`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = lookup("WAMP_CALL_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
            config.call_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        if let Some(max) = lookup("WAMP_MAX_PENDING")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
        {
            config.max_pending = max;
        }

        config
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub fn with_cancel_mode(mut self, mode: CancelMode) -> Self {
        self.cancel_mode = mode;
        self
    }
}
