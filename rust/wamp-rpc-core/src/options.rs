use std::fmt;
use std::time::Duration;

use crate::MatchPolicy;

/// Options of a REGISTER request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Requested match policy literal. `None` means `"exact"`.
    pub matching: Option<String>,
}

impl RegisterOptions {
    /// Options requesting `policy`.
    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self {
            matching: Some(policy.as_str().to_string()),
        }
    }

    /// The policy literal, defaulting to `"exact"`.
    pub fn policy_literal(&self) -> &str {
        self.matching
            .as_deref()
            .unwrap_or(MatchPolicy::Exact.as_str())
    }
}

/// Options of a CALL request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Per-call timeout; overrides the handler default when set.
    pub timeout: Option<Duration>,
    /// Ask the callee for progressive results.
    pub receive_progress: bool,
    /// Ask the dealer to disclose this caller to the callee.
    pub disclose_me: bool,
}

/// How a CANCEL request treats the callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelMode {
    /// Fail the call locally and stop waiting; the callee is not interrupted.
    #[default]
    Skip,
    /// Fail the call locally and ask the callee to stop and acknowledge.
    Kill,
    /// Fail the call locally and ask the callee to stop without acknowledging.
    KillNoWait,
}

impl CancelMode {
    /// The mode literal used in CANCEL options.
    pub fn as_str(self) -> &'static str {
        match self {
            CancelMode::Skip => "skip",
            CancelMode::Kill => "kill",
            CancelMode::KillNoWait => "killnowait",
        }
    }
}

impl fmt::Display for CancelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_policy_means_exact() {
        assert_eq!(RegisterOptions::default().policy_literal(), "exact");
        assert_eq!(
            RegisterOptions::with_policy(MatchPolicy::Wildcard).policy_literal(),
            "wildcard"
        );
    }

    #[test]
    fn cancel_mode_literals() {
        assert_eq!(CancelMode::default(), CancelMode::Skip);
        assert_eq!(CancelMode::Kill.to_string(), "kill");
        assert_eq!(CancelMode::KillNoWait.as_str(), "killnowait");
    }
}
