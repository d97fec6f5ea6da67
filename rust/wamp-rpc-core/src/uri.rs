//! Procedure URIs and match policies.

use std::fmt;
use std::str::FromStr;

use crate::UriError;

/// How a registration URI is compared against called procedure URIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchPolicy {
    /// The call URI must equal the registration URI.
    #[default]
    Exact,
    /// The registration URI is a dot-segment prefix of the call URI.
    Prefix,
    /// Empty registration segments match any single call segment.
    Wildcard,
}

impl MatchPolicy {
    /// All policies, most specific first.
    pub const ALL: [MatchPolicy; 3] = [MatchPolicy::Exact, MatchPolicy::Prefix, MatchPolicy::Wildcard];

    /// The policy literal used in REGISTER options.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchPolicy::Exact => "exact",
            MatchPolicy::Prefix => "prefix",
            MatchPolicy::Wildcard => "wildcard",
        }
    }

    /// Check `uri` against the syntax rules of this policy.
    ///
    /// All policies reject empty URIs, whitespace and `#`. Exact and prefix
    /// URIs must not contain empty segments; wildcard patterns use empty
    /// segments as placeholders.
    pub fn validate(self, uri: &str) -> Result<(), UriError> {
        if uri.is_empty() {
            return Err(UriError::Empty);
        }
        if let Some(c) = uri.chars().find(|c| c.is_whitespace() || *c == '#') {
            return Err(UriError::IllegalCharacter(c));
        }
        if self != MatchPolicy::Wildcard {
            if let Some(index) = segments(uri).position(str::is_empty) {
                return Err(UriError::EmptySegment { index });
            }
        }
        Ok(())
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown match policy literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMatchPolicy(pub String);

impl fmt::Display for UnknownMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown match policy: {:?}", self.0)
    }
}

impl std::error::Error for UnknownMatchPolicy {}

impl FromStr for MatchPolicy {
    type Err = UnknownMatchPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(MatchPolicy::Exact),
            "prefix" => Ok(MatchPolicy::Prefix),
            "wildcard" => Ok(MatchPolicy::Wildcard),
            other => Err(UnknownMatchPolicy(other.to_string())),
        }
    }
}

/// Split a URI into its dot-delimited segments.
pub fn segments(uri: &str) -> std::str::Split<'_, char> {
    uri.split('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_literal_roundtrip() {
        for policy in MatchPolicy::ALL {
            assert_eq!(policy.as_str().parse::<MatchPolicy>().unwrap(), policy);
        }
        assert_eq!(
            "fuzzy".parse::<MatchPolicy>(),
            Err(UnknownMatchPolicy("fuzzy".into()))
        );
    }

    #[test]
    fn default_policy_is_exact() {
        assert_eq!(MatchPolicy::default(), MatchPolicy::Exact);
    }

    #[test]
    fn exact_rejects_empty_segments() {
        assert_eq!(MatchPolicy::Exact.validate("com.example.add"), Ok(()));
        assert_eq!(
            MatchPolicy::Exact.validate("com..add"),
            Err(UriError::EmptySegment { index: 1 })
        );
        assert_eq!(
            MatchPolicy::Prefix.validate("com.example."),
            Err(UriError::EmptySegment { index: 2 })
        );
    }

    #[test]
    fn wildcard_allows_placeholders() {
        assert_eq!(MatchPolicy::Wildcard.validate("com..add"), Ok(()));
        assert_eq!(MatchPolicy::Wildcard.validate(".example."), Ok(()));
    }

    #[test]
    fn illegal_characters_rejected() {
        assert_eq!(MatchPolicy::Exact.validate(""), Err(UriError::Empty));
        assert_eq!(
            MatchPolicy::Exact.validate("com.ex ample"),
            Err(UriError::IllegalCharacter(' '))
        );
        assert_eq!(
            MatchPolicy::Wildcard.validate("com.#"),
            Err(UriError::IllegalCharacter('#'))
        );
    }

    #[test]
    fn segments_split_on_dots() {
        let parts: Vec<&str> = segments("com..add").collect();
        assert_eq!(parts, vec!["com", "", "add"]);
    }
}
