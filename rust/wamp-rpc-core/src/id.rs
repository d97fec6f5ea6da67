//! Protocol identifiers.
//!
//! WAMP IDs are integers in `1..=2^53` so that they survive a round trip
//! through an IEEE-754 double. Registration IDs and request IDs live in
//! separate ID spaces and get distinct newtypes so they cannot be mixed up.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::IdError;

/// Largest legal protocol ID (inclusive).
pub const MAX_ID: u64 = 1 << 53;

/// Identifies one procedure registration on the dealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(pub u64);

/// Correlates one outstanding call with its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// Identifies a session attached to a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registration {}", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request {}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session {}", self.0)
    }
}

/// Check whether `id` lies in the protocol's legal ID range.
pub fn is_valid_id(id: u64) -> bool {
    (1..=MAX_ID).contains(&id)
}

/// Session-scope request ID generator.
///
/// IDs are issued sequentially starting at 1. Running past the limit is an
/// error: the counter never wraps, so a stale response can never be matched
/// against a newer call that happens to reuse its ID.
#[derive(Debug)]
pub struct RequestIdAllocator {
    next: AtomicU64,
    limit: u64,
}

impl RequestIdAllocator {
    /// Create an allocator covering the full protocol range.
    pub fn new() -> Self {
        Self::with_limit(MAX_ID)
    }

    /// Create an allocator that stops after `limit` IDs.
    ///
    /// `limit` is clamped to [`MAX_ID`].
    pub fn with_limit(limit: u64) -> Self {
        Self {
            next: AtomicU64::new(1),
            limit: limit.min(MAX_ID),
        }
    }

    /// Issue the next request ID.
    pub fn next_id(&self) -> Result<RequestId, IdError> {
        let limit = self.limit;
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current <= limit).then_some(current + 1)
            })
            .map(RequestId)
            .map_err(|_| IdError::Exhausted { limit })
    }

    /// Number of IDs issued so far.
    pub fn issued(&self) -> u64 {
        (self.next.load(Ordering::Acquire) - 1).min(self.limit)
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Default for RequestIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_id_range() {
        assert!(!is_valid_id(0));
        assert!(is_valid_id(1));
        assert!(is_valid_id(MAX_ID));
        assert!(!is_valid_id(MAX_ID + 1));
    }

    #[test]
    fn request_ids_are_sequential() {
        let ids = RequestIdAllocator::new();
        assert_eq!(ids.next_id().unwrap(), RequestId(1));
        assert_eq!(ids.next_id().unwrap(), RequestId(2));
        assert_eq!(ids.next_id().unwrap(), RequestId(3));
        assert_eq!(ids.issued(), 3);
    }

    #[test]
    fn request_ids_report_exhaustion() {
        let ids = RequestIdAllocator::with_limit(2);
        ids.next_id().unwrap();
        ids.next_id().unwrap();
        assert_eq!(ids.next_id(), Err(IdError::Exhausted { limit: 2 }));
        // Stays exhausted rather than wrapping.
        assert_eq!(ids.next_id(), Err(IdError::Exhausted { limit: 2 }));
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn display_names_the_id_space() {
        assert_eq!(RegistrationId(7).to_string(), "registration 7");
        assert_eq!(RequestId(9).to_string(), "request 9");
        assert_eq!(SessionId(3).to_string(), "session 3");
    }
}
