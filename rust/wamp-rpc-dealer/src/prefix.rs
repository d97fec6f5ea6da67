use std::sync::Arc;

use wamp_rpc_core::MatchPolicy;

use crate::{CatalogSnapshot, MatchCatalog, Matcher, Registration};

/// Lookup by dot-segment prefix, longest prefix first.
///
/// A URI counts as a prefix of itself, so `com.a` registered with prefix
/// matching also serves a call to `com.a`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prefix;

impl Matcher for Prefix {
    const POLICY: MatchPolicy = MatchPolicy::Prefix;

    fn find(snapshot: &CatalogSnapshot, uri: &str) -> Option<Arc<Registration>> {
        let mut candidate = uri;
        loop {
            if let Some(registration) = snapshot.by_uri(candidate) {
                return Some(registration.clone());
            }
            match candidate.rfind('.') {
                Some(dot) => candidate = &candidate[..dot],
                None => return None,
            }
        }
    }
}

/// Catalog of `prefix` registrations.
pub type PrefixCatalog = MatchCatalog<Prefix>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OperationCatalog;
    use crate::test_util::noop;
    use wamp_rpc_core::SessionId;

    #[test]
    fn longest_prefix_wins() {
        let catalog = PrefixCatalog::default();
        let short = catalog.register(SessionId(1), "a", noop()).unwrap();
        let long = catalog.register(SessionId(1), "a.b", noop()).unwrap();

        assert_eq!(catalog.matching_operation("a.b.c").unwrap().id(), long.id());
        assert_eq!(catalog.matching_operation("a.x").unwrap().id(), short.id());
        assert_eq!(catalog.matching_operation("a.b").unwrap().id(), long.id());
        assert!(catalog.matching_operation("b.a").is_none());
    }

    #[test]
    fn prefixes_respect_segment_boundaries() {
        let catalog = PrefixCatalog::default();
        catalog.register(SessionId(1), "com.calc", noop()).unwrap();

        assert!(catalog.matching_operation("com.calculator").is_none());
        assert!(catalog.matching_operation("com.calc.add").is_some());
    }
}
