use std::sync::Arc;

use wamp_rpc_core::MatchPolicy;

use crate::{CatalogSnapshot, MatchCatalog, Matcher, Registration};

/// Lookup by URI equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

impl Matcher for Exact {
    const POLICY: MatchPolicy = MatchPolicy::Exact;

    fn find(snapshot: &CatalogSnapshot, uri: &str) -> Option<Arc<Registration>> {
        snapshot.by_uri(uri).cloned()
    }
}

/// Catalog of `exact` registrations.
pub type ExactCatalog = MatchCatalog<Exact>;
