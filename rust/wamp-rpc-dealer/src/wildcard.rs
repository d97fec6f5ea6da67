use std::cmp::Reverse;
use std::sync::Arc;

use wamp_rpc_core::{MatchPolicy, segments};

use crate::{CatalogSnapshot, MatchCatalog, Matcher, Registration};

/// Lookup by pattern, where an empty pattern segment matches any one segment.
///
/// Among matching patterns the one with the fewest wildcards wins. Equal
/// counts prefer the pattern whose first wildcard comes later, then the
/// lexicographically smaller pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wildcard;

/// Preference key of a matching pattern; smaller is better.
type Rank<'a> = (usize, Reverse<usize>, &'a str);

fn rank<'a>(pattern: &'a str, uri: &str) -> Option<Rank<'a>> {
    let mut wildcards = 0;
    let mut first_wildcard = usize::MAX;
    let mut pattern_segments = segments(pattern);
    let mut uri_segments = segments(uri);

    for index in 0.. {
        match (pattern_segments.next(), uri_segments.next()) {
            (None, None) => break,
            (Some(""), Some(_)) => {
                wildcards += 1;
                first_wildcard = first_wildcard.min(index);
            }
            (Some(p), Some(u)) if p == u => {}
            _ => return None,
        }
    }

    Some((wildcards, Reverse(first_wildcard), pattern))
}

impl Matcher for Wildcard {
    const POLICY: MatchPolicy = MatchPolicy::Wildcard;

    fn find(snapshot: &CatalogSnapshot, uri: &str) -> Option<Arc<Registration>> {
        snapshot
            .iter()
            .filter_map(|registration| rank(registration.uri(), uri).map(|r| (r, registration)))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, registration)| registration.clone())
    }
}

/// Catalog of `wildcard` registrations.
pub type WildcardCatalog = MatchCatalog<Wildcard>;
