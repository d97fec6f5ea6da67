//! Copy-on-write registration catalogs.
//!
//! Every catalog holds the registrations of one [`MatchPolicy`]. Readers load
//! the current [`CatalogSnapshot`] without taking a lock; writers serialise on
//! a per-catalog mutex, build a replacement snapshot and publish it.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use wamp_rpc_core::{IdMapper, MatchPolicy, RegisterOptions, RegistrationId, SessionId};

use crate::{CatalogError, Registration, RpcOperation};

/// A store of registrations for one match policy.
pub trait OperationCatalog: Send + Sync {
    /// The policy every registration in this catalog uses.
    fn policy(&self) -> MatchPolicy;

    /// Whether this catalog accepts a registration requested with `options`.
    fn handles(&self, options: &RegisterOptions) -> bool {
        options.policy_literal() == self.policy().as_str()
    }

    /// Register `operation` under `uri` for `session`.
    ///
    /// The registration is visible to [`matching_operation`](Self::matching_operation)
    /// as soon as this returns.
    fn register(
        &self,
        session: SessionId,
        uri: &str,
        operation: Arc<dyn RpcOperation>,
    ) -> Result<Arc<Registration>, CatalogError>;

    /// Remove the registration `id` and release its ID.
    fn unregister(&self, id: RegistrationId) -> Result<Arc<Registration>, CatalogError>;

    /// Look up a registration held by this catalog.
    fn get(&self, id: RegistrationId) -> Option<Arc<Registration>>;

    /// Resolve a called procedure URI to the registration that should serve it.
    fn matching_operation(&self, uri: &str) -> Option<Arc<Registration>>;

    /// Drop every registration owned by `session`, returning how many were removed.
    fn purge_session(&self, session: SessionId) -> usize;

    /// All registrations currently held.
    fn registrations(&self) -> Vec<Arc<Registration>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lookup algorithm of one match policy.
pub trait Matcher: Send + Sync + 'static {
    const POLICY: MatchPolicy;

    /// Find the registration in `snapshot` that serves `uri`.
    fn find(snapshot: &CatalogSnapshot, uri: &str) -> Option<Arc<Registration>>;
}

/// Immutable view of a catalog's registrations.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    by_uri: HashMap<Box<str>, Arc<Registration>>,
    by_id: HashMap<RegistrationId, Arc<Registration>>,
}

impl CatalogSnapshot {
    /// The registration whose URI equals `uri`.
    pub fn by_uri(&self, uri: &str) -> Option<&Arc<Registration>> {
        self.by_uri.get(uri)
    }

    pub fn by_id(&self, id: RegistrationId) -> Option<&Arc<Registration>> {
        self.by_id.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Registration>> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn insert(&mut self, registration: Arc<Registration>) {
        self.by_uri
            .insert(registration.uri().into(), registration.clone());
        self.by_id.insert(registration.id(), registration);
    }

    fn remove(&mut self, registration: &Registration) {
        self.by_uri.remove(registration.uri());
        self.by_id.remove(&registration.id());
    }
}

/// A catalog parameterised by its lookup algorithm.
///
/// Catalogs built from the same [`IdMapper`] share one registration ID space.
pub struct MatchCatalog<M: Matcher> {
    ids: Arc<IdMapper<Registration>>,
    snapshot: ArcSwap<CatalogSnapshot>,
    writer: Mutex<()>,
    _matcher: PhantomData<fn() -> M>,
}

impl<M: Matcher> MatchCatalog<M> {
    /// Create an empty catalog allocating IDs from `ids`.
    pub fn new(ids: Arc<IdMapper<Registration>>) -> Self {
        Self {
            ids,
            snapshot: ArcSwap::from_pointee(CatalogSnapshot::default()),
            writer: Mutex::new(()),
            _matcher: PhantomData,
        }
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }
}

impl<M: Matcher> Default for MatchCatalog<M> {
    fn default() -> Self {
        Self::new(Arc::new(IdMapper::new()))
    }
}

impl<M: Matcher> OperationCatalog for MatchCatalog<M> {
    fn policy(&self) -> MatchPolicy {
        M::POLICY
    }

    fn register(
        &self,
        session: SessionId,
        uri: &str,
        operation: Arc<dyn RpcOperation>,
    ) -> Result<Arc<Registration>, CatalogError> {
        M::POLICY
            .validate(uri)
            .map_err(|reason| CatalogError::InvalidUri {
                uri: uri.to_string(),
                reason,
            })?;

        let _writer = self.writer.lock();
        let current = self.snapshot.load_full();
        if current.by_uri(uri).is_some() {
            tracing::debug!(uri, policy = %M::POLICY, "duplicate registration rejected");
            return Err(CatalogError::DuplicateRegistration {
                uri: uri.to_string(),
                policy: M::POLICY,
            });
        }

        let registration = self
            .ids
            .allocate_with(|id| Registration::new(id, uri, M::POLICY, session, operation))?;

        let mut next = CatalogSnapshot::clone(&current);
        next.insert(registration.clone());
        self.snapshot.store(Arc::new(next));

        tracing::debug!(
            id = registration.id().0,
            uri,
            policy = %M::POLICY,
            session = session.0,
            "procedure registered"
        );
        Ok(registration)
    }

    fn unregister(&self, id: RegistrationId) -> Result<Arc<Registration>, CatalogError> {
        let _writer = self.writer.lock();
        let current = self.snapshot.load_full();
        let registration = current
            .by_id(id)
            .cloned()
            .ok_or(CatalogError::UnknownRegistration(id))?;

        let mut next = CatalogSnapshot::clone(&current);
        next.remove(&registration);
        self.snapshot.store(Arc::new(next));

        // The ID may only be reissued once readers no longer see it.
        self.ids.release(id)?;

        tracing::debug!(id = id.0, uri = registration.uri(), "procedure unregistered");
        Ok(registration)
    }

    fn get(&self, id: RegistrationId) -> Option<Arc<Registration>> {
        self.snapshot.load().by_id(id).cloned()
    }

    fn matching_operation(&self, uri: &str) -> Option<Arc<Registration>> {
        M::find(&self.snapshot.load(), uri)
    }

    fn purge_session(&self, session: SessionId) -> usize {
        let _writer = self.writer.lock();
        let current = self.snapshot.load_full();
        let owned: Vec<Arc<Registration>> = current
            .iter()
            .filter(|r| r.session() == session)
            .cloned()
            .collect();
        if owned.is_empty() {
            return 0;
        }

        let mut next = CatalogSnapshot::clone(&current);
        for registration in &owned {
            next.remove(registration);
        }
        self.snapshot.store(Arc::new(next));

        for registration in &owned {
            if let Err(err) = self.ids.release(registration.id()) {
                tracing::warn!(id = registration.id().0, %err, "purged registration had no live ID");
            }
        }

        tracing::debug!(
            session = session.0,
            policy = %M::POLICY,
            count = owned.len(),
            "purged session registrations"
        );
        owned.len()
    }

    fn registrations(&self) -> Vec<Arc<Registration>> {
        self.snapshot.load().iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.snapshot.load().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Exact;
    use crate::test_util::noop;

    #[test]
    fn handles_matches_policy_literal() {
        let catalog = MatchCatalog::<Exact>::default();
        assert!(catalog.handles(&RegisterOptions::default()));
        assert!(catalog.handles(&RegisterOptions::with_policy(MatchPolicy::Exact)));
        assert!(!catalog.handles(&RegisterOptions::with_policy(MatchPolicy::Prefix)));
    }

    #[test]
    fn old_snapshots_stay_valid() {
        let catalog = MatchCatalog::<Exact>::default();
        let reg = catalog.register(SessionId(1), "com.a", noop()).unwrap();
        let before = catalog.snapshot();

        catalog.unregister(reg.id()).unwrap();
        assert!(before.by_id(reg.id()).is_some());
        assert!(catalog.snapshot().is_empty());
    }

    #[test]
    fn invalid_uri_rejected_before_allocation() {
        let ids = Arc::new(IdMapper::new());
        let catalog = MatchCatalog::<Exact>::new(ids.clone());
        let err = catalog.register(SessionId(1), "com..a", noop()).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidUri { .. }));
        assert!(ids.is_empty());
    }

    #[test]
    fn exhausted_id_space_surfaces() {
        let catalog = MatchCatalog::<Exact>::new(Arc::new(IdMapper::with_limit(1)));
        catalog.register(SessionId(1), "com.a", noop()).unwrap();
        assert_eq!(
            catalog.register(SessionId(1), "com.b", noop()).unwrap_err(),
            CatalogError::IdSpaceExhausted { limit: 1 }
        );
    }

    #[test]
    fn purge_only_touches_owner() {
        let catalog = MatchCatalog::<Exact>::default();
        catalog.register(SessionId(1), "com.a", noop()).unwrap();
        catalog.register(SessionId(1), "com.b", noop()).unwrap();
        let kept = catalog.register(SessionId(2), "com.c", noop()).unwrap();

        assert_eq!(catalog.purge_session(SessionId(1)), 2);
        assert_eq!(catalog.purge_session(SessionId(1)), 0);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(kept.id()).unwrap().uri(), "com.c");
    }
}
