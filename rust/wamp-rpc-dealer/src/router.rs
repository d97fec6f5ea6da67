use std::sync::Arc;

use parking_lot::RwLock;
use wamp_rpc_core::{IdMapper, MAX_ID, RegisterOptions, RegistrationId, SessionId};

use crate::{
    CatalogError, ExactCatalog, OperationCatalog, PrefixCatalog, Registration, RpcOperation,
    WildcardCatalog,
};

/// Routes registrations to the catalog of their policy and resolves calls
/// across all catalogs.
///
/// Catalogs are consulted most specific first: exact, then prefix, then
/// wildcard. All catalogs share one registration ID space.
pub struct CatalogRouter {
    ids: Arc<IdMapper<Registration>>,
    catalogs: Vec<Arc<dyn OperationCatalog>>,
    /// Registration takes the read side, a session purge the write side.
    purge: RwLock<()>,
}

impl CatalogRouter {
    pub fn new() -> Self {
        Self::with_id_limit(MAX_ID)
    }

    /// A router whose registration IDs stay within `1..=limit`.
    pub fn with_id_limit(limit: u64) -> Self {
        let ids = Arc::new(IdMapper::with_limit(limit));
        let catalogs: Vec<Arc<dyn OperationCatalog>> = vec![
            Arc::new(ExactCatalog::new(ids.clone())),
            Arc::new(PrefixCatalog::new(ids.clone())),
            Arc::new(WildcardCatalog::new(ids.clone())),
        ];
        Self {
            ids,
            catalogs,
            purge: RwLock::new(()),
        }
    }

    /// The catalog accepting a registration requested with `options`.
    pub fn catalog_for(
        &self,
        options: &RegisterOptions,
    ) -> Result<&Arc<dyn OperationCatalog>, CatalogError> {
        self.catalogs
            .iter()
            .find(|catalog| catalog.handles(options))
            .ok_or_else(|| CatalogError::UnsupportedPolicy(options.policy_literal().to_string()))
    }

    pub fn register(
        &self,
        session: SessionId,
        options: &RegisterOptions,
        uri: &str,
        operation: Arc<dyn RpcOperation>,
    ) -> Result<Arc<Registration>, CatalogError> {
        let catalog = self.catalog_for(options)?;
        let _purge = self.purge.read();
        catalog.register(session, uri, operation)
    }

    /// Remove a registration owned by `session`.
    ///
    /// IDs owned by another session are reported as unknown.
    pub fn unregister(
        &self,
        session: SessionId,
        id: RegistrationId,
    ) -> Result<Arc<Registration>, CatalogError> {
        let registration = self
            .ids
            .resolve(id)
            .ok_or(CatalogError::UnknownRegistration(id))?;
        if registration.session() != session {
            tracing::warn!(
                id = id.0,
                owner = registration.session().0,
                session = session.0,
                "refusing to unregister a foreign registration"
            );
            return Err(CatalogError::UnknownRegistration(id));
        }

        self.catalogs
            .iter()
            .find(|catalog| catalog.policy() == registration.policy())
            .ok_or(CatalogError::UnknownRegistration(id))?
            .unregister(id)
    }

    /// Resolve a called procedure to one registration.
    pub fn matching_operation(&self, uri: &str) -> Result<Arc<Registration>, CatalogError> {
        self.catalogs
            .iter()
            .find_map(|catalog| catalog.matching_operation(uri))
            .ok_or_else(|| CatalogError::NoSuchProcedure(uri.to_string()))
    }

    pub fn registration(&self, id: RegistrationId) -> Option<Arc<Registration>> {
        self.ids.resolve(id)
    }

    /// Every registration owned by `session`, across policies.
    pub fn registrations_of(&self, session: SessionId) -> Vec<Arc<Registration>> {
        self.catalogs
            .iter()
            .flat_map(|catalog| catalog.registrations())
            .filter(|registration| registration.session() == session)
            .collect()
    }

    /// Drop every registration owned by `session` from every catalog.
    ///
    /// No registration completes while the catalogs are being purged, so the
    /// session's registrations disappear from all policies together.
    pub fn purge_session(&self, session: SessionId) -> usize {
        let _purge = self.purge.write();
        self.catalogs
            .iter()
            .map(|catalog| catalog.purge_session(session))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.catalogs.iter().map(|catalog| catalog.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CatalogRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::noop;
    use wamp_rpc_core::MatchPolicy;

    #[test]
    fn exact_beats_prefix_beats_wildcard() {
        let router = CatalogRouter::new();
        let s = SessionId(1);
        let wildcard = router
            .register(s, &RegisterOptions::with_policy(MatchPolicy::Wildcard), "com..add", noop())
            .unwrap();
        let prefix = router
            .register(s, &RegisterOptions::with_policy(MatchPolicy::Prefix), "com.calc", noop())
            .unwrap();
        let exact = router
            .register(s, &RegisterOptions::default(), "com.calc.add", noop())
            .unwrap();

        assert_eq!(router.matching_operation("com.calc.add").unwrap().id(), exact.id());
        assert_eq!(router.matching_operation("com.calc.sub").unwrap().id(), prefix.id());
        assert_eq!(router.matching_operation("com.other.add").unwrap().id(), wildcard.id());
        assert_eq!(
            router.matching_operation("org.x").unwrap_err(),
            CatalogError::NoSuchProcedure("org.x".into())
        );
    }

    #[test]
    fn same_uri_under_different_policies_is_allowed() {
        let router = CatalogRouter::new();
        let a = router
            .register(SessionId(1), &RegisterOptions::default(), "com.a", noop())
            .unwrap();
        let b = router
            .register(SessionId(1), &RegisterOptions::with_policy(MatchPolicy::Prefix), "com.a", noop())
            .unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn unsupported_policy_rejected() {
        let router = CatalogRouter::new();
        let options = RegisterOptions {
            matching: Some("regex".into()),
        };
        assert_eq!(
            router.register(SessionId(1), &options, "com.a", noop()).unwrap_err(),
            CatalogError::UnsupportedPolicy("regex".into())
        );
    }

    #[test]
    fn foreign_registration_cannot_be_unregistered() {
        let router = CatalogRouter::new();
        let reg = router
            .register(SessionId(1), &RegisterOptions::default(), "com.a", noop())
            .unwrap();

        assert_eq!(
            router.unregister(SessionId(2), reg.id()).unwrap_err(),
            CatalogError::UnknownRegistration(reg.id())
        );
        assert!(router.matching_operation("com.a").is_ok());
        router.unregister(SessionId(1), reg.id()).unwrap();
    }

    #[test]
    fn purge_spans_policies() {
        let router = CatalogRouter::new();
        let s = SessionId(7);
        router.register(s, &RegisterOptions::default(), "com.a", noop()).unwrap();
        router
            .register(s, &RegisterOptions::with_policy(MatchPolicy::Prefix), "com.b", noop())
            .unwrap();
        router
            .register(SessionId(8), &RegisterOptions::default(), "com.c", noop())
            .unwrap();

        assert_eq!(router.registrations_of(s).len(), 2);
        assert_eq!(router.purge_session(s), 2);
        assert!(router.registrations_of(s).is_empty());
        assert_eq!(router.len(), 1);
    }
}
