use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use wamp_rpc_caller::{
    CalleeInterceptor, CalleeProxy, CallerSession, InterceptError, InvocationHandler,
};
use wamp_rpc_core::{RegistrationId, SessionId};
use wamp_rpc_dealer::{CatalogError, Dealer, RpcOperation};

/// Lifecycle events of the connection underneath a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection closed.
    Broken,
    /// The connection failed.
    Error(String),
}

/// What a connection event tore down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionReport {
    /// Outstanding calls failed with `ConnectionLost`.
    pub failed_calls: usize,
    /// Registrations of the session dropped from the dealer.
    pub purged_registrations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealmError {
    Intercept(InterceptError),
    Catalog(CatalogError),
    /// The session's connection was torn down.
    SessionClosed(SessionId),
}

impl fmt::Display for RealmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealmError::Intercept(e) => write!(f, "{}", e),
            RealmError::Catalog(e) => write!(f, "{}", e),
            RealmError::SessionClosed(session) => write!(f, "session {} is closed", session.0),
        }
    }
}

impl std::error::Error for RealmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RealmError::Intercept(e) => Some(e),
            RealmError::Catalog(e) => Some(e),
            RealmError::SessionClosed(_) => None,
        }
    }
}

impl From<InterceptError> for RealmError {
    fn from(e: InterceptError) -> Self {
        RealmError::Intercept(e)
    }
}

impl From<CatalogError> for RealmError {
    fn from(e: CatalogError) -> Self {
        RealmError::Catalog(e)
    }
}

/// One session's view of a realm.
///
/// Joins the session's caller-side handler with the realm's dealer, using the
/// interceptor to map local method names to procedures in both directions.
pub struct RealmProxy<S> {
    session: SessionId,
    dealer: Arc<Dealer>,
    handler: InvocationHandler<S>,
    interceptor: Arc<dyn CalleeInterceptor>,
    /// Set once the connection is torn down. Registration holds the read
    /// side for its whole duration, so none can outlive the purge.
    closed: RwLock<bool>,
}

impl<S: CallerSession> RealmProxy<S> {
    pub fn new(
        session: SessionId,
        dealer: Arc<Dealer>,
        handler: InvocationHandler<S>,
        interceptor: Arc<dyn CalleeInterceptor>,
    ) -> Self {
        Self {
            session,
            dealer,
            handler,
            interceptor,
            closed: RwLock::new(false),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    pub fn dealer(&self) -> &Arc<Dealer> {
        &self.dealer
    }

    pub fn handler(&self) -> &InvocationHandler<S> {
        &self.handler
    }

    /// Expose `operation` under the procedure the interceptor binds to `method`.
    ///
    /// Fails with [`RealmError::SessionClosed`] once a connection event has
    /// torn the session down.
    pub fn register(
        &self,
        method: &str,
        operation: Arc<dyn RpcOperation>,
    ) -> Result<RegistrationId, RealmError> {
        let closed = self.closed.read();
        if *closed {
            return Err(RealmError::SessionClosed(self.session));
        }
        let descriptor = self.interceptor.registration(method)?;
        let id = self.dealer.register(
            self.session,
            &descriptor.procedure,
            &descriptor.options,
            operation,
        )?;
        tracing::debug!(
            session = self.session.0,
            method,
            procedure = %descriptor.procedure,
            id = id.0,
            "method registered"
        );
        Ok(id)
    }

    pub fn unregister(&self, id: RegistrationId) -> Result<(), RealmError> {
        Ok(self.dealer.unregister(self.session, id)?)
    }

    /// A typed invocation handle sharing this session's handler.
    pub fn callee_proxy(&self) -> CalleeProxy<S> {
        CalleeProxy::new(self.handler.clone(), self.interceptor.clone())
    }

    /// Tear down everything tied to the connection: every outstanding call
    /// fails with `ConnectionLost` and every registration of the session is
    /// dropped. Later registrations through this proxy are refused.
    pub fn handle_connection_event(&self, event: ConnectionEvent) -> ConnectionReport {
        match &event {
            ConnectionEvent::Broken => {
                tracing::debug!(session = self.session.0, "connection broken")
            }
            ConnectionEvent::Error(reason) => {
                tracing::warn!(session = self.session.0, %reason, "connection error")
            }
        }

        let mut closed = self.closed.write();
        *closed = true;
        ConnectionReport {
            failed_calls: self.handler.connection_lost(),
            purged_registrations: self.dealer.session_closed(self.session),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wamp_rpc_caller::{
        CallDescriptor, InvocationError, MemPeer, MemSession, MethodBinding, SingleValueExtractor,
        StaticInterceptor,
    };
    use wamp_rpc_core::{Arguments, MatchPolicy, RegisterOptions};
    use wamp_rpc_dealer::{Invocation, RpcFailure};

    fn noop() -> Arc<dyn RpcOperation> {
        Arc::new(|_inv: Invocation| async { Ok::<_, RpcFailure>(Arguments::new()) })
    }

    fn join_realm(session: u64, dealer: &Arc<Dealer>) -> (RealmProxy<MemSession>, MemPeer) {
        let (mem, peer) = MemSession::pair();
        let interceptor = StaticInterceptor::new().method("add", "com.calc.add").bind(
            "calc",
            MethodBinding::new("com.calc")
                .register_options(RegisterOptions::with_policy(MatchPolicy::Prefix)),
        );
        let realm = RealmProxy::new(
            SessionId(session),
            dealer.clone(),
            InvocationHandler::new(mem),
            Arc::new(interceptor),
        );
        (realm, peer)
    }

    #[test]
    fn register_uses_bound_procedure_and_policy() {
        let dealer = Arc::new(Dealer::new());
        let (realm, _peer) = join_realm(1, &dealer);
        let id = realm.register("calc", noop()).unwrap();

        let reg = dealer.router().registration(id).unwrap();
        assert_eq!(reg.uri(), "com.calc");
        assert_eq!(reg.policy(), MatchPolicy::Prefix);
        assert_eq!(reg.session(), SessionId(1));

        assert!(matches!(
            realm.register("nope", noop()),
            Err(RealmError::Intercept(InterceptError::UnknownMethod(_)))
        ));
    }

    #[test]
    fn unregister_is_scoped_to_the_session() {
        let dealer = Arc::new(Dealer::new());
        let (owner, _owner_peer) = join_realm(1, &dealer);
        let (other, _other_peer) = join_realm(2, &dealer);
        let id = owner.register("add", noop()).unwrap();

        assert_eq!(
            other.unregister(id),
            Err(RealmError::Catalog(CatalogError::UnknownRegistration(id)))
        );
        owner.unregister(id).unwrap();
    }

    #[tokio::test]
    async fn broken_connection_fails_calls_and_purges_registrations() {
        let dealer = Arc::new(Dealer::new());
        let (realm, _peer) = join_realm(1, &dealer);
        let (survivor, _survivor_peer) = join_realm(2, &dealer);
        realm.register("add", noop()).unwrap();
        realm.register("calc", noop()).unwrap();
        survivor.register("calc", noop()).unwrap_err();

        let calls: Vec<_> = (0..3)
            .map(|_| {
                realm
                    .handler()
                    .start(
                        CallDescriptor::new("com.calc.add", Arguments::positional([json!(1)])),
                        SingleValueExtractor::<i64>::returning(),
                    )
                    .unwrap()
            })
            .collect();

        let report = realm.handle_connection_event(ConnectionEvent::Broken);
        assert_eq!(
            report,
            ConnectionReport {
                failed_calls: 3,
                purged_registrations: 2
            }
        );
        for call in calls {
            assert!(matches!(call.finish().await, Err(InvocationError::ConnectionLost)));
        }
        assert!(dealer.router().registrations_of(SessionId(1)).is_empty());

        // The session's procedures are free again.
        survivor.register("calc", noop()).unwrap();
        assert_eq!(
            realm.handle_connection_event(ConnectionEvent::Error("reset".into())),
            ConnectionReport::default()
        );
    }

    #[test]
    fn closed_session_cannot_register() {
        let dealer = Arc::new(Dealer::new());
        let (realm, _peer) = join_realm(1, &dealer);
        realm.handle_connection_event(ConnectionEvent::Broken);

        assert_eq!(
            realm.register("add", noop()),
            Err(RealmError::SessionClosed(SessionId(1)))
        );
        assert!(dealer.router().is_empty());
    }

    #[test]
    fn registrations_racing_a_broken_connection_do_not_survive() {
        for _ in 0..20 {
            let dealer = Arc::new(Dealer::new());
            let (mem, _peer) = MemSession::pair();
            let interceptor = (0..50).fold(StaticInterceptor::new(), |table, n| {
                table.method(format!("m{n}"), format!("com.race.m{n}"))
            });
            let realm = RealmProxy::new(
                SessionId(1),
                dealer.clone(),
                InvocationHandler::new(mem),
                Arc::new(interceptor),
            );

            std::thread::scope(|s| {
                s.spawn(|| {
                    for n in 0..50 {
                        let _ = realm.register(&format!("m{n}"), noop());
                    }
                });
                s.spawn(|| realm.handle_connection_event(ConnectionEvent::Broken));
            });

            assert!(dealer.router().registrations_of(SessionId(1)).is_empty());
        }
    }
}
