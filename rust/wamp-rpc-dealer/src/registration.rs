use std::fmt;
use std::sync::Arc;

use wamp_rpc_core::{MatchPolicy, RegistrationId, SessionId};

use crate::RpcOperation;

/// A procedure bound to an operation under one match policy.
pub struct Registration {
    id: RegistrationId,
    uri: Box<str>,
    policy: MatchPolicy,
    session: SessionId,
    operation: Arc<dyn RpcOperation>,
}

impl Registration {
    pub(crate) fn new(
        id: RegistrationId,
        uri: &str,
        policy: MatchPolicy,
        session: SessionId,
        operation: Arc<dyn RpcOperation>,
    ) -> Self {
        Self {
            id,
            uri: uri.into(),
            policy,
            session,
            operation,
        }
    }

    pub fn id(&self) -> RegistrationId {
        self.id
    }

    /// The registered URI or pattern.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// The session that owns this registration.
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn operation(&self) -> &Arc<dyn RpcOperation> {
        &self.operation
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("uri", &self.uri)
            .field("policy", &self.policy)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
