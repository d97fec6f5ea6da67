use std::sync::Arc;

use wamp_rpc_core::{Arguments, CallOptions, RegisterOptions, RegistrationId, SessionId};

use crate::{CatalogError, CatalogRouter, Invocation, ProgressSender, RpcFailure, RpcOperation};

/// A CALL as seen by the dealer.
#[derive(Debug)]
pub struct CallRequest {
    pub procedure: String,
    pub arguments: Arguments,
    pub options: CallOptions,
    /// Where progressive results go when `options.receive_progress` is set.
    pub progress: Option<ProgressSender>,
}

impl CallRequest {
    pub fn new(procedure: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            procedure: procedure.into(),
            arguments,
            options: CallOptions::default(),
            progress: None,
        }
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    /// Ask for progressive results, delivered on `progress`.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.options.receive_progress = true;
        self.progress = Some(progress);
        self
    }
}

/// Owns the registrations of a realm and routes calls to them.
#[derive(Default)]
pub struct Dealer {
    router: CatalogRouter,
}

impl Dealer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_router(router: CatalogRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &CatalogRouter {
        &self.router
    }

    /// Handle a REGISTER, returning the ID for the acknowledgement.
    pub fn register(
        &self,
        session: SessionId,
        uri: &str,
        options: &RegisterOptions,
        operation: Arc<dyn RpcOperation>,
    ) -> Result<RegistrationId, CatalogError> {
        self.router
            .register(session, options, uri, operation)
            .map(|registration| registration.id())
    }

    /// Handle an UNREGISTER from `session`.
    pub fn unregister(&self, session: SessionId, id: RegistrationId) -> Result<(), CatalogError> {
        self.router.unregister(session, id).map(|_| ())
    }

    /// Route a CALL from `caller` to the matching operation and await its result.
    ///
    /// Routing misses come back as a `wamp.error.no_such_procedure` failure.
    pub async fn call(&self, caller: SessionId, request: CallRequest) -> Result<Arguments, RpcFailure> {
        let registration = match self.router.matching_operation(&request.procedure) {
            Ok(registration) => registration,
            Err(err) => {
                tracing::debug!(procedure = %request.procedure, caller = caller.0, "no procedure for call");
                return Err(err.into());
            }
        };

        let mut invocation =
            Invocation::new(request.procedure, registration.id(), request.arguments);
        if request.options.disclose_me {
            invocation = invocation.with_caller(caller);
        }
        if request.options.receive_progress {
            if let Some(progress) = request.progress {
                invocation = invocation.with_progress(progress);
            }
        }

        tracing::debug!(
            procedure = %invocation.procedure,
            registration = registration.id().0,
            caller = caller.0,
            "routing call"
        );
        registration.operation().invoke(invocation).await
    }

    /// Drop every registration of a closed session.
    ///
    /// The dealer does not remember closed sessions: a `register` issued for
    /// the session after this returns is accepted. Callers must stop
    /// registering first, as `RealmProxy` does.
    pub fn session_closed(&self, session: SessionId) -> usize {
        let purged = self.router.purge_session(session);
        if purged > 0 {
            tracing::debug!(session = session.0, purged, "session registrations dropped");
        }
        purged
    }
}
