//! Correlation of outgoing calls with their results.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use wamp_rpc_core::{CancelMode, RequestId, RequestIdAllocator};

use crate::pending::{Delivery, PendingTable};
use crate::{
    CallDescriptor, CallMessage, CallerSession, CancelMessage, InboundMessage, InvocationError,
    InvokerConfig, OutboundMessage, ResultExtractor,
};

/// Receives the intermediate results of a progressive call, in order.
pub trait ProgressSink<T> {
    fn progress(&mut self, value: T);
}

impl<T, F: FnMut(T)> ProgressSink<T> for F {
    fn progress(&mut self, value: T) {
        self(value)
    }
}

/// Issues calls through a session and routes their results back.
///
/// Cloning is cheap; clones share the pending table and request IDs.
pub struct InvocationHandler<S> {
    shared: Arc<Shared<S>>,
}

struct Shared<S> {
    session: S,
    pending: PendingTable,
    ids: RequestIdAllocator,
    config: InvokerConfig,
}

impl<S> Clone for InvocationHandler<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<S: CallerSession> Shared<S> {
    fn send_cancel(&self, request: RequestId, mode: CancelMode) {
        let cancel = OutboundMessage::Cancel(CancelMessage { request, mode });
        if let Err(err) = self.session.send(cancel) {
            tracing::warn!(request = request.0, %mode, %err, "failed to send cancel");
        }
    }

    fn cancel(&self, request: RequestId, mode: CancelMode) -> bool {
        // The mode only tells the callee what to do; the caller stops waiting
        // in every case.
        let cancelled = self.pending.fail(request, InvocationError::Cancelled);
        if cancelled {
            tracing::debug!(request = request.0, %mode, "cancelling call");
            self.send_cancel(request, mode);
        }
        cancelled
    }
}

impl<S: CallerSession> InvocationHandler<S> {
    pub fn new(session: S) -> Self {
        Self::with_config(session, InvokerConfig::default())
    }

    pub fn with_config(session: S, config: InvokerConfig) -> Self {
        Self::with_request_ids(session, config, RequestIdAllocator::new())
    }

    /// A handler drawing request IDs from `ids`.
    pub fn with_request_ids(session: S, config: InvokerConfig, ids: RequestIdAllocator) -> Self {
        Self {
            shared: Arc::new(Shared {
                session,
                pending: PendingTable::new(config.max_pending),
                ids,
                config,
            }),
        }
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.shared.config
    }

    pub fn session(&self) -> &S {
        &self.shared.session
    }

    /// Send a CALL and return a handle for awaiting its result.
    ///
    /// The call is registered as pending before the CALL leaves, so a result
    /// delivered before the handle is awaited is not lost.
    pub fn start<E: ResultExtractor>(
        &self,
        descriptor: CallDescriptor,
        extractor: E,
    ) -> Result<PendingCall<S, E>, InvocationError> {
        let shared = &self.shared;
        let request = shared
            .ids
            .next_id()
            .map_err(|_| InvocationError::IdSpaceExhausted {
                limit: shared.ids.limit(),
            })?;

        let CallDescriptor {
            procedure,
            arguments,
            options,
        } = descriptor;
        let timeout = options.timeout.or(shared.config.call_timeout);
        let rx = shared.pending.insert(request, options.receive_progress)?;
        let mut guard = PendingGuard {
            shared: shared.clone(),
            request,
            active: true,
        };

        let call = OutboundMessage::Call(CallMessage {
            request,
            options,
            procedure,
            arguments,
        });
        if let Err(err) = shared.session.send(call) {
            // Never left, so there is nothing to cancel remotely.
            guard.disarm();
            shared.pending.remove(request);
            return Err(err.into());
        }

        tracing::debug!(request = request.0, ?timeout, "call: request sent");
        Ok(PendingCall {
            request,
            rx,
            extractor,
            timeout,
            guard,
        })
    }

    /// Call and wait for the terminal result.
    pub async fn invoke_async<E: ResultExtractor>(
        &self,
        descriptor: CallDescriptor,
        extractor: E,
    ) -> Result<E::Output, InvocationError> {
        self.start(descriptor, extractor)?.finish().await
    }

    /// Call with progressive results enabled; every intermediate result is
    /// extracted and handed to `sink` before the terminal result is returned.
    pub async fn invoke_progressive_async<E, P>(
        &self,
        mut descriptor: CallDescriptor,
        extractor: E,
        sink: P,
    ) -> Result<E::Output, InvocationError>
    where
        E: ResultExtractor,
        P: ProgressSink<E::Output>,
    {
        descriptor.options.receive_progress = true;
        self.start(descriptor, extractor)?
            .finish_with_progress(sink)
            .await
    }

    /// Call and block the current thread until the terminal result arrives.
    ///
    /// Drives a private current-thread runtime.
    ///
    /// # Errors
    ///
    /// Called from a thread that is already inside a tokio runtime, it returns
    /// [`InvocationError::Runtime`] at once without sending anything, instead
    /// of blocking a runtime worker. Use [`invoke_async`](Self::invoke_async)
    /// there.
    pub fn invoke_sync<E: ResultExtractor>(
        &self,
        descriptor: CallDescriptor,
        extractor: E,
    ) -> Result<E::Output, InvocationError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(InvocationError::Runtime(std::io::Error::other(
                "blocking call issued from inside an async runtime",
            )));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(InvocationError::Runtime)?;
        runtime.block_on(self.invoke_async(descriptor, extractor))
    }

    /// Cancel an outstanding call.
    ///
    /// The call fails with `Cancelled` right away whatever the mode; a
    /// best-effort CANCEL carrying `mode` is sent to the peer and need not be
    /// acknowledged. Returns false when the call was no longer pending.
    pub fn cancel(&self, request: RequestId, mode: CancelMode) -> bool {
        self.shared.cancel(request, mode)
    }

    /// Feed an incoming RESULT or ERROR. Returns false when it matched no
    /// outstanding call.
    pub fn dispatch(&self, message: InboundMessage) -> bool {
        self.shared.pending.deliver(message)
    }

    /// Fail every outstanding call with `ConnectionLost`.
    pub fn connection_lost(&self) -> usize {
        let failed = self.shared.pending.drain();
        if failed > 0 {
            tracing::debug!(failed, "connection lost, failed pending calls");
        }
        failed
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending.len()
    }
}

/// Removes a call that is abandoned before its terminal result and tells
/// the peer about it.
struct PendingGuard<S: CallerSession> {
    shared: Arc<Shared<S>>,
    request: RequestId,
    active: bool,
}

impl<S: CallerSession> PendingGuard<S> {
    fn disarm(&mut self) {
        self.active = false;
    }
}

impl<S: CallerSession> Drop for PendingGuard<S> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if self.shared.pending.remove(self.request) {
            tracing::debug!(request = self.request.0, "call abandoned before completion");
            self.shared
                .send_cancel(self.request, self.shared.config.cancel_mode);
        }
    }
}

/// Cancels one call from anywhere.
pub struct Canceller<S: CallerSession> {
    shared: Arc<Shared<S>>,
    request: RequestId,
}

impl<S: CallerSession> Clone for Canceller<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            request: self.request,
        }
    }
}

impl<S: CallerSession> Canceller<S> {
    pub fn request_id(&self) -> RequestId {
        self.request
    }

    /// See [`InvocationHandler::cancel`].
    pub fn cancel(&self, mode: CancelMode) -> bool {
        self.shared.cancel(self.request, mode)
    }
}

/// A call that has been sent and not yet awaited.
///
/// Dropping it, or the future returned by [`finish`](Self::finish), before
/// the terminal result arrives removes the call and sends a CANCEL.
pub struct PendingCall<S: CallerSession, E: ResultExtractor> {
    request: RequestId,
    rx: mpsc::UnboundedReceiver<Delivery>,
    extractor: E,
    timeout: Option<Duration>,
    guard: PendingGuard<S>,
}

impl<S: CallerSession, E: ResultExtractor> PendingCall<S, E> {
    pub fn request_id(&self) -> RequestId {
        self.request
    }

    pub fn canceller(&self) -> Canceller<S> {
        Canceller {
            shared: self.guard.shared.clone(),
            request: self.request,
        }
    }

    /// Wait for the terminal result, discarding progressive results.
    pub async fn finish(self) -> Result<E::Output, InvocationError> {
        self.finish_with_progress(|_: E::Output| {}).await
    }

    /// Wait for the terminal result, handing progressive results to `sink`.
    pub async fn finish_with_progress<P>(mut self, mut sink: P) -> Result<E::Output, InvocationError>
    where
        P: ProgressSink<E::Output>,
    {
        let wait = Self::wait(&mut self.rx, &self.extractor, &mut sink);
        let outcome = match self.timeout {
            Some(after) => match tokio::time::timeout(after, wait).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => {
                    tracing::warn!(
                        request = self.request.0,
                        timeout_ms = after.as_millis() as u64,
                        "call timed out"
                    );
                    // The guard removes the call and sends the CANCEL.
                    return Err(InvocationError::Timeout { after });
                }
            },
            None => wait.await,
        };

        match &outcome {
            Ok(_) => tracing::debug!(request = self.request.0, "call: completed"),
            Err(err) => tracing::debug!(request = self.request.0, %err, "call: failed"),
        }
        outcome
    }

    async fn wait<P>(
        rx: &mut mpsc::UnboundedReceiver<Delivery>,
        extractor: &E,
        sink: &mut P,
    ) -> Result<E::Output, InvocationError>
    where
        P: ProgressSink<E::Output>,
    {
        loop {
            match rx.recv().await {
                Some(Delivery::Progress(arguments)) => sink.progress(extractor.extract(&arguments)?),
                Some(Delivery::Final(Ok(arguments))) => return Ok(extractor.extract(&arguments)?),
                Some(Delivery::Final(Err(err))) => return Err(err),
                None => return Err(InvocationError::ConnectionLost),
            }
        }
    }
}
