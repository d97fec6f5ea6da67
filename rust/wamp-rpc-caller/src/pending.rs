//! Outstanding calls, keyed by request ID.
//!
//! Every call owns an unbounded channel. Deliveries are enqueued while the
//! table lock is held, so the waiting side sees progress and terminal results
//! in the order the session delivered them. A terminal delivery removes the
//! entry, which makes fulfillment happen at most once.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use wamp_rpc_core::{Arguments, RequestId, error_uri};

use crate::{InboundMessage, InvocationError};

#[derive(Debug)]
pub(crate) enum Delivery {
    Progress(Arguments),
    Final(Result<Arguments, InvocationError>),
}

struct PendingEntry {
    tx: mpsc::UnboundedSender<Delivery>,
    progressive: bool,
}

pub(crate) struct PendingTable {
    entries: Mutex<HashMap<RequestId, PendingEntry>>,
    max_pending: usize,
}

impl PendingTable {
    pub(crate) fn new(max_pending: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_pending,
        }
    }

    /// Register a call before it is sent.
    pub(crate) fn insert(
        &self,
        request: RequestId,
        progressive: bool,
    ) -> Result<mpsc::UnboundedReceiver<Delivery>, InvocationError> {
        let mut entries = self.entries.lock();
        if entries.len() >= self.max_pending {
            tracing::warn!(
                request = request.0,
                pending = entries.len(),
                limit = self.max_pending,
                "too many pending calls, refusing new call"
            );
            return Err(InvocationError::TooManyPending {
                limit: self.max_pending,
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        entries.insert(request, PendingEntry { tx, progressive });
        Ok(rx)
    }

    /// Route an incoming RESULT or ERROR to its call.
    ///
    /// Returns false when the message matched no outstanding call.
    pub(crate) fn deliver(&self, message: InboundMessage) -> bool {
        let mut entries = self.entries.lock();
        match message {
            InboundMessage::Result {
                request,
                details,
                arguments,
            } if details.progress => match entries.get(&request) {
                Some(entry) if entry.progressive => {
                    let _ = entry.tx.send(Delivery::Progress(arguments));
                    true
                }
                Some(_) => {
                    tracing::warn!(
                        request = request.0,
                        "progressive result for a call that did not ask for progress"
                    );
                    false
                }
                None => {
                    tracing::warn!(request = request.0, "progressive result for unknown call");
                    false
                }
            },
            InboundMessage::Result {
                request, arguments, ..
            } => match entries.remove(&request) {
                Some(entry) => {
                    let _ = entry.tx.send(Delivery::Final(Ok(arguments)));
                    true
                }
                None => {
                    tracing::warn!(request = request.0, "result for unknown or completed call");
                    false
                }
            },
            InboundMessage::Error {
                request,
                error,
                arguments,
            } => match entries.remove(&request) {
                Some(entry) => {
                    let outcome = if error == error_uri::CANCELED {
                        InvocationError::Cancelled
                    } else {
                        InvocationError::Remote { error, arguments }
                    };
                    let _ = entry.tx.send(Delivery::Final(Err(outcome)));
                    true
                }
                None if error == error_uri::CANCELED => {
                    tracing::debug!(request = request.0, "cancel acknowledged after local completion");
                    false
                }
                None => {
                    tracing::warn!(request = request.0, %error, "error for unknown or completed call");
                    false
                }
            },
        }
    }

    /// Fail one call. Returns false when it was no longer pending.
    pub(crate) fn fail(&self, request: RequestId, error: InvocationError) -> bool {
        match self.entries.lock().remove(&request) {
            Some(entry) => {
                let _ = entry.tx.send(Delivery::Final(Err(error)));
                true
            }
            None => false,
        }
    }

    /// Forget a call without fulfilling it.
    pub(crate) fn remove(&self, request: RequestId) -> bool {
        self.entries.lock().remove(&request).is_some()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, request: RequestId) -> bool {
        self.entries.lock().contains_key(&request)
    }

    /// Fail every outstanding call with `ConnectionLost`.
    pub(crate) fn drain(&self) -> usize {
        let drained: Vec<PendingEntry> = self.entries.lock().drain().map(|(_, e)| e).collect();
        for entry in &drained {
            let _ = entry
                .tx
                .send(Delivery::Final(Err(InvocationError::ConnectionLost)));
        }
        drained.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
