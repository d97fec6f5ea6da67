use std::sync::Arc;

use crate::{OutboundMessage, SessionError};

#[cfg(feature = "mem")]
mod mem;
#[cfg(feature = "mem")]
pub use mem::*;

/// Outgoing half of a WAMP session, as seen by the caller.
///
/// `send` only enqueues; it must not wait for the peer.
pub trait CallerSession: Send + Sync + 'static {
    fn send(&self, message: OutboundMessage) -> Result<(), SessionError>;
}

impl<S: CallerSession + ?Sized> CallerSession for Arc<S> {
    fn send(&self, message: OutboundMessage) -> Result<(), SessionError> {
        (**self).send(message)
    }
}
