use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{CallerSession, OutboundMessage, SessionError};

/// In-process session; everything sent shows up on the paired [`MemPeer`].
///
/// Closing any clone closes the session for all of them, and the peer sees
/// the end of the stream once it has received what was already sent.
#[derive(Clone, Debug)]
pub struct MemSession {
    inner: Arc<MemInner>,
}

#[derive(Debug)]
struct MemInner {
    tx: Mutex<Option<mpsc::UnboundedSender<OutboundMessage>>>,
}

/// Receiving end of a [`MemSession`].
#[derive(Debug)]
pub struct MemPeer {
    rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl MemSession {
    pub fn pair() -> (Self, MemPeer) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            inner: Arc::new(MemInner {
                tx: Mutex::new(Some(tx)),
            }),
        };
        (session, MemPeer { rx })
    }

    /// Refuse every further send.
    pub fn close(&self) {
        self.inner.tx.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.tx.lock().is_none()
    }
}

impl CallerSession for MemSession {
    fn send(&self, message: OutboundMessage) -> Result<(), SessionError> {
        match self.inner.tx.lock().as_ref() {
            Some(tx) => tx.send(message).map_err(|_| SessionError::Closed),
            None => Err(SessionError::Closed),
        }
    }
}

impl MemPeer {
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.rx.recv().await
    }

    /// Blocking receive for peers running on a plain thread.
    pub fn blocking_recv(&mut self) -> Option<OutboundMessage> {
        self.rx.blocking_recv()
    }

    pub fn try_recv(&mut self) -> Option<OutboundMessage> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CancelMessage;
    use wamp_rpc_core::{CancelMode, RequestId};

    #[test]
    fn sends_reach_peer_until_closed() {
        let (session, mut peer) = MemSession::pair();
        let cancel = OutboundMessage::Cancel(CancelMessage {
            request: RequestId(1),
            mode: CancelMode::Skip,
        });

        session.send(cancel.clone()).unwrap();
        assert_eq!(peer.try_recv(), Some(cancel.clone()));

        session.send(cancel.clone()).unwrap();
        session.clone().close();
        assert!(session.is_closed());
        assert_eq!(session.send(cancel.clone()), Err(SessionError::Closed));

        // Already-sent messages are still delivered, then the stream ends.
        assert_eq!(peer.blocking_recv(), Some(cancel));
        assert_eq!(peer.blocking_recv(), None);
    }

    #[test]
    fn dropped_peer_closes_session() {
        let (session, peer) = MemSession::pair();
        drop(peer);
        let err = session
            .send(OutboundMessage::Cancel(CancelMessage {
                request: RequestId(1),
                mode: CancelMode::Kill,
            }))
            .unwrap_err();
        assert_eq!(err, SessionError::Closed);
    }
}
