//! Decoded protocol messages exchanged with the session.

use wamp_rpc_core::{Arguments, CallOptions, CancelMode, RequestId, ResultDetails};

/// A CALL request.
#[derive(Debug, Clone, PartialEq)]
pub struct CallMessage {
    pub request: RequestId,
    pub options: CallOptions,
    pub procedure: String,
    pub arguments: Arguments,
}

/// A CANCEL request for an outstanding call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelMessage {
    pub request: RequestId,
    pub mode: CancelMode,
}

/// Messages the caller hands to its session.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Call(CallMessage),
    Cancel(CancelMessage),
}

impl OutboundMessage {
    pub fn request(&self) -> RequestId {
        match self {
            OutboundMessage::Call(call) => call.request,
            OutboundMessage::Cancel(cancel) => cancel.request,
        }
    }
}

/// Messages the session feeds back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// RESULT; `details.progress` marks an intermediate result.
    Result {
        request: RequestId,
        details: ResultDetails,
        arguments: Arguments,
    },
    /// ERROR in reply to a CALL.
    Error {
        request: RequestId,
        error: String,
        arguments: Arguments,
    },
}

impl InboundMessage {
    /// A terminal RESULT.
    pub fn result(request: RequestId, arguments: Arguments) -> Self {
        InboundMessage::Result {
            request,
            details: ResultDetails::terminal(),
            arguments,
        }
    }

    /// An intermediate RESULT.
    pub fn progress(request: RequestId, arguments: Arguments) -> Self {
        InboundMessage::Result {
            request,
            details: ResultDetails::progressive(),
            arguments,
        }
    }

    pub fn error(request: RequestId, error: impl Into<String>, arguments: Arguments) -> Self {
        InboundMessage::Error {
            request,
            error: error.into(),
            arguments,
        }
    }

    pub fn request(&self) -> RequestId {
        match self {
            InboundMessage::Result { request, .. } | InboundMessage::Error { request, .. } => {
                *request
            }
        }
    }
}
