use std::fmt;
use std::time::Duration;

use wamp_rpc_core::{Arguments, Value, error_uri};

/// Failure to hand a message to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session no longer accepts messages.
    Closed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Closed => write!(f, "session closed"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Where in a result payload a value was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPosition {
    Index(usize),
    Named(String),
}

impl fmt::Display for ResultPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultPosition::Index(index) => write!(f, "positional result {}", index),
            ResultPosition::Named(key) => write!(f, "named result {:?}", key),
        }
    }
}

/// A result payload that cannot be converted to the requested type.
#[derive(Debug)]
pub enum ExtractError {
    /// A value was expected but the payload holds none.
    MissingResult,

    /// The value at `position` does not convert to the requested type.
    ResultTypeMismatch {
        position: ResultPosition,
        source: serde_json::Error,
    },

    /// More positional values than a single-value result allows.
    UnexpectedResults { count: usize },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::MissingResult => write!(f, "call returned no result"),
            ExtractError::ResultTypeMismatch { position, source } => {
                write!(f, "{} has the wrong type: {}", position, source)
            }
            ExtractError::UnexpectedResults { count } => {
                write!(f, "expected a single result, got {} positional values", count)
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::ResultTypeMismatch { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure to resolve a method to a procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptError {
    UnknownMethod(String),
    ArityMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for InterceptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptError::UnknownMethod(method) => write!(f, "no procedure bound to method {}", method),
            InterceptError::ArityMismatch {
                method,
                expected,
                actual,
            } => write!(
                f,
                "method {} takes {} arguments, got {}",
                method, expected, actual
            ),
        }
    }
}

impl std::error::Error for InterceptError {}

/// Why a call did not produce a value.
#[derive(Debug)]
pub enum InvocationError {
    /// No terminal result arrived in time; a CANCEL was sent.
    Timeout { after: Duration },

    /// The session went away while the call was outstanding.
    ConnectionLost,

    /// The call was cancelled by the caller.
    Cancelled,

    /// The callee or the dealer answered with an ERROR.
    Remote { error: String, arguments: Arguments },

    /// The result payload did not fit the requested type.
    Extract(ExtractError),

    /// The CALL could not be handed to the session.
    Session(SessionError),

    /// Too many calls are outstanding.
    TooManyPending { limit: usize },

    /// The request ID space is used up.
    IdSpaceExhausted { limit: u64 },

    /// The method could not be resolved to a procedure.
    Intercept(InterceptError),

    /// The private runtime for a blocking call could not be used.
    Runtime(std::io::Error),
}

impl InvocationError {
    /// The WAMP error URI this failure corresponds to, when there is one.
    pub fn error_uri(&self) -> Option<&str> {
        match self {
            InvocationError::Remote { error, .. } => Some(error),
            InvocationError::Cancelled => Some(error_uri::CANCELED),
            _ => None,
        }
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationError::Timeout { after } => write!(f, "call timed out after {:?}", after),
            InvocationError::ConnectionLost => write!(f, "connection lost"),
            InvocationError::Cancelled => write!(f, "call cancelled"),
            InvocationError::Remote { error, arguments } => match arguments.positional.first() {
                Some(Value::String(message)) => write!(f, "remote error {}: {}", error, message),
                _ => write!(f, "remote error {}", error),
            },
            InvocationError::Extract(e) => write!(f, "{}", e),
            InvocationError::Session(e) => write!(f, "{}", e),
            InvocationError::TooManyPending { limit } => {
                write!(f, "too many pending calls (limit {})", limit)
            }
            InvocationError::IdSpaceExhausted { limit } => {
                write!(f, "request ID space exhausted (limit {})", limit)
            }
            InvocationError::Intercept(e) => write!(f, "{}", e),
            InvocationError::Runtime(e) => write!(f, "blocking call runtime: {}", e),
        }
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InvocationError::Extract(e) => Some(e),
            InvocationError::Session(e) => Some(e),
            InvocationError::Intercept(e) => Some(e),
            InvocationError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ExtractError> for InvocationError {
    fn from(e: ExtractError) -> Self {
        InvocationError::Extract(e)
    }
}

impl From<SessionError> for InvocationError {
    fn from(e: SessionError) -> Self {
        InvocationError::Session(e)
    }
}

impl From<InterceptError> for InvocationError {
    fn from(e: InterceptError) -> Self {
        InvocationError::Intercept(e)
    }
}
