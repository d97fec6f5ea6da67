use std::fmt;

/// Error URIs carried in ERROR messages.
pub mod error_uri {
    /// No registration matches the called procedure.
    pub const NO_SUCH_PROCEDURE: &str = "wamp.error.no_such_procedure";
    /// A registration with the same URI and match policy already exists.
    pub const PROCEDURE_ALREADY_EXISTS: &str = "wamp.error.procedure_already_exists";
    /// The registration ID is unknown or owned by another session.
    pub const NO_SUCH_REGISTRATION: &str = "wamp.error.no_such_registration";
    /// The URI is malformed for the requested policy.
    pub const INVALID_URI: &str = "wamp.error.invalid_uri";
    /// The call was cancelled.
    pub const CANCELED: &str = "wamp.error.canceled";
    /// The callee raised an error without a more specific URI.
    pub const RUNTIME_ERROR: &str = "wamp.error.runtime_error";
    /// The callee or dealer refused the call's arguments.
    pub const INVALID_ARGUMENT: &str = "wamp.error.invalid_argument";
}

/// Errors from the protocol ID spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// Every ID up to `limit` is in use (or was issued, for request IDs).
    Exhausted { limit: u64 },
    /// The ID is not live in this mapper.
    UnknownId(u64),
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::Exhausted { limit } => write!(f, "ID space exhausted (limit {})", limit),
            IdError::UnknownId(id) => write!(f, "unknown ID: {}", id),
        }
    }
}

impl std::error::Error for IdError {}

/// Why a procedure URI was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// The URI is the empty string.
    Empty,
    /// Segment `index` is empty where the policy requires a literal.
    EmptySegment { index: usize },
    /// The URI contains a character WAMP URIs may not carry.
    IllegalCharacter(char),
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriError::Empty => write!(f, "URI cannot be empty"),
            UriError::EmptySegment { index } => write!(f, "URI segment {} is empty", index),
            UriError::IllegalCharacter(c) => write!(f, "illegal character {:?} in URI", c),
        }
    }
}

impl std::error::Error for UriError {}
