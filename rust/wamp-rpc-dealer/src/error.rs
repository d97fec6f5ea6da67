use std::fmt;

use wamp_rpc_core::{IdError, MatchPolicy, RegistrationId, UriError, error_uri};

use crate::RpcFailure;

/// Errors from registration, unregistration and call routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// `(uri, policy)` is already registered.
    DuplicateRegistration { uri: String, policy: MatchPolicy },

    /// The ID is not live, belongs to another catalog, or is owned by
    /// another session.
    UnknownRegistration(RegistrationId),

    /// No registration matches the called procedure under any policy.
    NoSuchProcedure(String),

    /// No catalog handles the requested match policy literal.
    UnsupportedPolicy(String),

    /// The URI is malformed for the requested policy.
    InvalidUri { uri: String, reason: UriError },

    /// Every registration ID is in use.
    IdSpaceExhausted { limit: u64 },
}

impl CatalogError {
    /// The WAMP error URI reported to the remote peer.
    pub fn error_uri(&self) -> &'static str {
        match self {
            CatalogError::DuplicateRegistration { .. } => error_uri::PROCEDURE_ALREADY_EXISTS,
            CatalogError::UnknownRegistration(_) => error_uri::NO_SUCH_REGISTRATION,
            CatalogError::NoSuchProcedure(_) => error_uri::NO_SUCH_PROCEDURE,
            CatalogError::UnsupportedPolicy(_) => error_uri::INVALID_ARGUMENT,
            CatalogError::InvalidUri { .. } => error_uri::INVALID_URI,
            CatalogError::IdSpaceExhausted { .. } => error_uri::RUNTIME_ERROR,
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DuplicateRegistration { uri, policy } => {
                write!(f, "procedure {} is already registered with {} matching", uri, policy)
            }
            CatalogError::UnknownRegistration(id) => write!(f, "unknown {}", id),
            CatalogError::NoSuchProcedure(uri) => write!(f, "no procedure matches {}", uri),
            CatalogError::UnsupportedPolicy(literal) => {
                write!(f, "unsupported match policy: {:?}", literal)
            }
            CatalogError::InvalidUri { uri, reason } => write!(f, "invalid URI {:?}: {}", uri, reason),
            CatalogError::IdSpaceExhausted { limit } => {
                write!(f, "registration ID space exhausted (limit {})", limit)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<IdError> for CatalogError {
    fn from(err: IdError) -> Self {
        match err {
            IdError::Exhausted { limit } => CatalogError::IdSpaceExhausted { limit },
            IdError::UnknownId(id) => CatalogError::UnknownRegistration(RegistrationId(id)),
        }
    }
}

impl From<CatalogError> for RpcFailure {
    fn from(err: CatalogError) -> Self {
        RpcFailure::new(err.error_uri()).with_arguments(wamp_rpc_core::Arguments::positional([
            wamp_rpc_core::Value::String(err.to_string()),
        ]))
    }
}
