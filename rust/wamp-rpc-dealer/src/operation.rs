use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use wamp_rpc_core::{Arguments, RegistrationId, SessionId, Value, error_uri};

/// Channel carrying intermediate results from an operation to its caller.
pub type ProgressSender = mpsc::UnboundedSender<Arguments>;

/// One call routed to a registered operation.
#[derive(Debug)]
pub struct Invocation {
    /// The procedure URI the caller used (may differ from the registration
    /// URI under prefix and wildcard policies).
    pub procedure: String,
    /// The registration the call was routed to.
    pub registration: RegistrationId,
    /// The calling session, when disclosed.
    pub caller: Option<SessionId>,
    /// Call payload.
    pub arguments: Arguments,
    progress: Option<ProgressSender>,
}

impl Invocation {
    pub fn new(procedure: impl Into<String>, registration: RegistrationId, arguments: Arguments) -> Self {
        Self {
            procedure: procedure.into(),
            registration,
            caller: None,
            arguments,
            progress: None,
        }
    }

    pub fn with_caller(mut self, caller: SessionId) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Whether the caller asked for progressive results.
    pub fn wants_progress(&self) -> bool {
        self.progress.is_some()
    }

    /// Send an intermediate result to the caller.
    ///
    /// Returns false when the caller did not ask for progress or has stopped
    /// listening.
    pub fn progress(&self, arguments: Arguments) -> bool {
        match &self.progress {
            Some(tx) => tx.send(arguments).is_ok(),
            None => false,
        }
    }
}

/// Error reply produced by an operation or by the dealer.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcFailure {
    /// Error URI, e.g. `wamp.error.no_such_procedure`.
    pub error: String,
    /// Error payload.
    pub arguments: Arguments,
}

impl RpcFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            arguments: Arguments::new(),
        }
    }

    /// A `wamp.error.runtime_error` carrying `message` as its only positional value.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(error_uri::RUNTIME_ERROR).with_arguments(Arguments::positional([Value::String(
            message.into(),
        )]))
    }

    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = arguments;
        self
    }
}

impl fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arguments.positional.first() {
            Some(Value::String(message)) => write!(f, "{}: {}", self.error, message),
            _ => f.write_str(&self.error),
        }
    }
}

impl std::error::Error for RpcFailure {}

/// Outcome of an operation.
pub type OperationResult = Result<Arguments, RpcFailure>;

/// A callable bound to a registration.
///
/// Implemented for any `Fn(Invocation) -> impl Future<Output = OperationResult>`.
pub trait RpcOperation: Send + Sync + 'static {
    fn invoke(&self, invocation: Invocation) -> BoxFuture<'static, OperationResult>;
}

impl<F, Fut> RpcOperation for F
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = OperationResult> + Send + 'static,
{
    fn invoke(&self, invocation: Invocation) -> BoxFuture<'static, OperationResult> {
        Box::pin(self(invocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn closures_are_operations() {
        let op = |inv: Invocation| async move {
            let sum: i64 = inv
                .arguments
                .positional
                .iter()
                .filter_map(Value::as_i64)
                .sum();
            Ok::<_, RpcFailure>(Arguments::positional([json!(sum)]))
        };

        let inv = Invocation::new(
            "com.calc.add",
            RegistrationId(1),
            Arguments::positional([json!(2), json!(3)]),
        );
        let result = op.invoke(inv).await.unwrap();
        assert_eq!(result.positional, vec![json!(5)]);
    }

    #[test]
    fn progress_without_listener_is_refused() {
        let inv = Invocation::new("p", RegistrationId(1), Arguments::new());
        assert!(!inv.wants_progress());
        assert!(!inv.progress(Arguments::new()));
    }

    #[test]
    fn progress_reaches_listener_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let inv = Invocation::new("p", RegistrationId(1), Arguments::new()).with_progress(tx);
        assert!(inv.progress(Arguments::positional([json!(1)])));
        assert!(inv.progress(Arguments::positional([json!(2)])));
        assert_eq!(rx.try_recv().unwrap().positional, vec![json!(1)]);
        assert_eq!(rx.try_recv().unwrap().positional, vec![json!(2)]);

        drop(rx);
        assert!(!inv.progress(Arguments::new()));
    }

    #[test]
    fn failure_display() {
        let failure = RpcFailure::runtime("division by zero");
        assert_eq!(failure.error, error_uri::RUNTIME_ERROR);
        assert_eq!(
            failure.to_string(),
            "wamp.error.runtime_error: division by zero"
        );
        assert_eq!(RpcFailure::new("app.error").to_string(), "app.error");
    }
}
