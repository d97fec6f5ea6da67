use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use wamp_rpc_caller::{
    CallMessage, CancelMessage, InboundMessage, InvocationHandler, MemPeer, MemSession,
    OutboundMessage,
};
use wamp_rpc_core::{Arguments, CancelMode, RequestId, SessionId, error_uri};
use wamp_rpc_dealer::{CallRequest, Dealer};

type InFlight = Arc<Mutex<HashMap<RequestId, AbortHandle>>>;

/// Serve the CALLs a handler sends through a [`MemSession`] from `dealer`,
/// feeding RESULT and ERROR messages back into the handler.
///
/// Each call runs on its own task. Progressive results are forwarded before
/// the terminal result. A CANCEL is answered with `wamp.error.canceled`;
/// `kill` and `killnowait` also abort the running operation.
///
/// Returns once the session is closed or every handle to it is dropped.
pub async fn serve_local(
    dealer: Arc<Dealer>,
    caller: SessionId,
    mut peer: MemPeer,
    handler: InvocationHandler<MemSession>,
) {
    let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));

    while let Some(message) = peer.recv().await {
        match message {
            OutboundMessage::Call(call) => {
                spawn_call(&dealer, caller, &handler, &in_flight, call);
            }
            OutboundMessage::Cancel(cancel) => {
                cancel_call(&handler, &in_flight, cancel);
            }
        }
    }

    for (_, task) in in_flight.lock().drain() {
        task.abort();
    }
    tracing::debug!(caller = caller.0, "local peer stopped");
}

fn spawn_call(
    dealer: &Arc<Dealer>,
    caller: SessionId,
    handler: &InvocationHandler<MemSession>,
    in_flight: &InFlight,
    call: CallMessage,
) {
    let CallMessage {
        request,
        options,
        procedure,
        arguments,
    } = call;
    let dealer = dealer.clone();
    let handler = handler.clone();
    let registry = in_flight.clone();

    // Held across spawn so the task cannot deregister before it is registered.
    let mut tasks = in_flight.lock();
    let task = tokio::spawn(async move {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<Arguments>();
        let mut call = CallRequest::new(procedure, arguments).with_options(options);
        if call.options.receive_progress {
            call = call.with_progress(progress_tx);
        } else {
            drop(progress_tx);
        }

        let forward = async {
            while let Some(progress) = progress_rx.recv().await {
                handler.dispatch(InboundMessage::progress(request, progress));
            }
        };
        let (outcome, ()) = futures::future::join(dealer.call(caller, call), forward).await;

        if registry.lock().remove(&request).is_none() {
            // Cancelled with `skip`; the caller has already been answered.
            return;
        }
        let reply = match outcome {
            Ok(result) => InboundMessage::result(request, result),
            Err(failure) => InboundMessage::error(request, failure.error, failure.arguments),
        };
        handler.dispatch(reply);
    });
    tasks.insert(request, task.abort_handle());
}

fn cancel_call(handler: &InvocationHandler<MemSession>, in_flight: &InFlight, cancel: CancelMessage) {
    let Some(task) = in_flight.lock().remove(&cancel.request) else {
        tracing::debug!(request = cancel.request.0, "cancel for a call that already finished");
        return;
    };
    if cancel.mode != CancelMode::Skip {
        task.abort();
    }
    tracing::debug!(request = cancel.request.0, mode = %cancel.mode, "call cancelled by caller");
    handler.dispatch(InboundMessage::error(cancel.request, error_uri::CANCELED, Arguments::new()));
}
