#![doc = include_str!("../README.md")]
#![forbid(unsafe_op_in_unsafe_fn)]

mod catalog;
mod dealer;
mod error;
mod exact;
mod operation;
mod prefix;
mod registration;
mod router;
mod wildcard;

pub use catalog::*;
pub use dealer::*;
pub use error::*;
pub use exact::*;
pub use operation::*;
pub use prefix::*;
pub use registration::*;
pub use router::*;
pub use wildcard::*;

#[cfg(test)]
mod test_util {
    use std::sync::Arc;

    use wamp_rpc_core::Arguments;

    use crate::{Invocation, RpcFailure, RpcOperation};

    pub(crate) fn noop() -> Arc<dyn RpcOperation> {
        Arc::new(|_inv: Invocation| async { Ok::<_, RpcFailure>(Arguments::new()) })
    }
}
