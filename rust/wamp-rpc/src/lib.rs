#![doc = include_str!("../README.md")]
#![forbid(unsafe_op_in_unsafe_fn)]

mod local;
mod realm;

pub use local::*;
pub use realm::*;

pub use wamp_rpc_caller::*;
pub use wamp_rpc_core::*;
pub use wamp_rpc_dealer::*;
