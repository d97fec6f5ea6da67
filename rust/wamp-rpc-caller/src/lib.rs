#![doc = include_str!("../README.md")]
#![forbid(unsafe_op_in_unsafe_fn)]

mod config;
mod error;
mod extract;
mod handler;
mod interceptor;
mod message;
mod pending;
mod proxy;
mod session;

pub use config::*;
pub use error::*;
pub use extract::*;
pub use handler::*;
pub use interceptor::*;
pub use message::*;
pub use proxy::*;
pub use session::*;
