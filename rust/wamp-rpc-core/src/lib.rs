#![doc = include_str!("../README.md")]
#![forbid(unsafe_op_in_unsafe_fn)]

mod arguments;
mod error;
mod id;
mod mapper;
mod options;
mod uri;

pub use arguments::*;
pub use error::*;
pub use id::*;
pub use mapper::*;
pub use options::*;
pub use uri::*;

// Payload values are already-decoded JSON-like trees; re-exported so that
// downstream crates agree on one value type.
pub use serde_json::{Map, Value};
