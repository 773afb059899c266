//! Wire-level vocabulary shared by every Ironclash game instance.
//!
//! Commands travel between the authoritative server and its replicas wrapped in an
//! [`Envelope`] that records which instance produced them.

mod command;
mod hex;
mod ids;
mod types;
pub mod wire;

pub use crate::command::*;
pub use crate::hex::*;
pub use crate::ids::*;
pub use crate::types::*;
