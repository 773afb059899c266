//! Ironclash client replica
//!
//! Mirrors the authoritative game from the command bus and turns player intent into
//! client commands. Local state only ever changes in response to bus traffic.

mod game;

pub use game::{ClientError, ClientGame};
