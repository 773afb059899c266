//! Authoritative game: shared context handed to phases and the lifecycle owner.

mod context;
mod server;

pub use context::ServerContext;
pub use server::ServerGame;
