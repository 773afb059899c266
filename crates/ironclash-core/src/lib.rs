//! Simulation state shared by the authoritative server and its replicas.

mod bus;
mod dice;
mod game;
mod initiative;
mod map;
mod notify;
mod to_hit;
mod turn_order;
mod unit;

pub use crate::bus::*;
pub use crate::dice::*;
pub use crate::game::*;
pub use crate::initiative::*;
pub use crate::map::*;
pub use crate::notify::*;
pub use crate::to_hit::*;
pub use crate::turn_order::*;
pub use crate::unit::*;
