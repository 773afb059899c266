//! Ironclash authoritative server
//!
//! Owns the phase state machine, derives server commands from accepted client commands,
//! and publishes everything on the shared command bus.

pub mod config;
pub mod game;
pub mod manager;
pub mod phase;

pub use config::{ConfigError, MapConfig, ServerConfig};
pub use game::{ServerContext, ServerGame};
pub use manager::{GameManager, ManagerError};
pub use phase::{
    create_phase, BattleTechPhaseManager, Phase, PhaseManager, PhysicalAttackPhaseManager,
    Transition,
};
