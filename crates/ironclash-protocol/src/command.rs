use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AttackResolution, GameId, HeatData, MovementType, PathSegment, PhaseName, PlayerId,
    PlayerStatus, Position, UnitData, UnitId, WeaponConfig, WeaponRef, WeaponTarget,
};

/// Every message exchanged between game instances. Fully serializable.
///
/// Client kinds are requests raised by players; server kinds are facts derived by the
/// authority. The authority re-publishes accepted client commands under its own origin
/// so that replicas can mirror them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    // Client -> server
    Join {
        player: PlayerId,
        name: String,
        tint: String,
        units: Vec<UnitData>,
    },
    UpdatePlayerStatus {
        player: PlayerId,
        status: PlayerStatus,
    },
    DeployUnit {
        player: PlayerId,
        unit: UnitId,
        position: Position,
    },
    MoveUnit {
        player: PlayerId,
        unit: UnitId,
        movement: MovementType,
        path: Vec<PathSegment>,
    },
    WeaponConfiguration {
        player: PlayerId,
        unit: UnitId,
        config: WeaponConfig,
    },
    WeaponAttackDeclaration {
        player: PlayerId,
        attacker: UnitId,
        targets: Vec<WeaponTarget>,
    },
    TurnEnded {
        player: PlayerId,
    },
    RollDice {
        player: PlayerId,
    },

    // Server -> all
    ChangePhase {
        phase: PhaseName,
    },
    ChangeActivePlayer {
        player: PlayerId,
        units_to_play: u32,
    },
    TurnIncremented {
        turn: u32,
    },
    HeatUpdated {
        unit: UnitId,
        heat: HeatData,
        previous_heat: u32,
    },
    WeaponAttackResolution {
        player: PlayerId,
        attacker: UnitId,
        target: UnitId,
        weapon: WeaponRef,
        resolution: AttackResolution,
    },
    DiceRolled {
        player: PlayerId,
        roll: u32,
    },
}

impl Command {
    pub fn is_client(&self) -> bool {
        matches!(
            self,
            Command::Join { .. }
                | Command::UpdatePlayerStatus { .. }
                | Command::DeployUnit { .. }
                | Command::MoveUnit { .. }
                | Command::WeaponConfiguration { .. }
                | Command::WeaponAttackDeclaration { .. }
                | Command::TurnEnded { .. }
                | Command::RollDice { .. }
        )
    }

    pub fn is_server(&self) -> bool {
        !self.is_client()
    }

    /// The player the command is about, if any.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            Command::Join { player, .. }
            | Command::UpdatePlayerStatus { player, .. }
            | Command::DeployUnit { player, .. }
            | Command::MoveUnit { player, .. }
            | Command::WeaponConfiguration { player, .. }
            | Command::WeaponAttackDeclaration { player, .. }
            | Command::TurnEnded { player }
            | Command::RollDice { player }
            | Command::ChangeActivePlayer { player, .. }
            | Command::WeaponAttackResolution { player, .. }
            | Command::DiceRolled { player, .. } => Some(*player),
            Command::ChangePhase { .. }
            | Command::TurnIncremented { .. }
            | Command::HeatUpdated { .. } => None,
        }
    }

    /// Short kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Join { .. } => "Join",
            Command::UpdatePlayerStatus { .. } => "UpdatePlayerStatus",
            Command::DeployUnit { .. } => "DeployUnit",
            Command::MoveUnit { .. } => "MoveUnit",
            Command::WeaponConfiguration { .. } => "WeaponConfiguration",
            Command::WeaponAttackDeclaration { .. } => "WeaponAttackDeclaration",
            Command::TurnEnded { .. } => "TurnEnded",
            Command::RollDice { .. } => "RollDice",
            Command::ChangePhase { .. } => "ChangePhase",
            Command::ChangeActivePlayer { .. } => "ChangeActivePlayer",
            Command::TurnIncremented { .. } => "TurnIncremented",
            Command::HeatUpdated { .. } => "HeatUpdated",
            Command::WeaponAttackResolution { .. } => "WeaponAttackResolution",
            Command::DiceRolled { .. } => "DiceRolled",
        }
    }
}

/// Immutable transport unit: a command stamped with the instance that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: GameId,
    pub timestamp: DateTime<Utc>,
    pub command: Command,
}

impl Envelope {
    pub fn new(origin: GameId, command: Command) -> Self {
        Self {
            origin,
            timestamp: Utc::now(),
            command,
        }
    }
}
