use serde::{Deserialize, Serialize};

use crate::{Direction, Position, UnitId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerStatus {
    #[default]
    Joining,
    Playing,
}

/// Stage of a turn. `Unknown` absorbs names this build does not recognize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseName {
    #[default]
    Start,
    Deployment,
    Initiative,
    Movement,
    WeaponsAttack,
    WeaponAttackResolution,
    PhysicalAttack,
    Heat,
    End,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    StandingStill,
    Walk,
    Run,
    Jump,
}

impl MovementType {
    /// Heat generated for the movement mode; jumping costs at least 3.
    pub fn heat(self, hexes_moved: u32) -> u32 {
        match self {
            MovementType::StandingStill => 0,
            MovementType::Walk => 1,
            MovementType::Run => 2,
            MovementType::Jump => hexes_moved.max(3),
        }
    }

    /// Attacker to-hit modifier for having moved this way.
    pub fn attacker_modifier(self) -> u32 {
        match self {
            MovementType::StandingStill => 0,
            MovementType::Walk => 1,
            MovementType::Run => 2,
            MovementType::Jump => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub from: Position,
    pub to: Position,
    pub cost: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HitLocation {
    Head,
    CenterTorso,
    LeftTorso,
    RightTorso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl HitLocation {
    /// Front hit-location table, indexed by a 2d6 roll.
    pub fn from_front_roll(roll: u32) -> HitLocation {
        match roll {
            3 | 4 => HitLocation::RightArm,
            5 => HitLocation::RightLeg,
            6 => HitLocation::RightTorso,
            8 => HitLocation::LeftTorso,
            9 => HitLocation::LeftLeg,
            10 | 11 => HitLocation::LeftArm,
            12 => HitLocation::Head,
            _ => HitLocation::CenterTorso,
        }
    }

    /// Losing all internal structure here destroys the unit.
    pub fn is_vital(self) -> bool {
        matches!(self, HitLocation::Head | HitLocation::CenterTorso)
    }
}

/// Identifies a mounted weapon by its mount point.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponRef {
    pub name: String,
    pub location: HitLocation,
    pub slot: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponTarget {
    pub weapon: WeaponRef,
    pub target: UnitId,
    pub is_primary: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum WeaponConfig {
    TorsoRotation(Direction),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponData {
    pub name: String,
    pub location: HitLocation,
    pub slot: u8,
    pub heat: u32,
    pub damage: u32,
    pub short_range: u32,
    pub medium_range: u32,
    pub long_range: u32,
}

impl WeaponData {
    pub fn reference(&self) -> WeaponRef {
        WeaponRef {
            name: self.name.clone(),
            location: self.location,
            slot: self.slot,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationArmor {
    pub location: HitLocation,
    pub armor: u32,
    pub structure: u32,
}

/// Everything needed to field a unit; carried by the join command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    pub id: UnitId,
    pub chassis: String,
    pub model: String,
    pub walk_mp: u32,
    #[serde(default)]
    pub jump_mp: u32,
    pub heat_sinks: u32,
    pub armor: Vec<LocationArmor>,
    pub weapons: Vec<WeaponData>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatData {
    pub movement_heat: u32,
    pub weapon_heat: u32,
    pub dissipation: u32,
}

impl HeatData {
    /// Heat level after applying this breakdown to `previous`.
    pub fn resulting_heat(&self, previous: u32) -> u32 {
        (previous + self.movement_heat + self.weapon_heat).saturating_sub(self.dissipation)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResolution {
    pub hit: bool,
    /// `None` when the shot was impossible (out of range).
    pub to_hit: Option<u32>,
    pub roll: u32,
    pub location: Option<HitLocation>,
    pub damage: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_phase_names_decode_to_sentinel() {
        let phase: PhaseName = serde_json::from_str("\"Skirmish\"").unwrap();
        assert_eq!(phase, PhaseName::Unknown);
        let phase: PhaseName = serde_json::from_str("\"Heat\"").unwrap();
        assert_eq!(phase, PhaseName::Heat);
    }

    #[test]
    fn front_table_covers_every_roll() {
        assert_eq!(HitLocation::from_front_roll(2), HitLocation::CenterTorso);
        assert_eq!(HitLocation::from_front_roll(7), HitLocation::CenterTorso);
        assert_eq!(HitLocation::from_front_roll(12), HitLocation::Head);
        assert_eq!(HitLocation::from_front_roll(4), HitLocation::RightArm);
        assert_eq!(HitLocation::from_front_roll(11), HitLocation::LeftArm);
    }

    #[test]
    fn heat_never_goes_negative() {
        let data = HeatData {
            movement_heat: 1,
            weapon_heat: 3,
            dissipation: 10,
        };
        assert_eq!(data.resulting_heat(2), 0);
        assert_eq!(data.resulting_heat(9), 3);
    }

    #[test]
    fn jump_heat_has_a_floor() {
        assert_eq!(MovementType::Jump.heat(1), 3);
        assert_eq!(MovementType::Jump.heat(5), 5);
        assert_eq!(MovementType::Run.heat(8), 2);
    }
}
