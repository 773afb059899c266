use ironclash_protocol::{
    Direction, HeatData, HitLocation, LocationArmor, MovementType, PathSegment, Position,
    UnitData, UnitId, WeaponData, WeaponRef, WeaponTarget,
};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("unit already deployed")]
    AlreadyDeployed,
    #[error("unit not deployed")]
    NotDeployed,
    #[error("unit destroyed")]
    Destroyed,
    #[error("unit already moved this turn")]
    AlreadyMoved,
    #[error("movement needs {required} MP, {available} available")]
    InsufficientMovement { required: u32, available: u32 },
    #[error("torso cannot twist to {0:?}")]
    InvalidTorsoRotation(Direction),
    #[error("weapon attacks already declared this turn")]
    AlreadyDeclared,
    #[error("no weapon {0:?} mounted")]
    UnknownWeapon(WeaponRef),
    #[error("weapon {0:?} declared more than once")]
    DuplicateWeapon(WeaponRef),
}

/// A fielded unit and its per-turn state.
#[derive(Clone, Debug)]
pub struct Unit {
    pub id: UnitId,
    pub chassis: String,
    pub model: String,
    pub walk_mp: u32,
    pub jump_mp: u32,
    pub heat_sinks: u32,
    locations: Vec<LocationArmor>,
    weapons: Vec<WeaponData>,
    position: Option<Position>,
    torso_facing: Option<Direction>,
    movement: Option<MovementType>,
    hexes_moved: u32,
    declared: Option<Vec<WeaponTarget>>,
    heat: u32,
    destroyed: bool,
}

impl Unit {
    pub fn from_data(data: &UnitData) -> Self {
        Self {
            id: data.id,
            chassis: data.chassis.clone(),
            model: data.model.clone(),
            walk_mp: data.walk_mp,
            jump_mp: data.jump_mp,
            heat_sinks: data.heat_sinks,
            locations: data.armor.clone(),
            weapons: data.weapons.clone(),
            position: None,
            torso_facing: None,
            movement: None,
            hexes_moved: 0,
            declared: None,
            heat: 0,
            destroyed: false,
        }
    }

    pub fn run_mp(&self) -> u32 {
        (self.walk_mp * 3).div_ceil(2)
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn is_deployed(&self) -> bool {
        self.position.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn has_moved(&self) -> bool {
        self.movement.is_some()
    }

    pub fn movement(&self) -> Option<MovementType> {
        self.movement
    }

    pub fn hexes_moved(&self) -> u32 {
        self.hexes_moved
    }

    pub fn torso_facing(&self) -> Option<Direction> {
        self.torso_facing.or(self.position.map(|p| p.facing))
    }

    pub fn has_declared_attacks(&self) -> bool {
        self.declared.is_some()
    }

    pub fn declared_targets(&self) -> &[WeaponTarget] {
        self.declared.as_deref().unwrap_or(&[])
    }

    pub fn heat(&self) -> u32 {
        self.heat
    }

    pub fn weapons(&self) -> &[WeaponData] {
        &self.weapons
    }

    pub fn weapon(&self, reference: &WeaponRef) -> Option<&WeaponData> {
        self.weapons.iter().find(|w| {
            w.name == reference.name && w.location == reference.location && w.slot == reference.slot
        })
    }

    pub fn armor(&self, location: HitLocation) -> Option<LocationArmor> {
        self.locations.iter().find(|l| l.location == location).copied()
    }

    pub fn deploy(&mut self, position: Position) -> Result<(), UnitError> {
        if self.position.is_some() {
            return Err(UnitError::AlreadyDeployed);
        }
        self.position = Some(position);
        Ok(())
    }

    pub fn move_along(
        &mut self,
        movement: MovementType,
        path: &[PathSegment],
    ) -> Result<(), UnitError> {
        if self.destroyed {
            return Err(UnitError::Destroyed);
        }
        let Some(start) = self.position else {
            return Err(UnitError::NotDeployed);
        };
        if self.movement.is_some() {
            return Err(UnitError::AlreadyMoved);
        }

        let available = match movement {
            MovementType::StandingStill => 0,
            MovementType::Walk => self.walk_mp,
            MovementType::Run => self.run_mp(),
            MovementType::Jump => self.jump_mp,
        };
        let required = path
            .iter()
            .try_fold(0u32, |total, s| total.checked_add(s.cost))
            .unwrap_or(u32::MAX);
        if required > available {
            return Err(UnitError::InsufficientMovement {
                required,
                available,
            });
        }

        self.hexes_moved = path
            .iter()
            .filter(|s| s.from.coord != s.to.coord)
            .count() as u32;
        self.position = Some(path.last().map_or(start, |s| s.to));
        self.torso_facing = None;
        self.movement = Some(movement);
        Ok(())
    }

    /// Twists the torso at most one hexside away from the leg facing.
    pub fn rotate_torso(&mut self, direction: Direction) -> Result<(), UnitError> {
        let Some(position) = self.position else {
            return Err(UnitError::NotDeployed);
        };
        if position.facing.turns_to(direction) > 1 {
            return Err(UnitError::InvalidTorsoRotation(direction));
        }
        self.torso_facing = Some(direction);
        Ok(())
    }

    pub fn declare_weapon_attack(&mut self, targets: Vec<WeaponTarget>) -> Result<(), UnitError> {
        if self.destroyed {
            return Err(UnitError::Destroyed);
        }
        if self.position.is_none() {
            return Err(UnitError::NotDeployed);
        }
        if self.declared.is_some() {
            return Err(UnitError::AlreadyDeclared);
        }
        if let Some(missing) = targets.iter().find(|t| self.weapon(&t.weapon).is_none()) {
            return Err(UnitError::UnknownWeapon(missing.weapon.clone()));
        }
        for (i, t) in targets.iter().enumerate() {
            if targets[..i].iter().any(|earlier| earlier.weapon == t.weapon) {
                return Err(UnitError::DuplicateWeapon(t.weapon.clone()));
            }
        }
        self.declared = Some(targets);
        Ok(())
    }

    /// Armor absorbs damage first, the remainder goes to internal structure.
    pub fn apply_damage(&mut self, location: HitLocation, amount: u32) {
        let Some(slot) = self.locations.iter_mut().find(|l| l.location == location) else {
            if location != HitLocation::CenterTorso {
                self.apply_damage(HitLocation::CenterTorso, amount);
            }
            return;
        };
        let to_armor = amount.min(slot.armor);
        slot.armor -= to_armor;
        let to_structure = (amount - to_armor).min(slot.structure);
        slot.structure -= to_structure;

        if slot.structure == 0 && location.is_vital() {
            self.destroyed = true;
        }
    }

    /// Heat generated this turn by movement and declared weapons.
    pub fn heat_data(&self) -> HeatData {
        let movement_heat = self
            .movement
            .map_or(0, |m| m.heat(self.hexes_moved));
        let weapon_heat = self
            .declared_targets()
            .iter()
            .filter_map(|t| self.weapon(&t.weapon))
            .map(|w| w.heat)
            .sum();
        HeatData {
            movement_heat,
            weapon_heat,
            dissipation: self.heat_sinks,
        }
    }

    /// Sets heat from a breakdown and the level it was computed against.
    pub fn apply_heat(&mut self, data: &HeatData, previous: u32) {
        self.heat = data.resulting_heat(previous);
    }

    pub fn reset_turn_state(&mut self) {
        self.movement = None;
        self.hexes_moved = 0;
        self.torso_facing = None;
        self.declared = None;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn medium_laser(location: HitLocation, slot: u8) -> WeaponData {
        WeaponData {
            name: "Medium Laser".into(),
            location,
            slot,
            heat: 3,
            damage: 5,
            short_range: 3,
            medium_range: 6,
            long_range: 9,
        }
    }

    pub fn locust(id: UnitId) -> UnitData {
        let armor = [
            (HitLocation::Head, 8, 3),
            (HitLocation::CenterTorso, 10, 8),
            (HitLocation::LeftTorso, 8, 6),
            (HitLocation::RightTorso, 8, 6),
            (HitLocation::LeftArm, 4, 4),
            (HitLocation::RightArm, 4, 4),
            (HitLocation::LeftLeg, 8, 6),
            (HitLocation::RightLeg, 8, 6),
        ]
        .into_iter()
        .map(|(location, armor, structure)| LocationArmor {
            location,
            armor,
            structure,
        })
        .collect();
        UnitData {
            id,
            chassis: "Locust".into(),
            model: "LCT-1V".into(),
            walk_mp: 8,
            jump_mp: 0,
            heat_sinks: 10,
            armor,
            weapons: vec![medium_laser(HitLocation::CenterTorso, 1)],
        }
    }
}
