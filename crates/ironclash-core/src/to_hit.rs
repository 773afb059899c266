use ironclash_protocol::{MovementType, WeaponData};

use crate::{BattleMap, Unit};

/// Target number on 2d6 for one weapon shot; `None` when the shot cannot succeed.
pub trait ToHitCalculator: Send {
    fn to_hit(
        &self,
        attacker: &Unit,
        weapon: &WeaponData,
        target: &Unit,
        map: Option<&dyn BattleMap>,
    ) -> Option<u32>;
}

/// Gunnery skill plus movement and range modifiers.
#[derive(Clone, Copy, Debug)]
pub struct RangeToHitCalculator {
    pub gunnery: u32,
}

impl Default for RangeToHitCalculator {
    fn default() -> Self {
        Self { gunnery: 4 }
    }
}

impl RangeToHitCalculator {
    fn target_movement_modifier(target: &Unit) -> u32 {
        let base = match target.hexes_moved() {
            0..=2 => 0,
            3..=4 => 1,
            5..=6 => 2,
            7..=9 => 3,
            _ => 4,
        };
        if target.movement() == Some(MovementType::Jump) {
            base + 1
        } else {
            base
        }
    }

    fn range_modifier(weapon: &WeaponData, distance: u32) -> Option<u32> {
        match distance {
            0 => None,
            d if d <= weapon.short_range => Some(0),
            d if d <= weapon.medium_range => Some(2),
            d if d <= weapon.long_range => Some(4),
            _ => None,
        }
    }
}

impl ToHitCalculator for RangeToHitCalculator {
    fn to_hit(
        &self,
        attacker: &Unit,
        weapon: &WeaponData,
        target: &Unit,
        map: Option<&dyn BattleMap>,
    ) -> Option<u32> {
        if target.is_destroyed() {
            return None;
        }
        let from = attacker.position()?.coord;
        let to = target.position()?.coord;
        let distance = map.map_or_else(|| from.distance(to), |m| m.distance(from, to));

        let total = self.gunnery
            + attacker.movement().map_or(0, |m| m.attacker_modifier())
            + Self::target_movement_modifier(target)
            + Self::range_modifier(weapon, distance)?;
        (total <= 12).then_some(total)
    }
}
