use ironclash_protocol::PhaseName;

use super::{create_phase, Phase};

/// Chooses the phase that follows the current one.
pub trait PhaseManager: Send + Sync {
    fn next_phase_name(&self, current: PhaseName) -> PhaseName;

    fn next_phase(&self, current: PhaseName) -> Box<dyn Phase> {
        create_phase(self.next_phase_name(current))
    }
}

/// Standard turn: no physical attacks.
#[derive(Clone, Copy, Debug, Default)]
pub struct BattleTechPhaseManager;

impl PhaseManager for BattleTechPhaseManager {
    fn next_phase_name(&self, current: PhaseName) -> PhaseName {
        match current {
            PhaseName::Start => PhaseName::Deployment,
            PhaseName::Deployment => PhaseName::Initiative,
            PhaseName::Initiative => PhaseName::Movement,
            PhaseName::Movement => PhaseName::WeaponsAttack,
            PhaseName::WeaponsAttack => PhaseName::WeaponAttackResolution,
            PhaseName::WeaponAttackResolution | PhaseName::PhysicalAttack => PhaseName::Heat,
            PhaseName::Heat => PhaseName::End,
            PhaseName::End => PhaseName::Initiative,
            PhaseName::Unknown => PhaseName::Start,
        }
    }
}

/// Standard turn with a physical attack phase after weapon resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct PhysicalAttackPhaseManager;

impl PhaseManager for PhysicalAttackPhaseManager {
    fn next_phase_name(&self, current: PhaseName) -> PhaseName {
        match current {
            PhaseName::WeaponAttackResolution => PhaseName::PhysicalAttack,
            other => BattleTechPhaseManager.next_phase_name(other),
        }
    }
}
