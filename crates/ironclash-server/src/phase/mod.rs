//! Phase state machine
//!
//! Each phase reacts to the client commands that are legal while it is current and
//! reports when it is complete. [`PhaseManager`] picks the successor.

mod activation;
mod deployment;
mod end;
mod heat;
mod initiative;
mod manager;
mod physical;
mod resolution;
mod start;

use ironclash_protocol::{Command, PhaseName};

use crate::game::ServerContext;

pub use activation::{MovementPhase, WeaponsAttackPhase};
pub use deployment::DeploymentPhase;
pub use end::EndPhase;
pub use heat::HeatPhase;
pub use initiative::InitiativePhase;
pub use manager::{BattleTechPhaseManager, PhaseManager, PhysicalAttackPhaseManager};
pub use physical::PhysicalAttackPhase;
pub use resolution::WeaponAttackResolutionPhase;
pub use start::StartPhase;

/// Outcome of a phase step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Next,
}

pub trait Phase: Send {
    fn name(&self) -> PhaseName;

    /// Runs after the phase became current and its `ChangePhase` went out.
    fn enter(&mut self, _ctx: &mut ServerContext) -> Transition {
        Transition::Stay
    }

    /// Called for every accepted client command while the phase is current.
    fn handle_command(&mut self, ctx: &mut ServerContext, command: &Command) -> Transition;

    /// Re-evaluates completion after an out-of-band change such as a map being installed.
    fn try_transition(&mut self, _ctx: &mut ServerContext) -> Transition {
        Transition::Stay
    }

    fn exit(&mut self, _ctx: &mut ServerContext) {}
}

/// Builds a fresh phase. `Unknown` starts over.
pub fn create_phase(name: PhaseName) -> Box<dyn Phase> {
    match name {
        PhaseName::Start | PhaseName::Unknown => Box::new(StartPhase),
        PhaseName::Deployment => Box::new(DeploymentPhase),
        PhaseName::Initiative => Box::new(InitiativePhase::default()),
        PhaseName::Movement => Box::new(MovementPhase::default()),
        PhaseName::WeaponsAttack => Box::new(WeaponsAttackPhase::default()),
        PhaseName::WeaponAttackResolution => Box::new(WeaponAttackResolutionPhase),
        PhaseName::PhysicalAttack => Box::new(PhysicalAttackPhase),
        PhaseName::Heat => Box::new(HeatPhase),
        PhaseName::End => Box::new(EndPhase::default()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use ironclash_core::{
        FixedDiceRoller, GameState, HexMap, LocalBus, RangeToHitCalculator, Unit,
    };
    use ironclash_protocol::{
        Direction, GameId, HexCoord, HitLocation, LocationArmor, PlayerId, PlayerStatus,
        Position, UnitData, UnitId, WeaponData,
    };

    use crate::game::ServerContext;

    pub fn medium_laser(slot: u8) -> WeaponData {
        WeaponData {
            name: "Medium Laser".into(),
            location: HitLocation::CenterTorso,
            slot,
            heat: 3,
            damage: 5,
            short_range: 3,
            medium_range: 6,
            long_range: 9,
        }
    }

    pub fn mech(id: UnitId) -> UnitData {
        let armor = [
            HitLocation::Head,
            HitLocation::CenterTorso,
            HitLocation::LeftTorso,
            HitLocation::RightTorso,
            HitLocation::LeftArm,
            HitLocation::RightArm,
            HitLocation::LeftLeg,
            HitLocation::RightLeg,
        ]
        .into_iter()
        .map(|location| LocationArmor {
            location,
            armor: 4,
            structure: 3,
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
            weapons: (0..4).map(medium_laser).collect(),
        }
    }

    pub fn at(q: i32, r: i32) -> Position {
        Position::new(HexCoord::new(q, r), Direction::North)
    }

    /// Context over a local bus with scripted dice.
    pub fn context(rolls: impl IntoIterator<Item = u32>) -> (ServerContext, Arc<LocalBus>) {
        let bus = Arc::new(LocalBus::default());
        let ctx = ServerContext::new(
            GameState::new(GameId::new()),
            bus.clone(),
            Box::new(FixedDiceRoller::new(rolls)),
            Box::new(RangeToHitCalculator::default()),
        );
        (ctx, bus)
    }

    /// Adds a playing player owning one mech per unit id.
    pub fn add_player(ctx: &mut ServerContext, units: &[UnitId]) -> PlayerId {
        let player = PlayerId::new();
        let data: Vec<UnitData> = units.iter().copied().map(mech).collect();
        ctx.state.on_player_joined(player, "pilot", "#ffffff", &data);
        ctx.state.on_player_status_updated(player, PlayerStatus::Playing);
        player
    }

    pub fn install_map(ctx: &mut ServerContext) {
        ctx.state.set_battle_map(Arc::new(HexMap::new(16, 17)));
    }

    pub fn unit<'a>(ctx: &'a ServerContext, id: UnitId) -> &'a Unit {
        ctx.state.unit(id).map(|(_, u)| u).unwrap()
    }
}
