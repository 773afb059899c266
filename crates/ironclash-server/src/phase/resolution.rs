use ironclash_protocol::{
    AttackResolution, Command, HitLocation, PhaseName, PlayerId, UnitId, WeaponTarget,
};
use tracing::{debug, info};

use super::{Phase, Transition};
use crate::game::ServerContext;

/// Rolls every declared weapon attack in initiative order, then moves on.
#[derive(Debug, Default)]
pub struct WeaponAttackResolutionPhase;

impl WeaponAttackResolutionPhase {
    fn declarations(ctx: &ServerContext, player: PlayerId) -> Vec<(UnitId, Vec<WeaponTarget>)> {
        ctx.state
            .player(player)
            .map(|p| {
                p.units
                    .iter()
                    .filter(|u| !u.declared_targets().is_empty())
                    .map(|u| (u.id, u.declared_targets().to_vec()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn resolve(
        ctx: &mut ServerContext,
        attacker: UnitId,
        target: &WeaponTarget,
    ) -> Option<AttackResolution> {
        let (weapon, to_hit) = {
            let (_, shooter) = ctx.state.unit(attacker)?;
            let weapon = shooter.weapon(&target.weapon)?.clone();
            let (_, victim) = ctx.state.unit(target.target)?;
            let to_hit = ctx
                .to_hit
                .to_hit(shooter, &weapon, victim, ctx.state.battle_map());
            (weapon, to_hit)
        };

        let roll = ctx.roll_2d6();
        let hit = to_hit.is_some_and(|needed| roll >= needed);
        let location = hit.then(|| HitLocation::from_front_roll(ctx.roll_2d6()));
        Some(AttackResolution {
            hit,
            to_hit,
            roll,
            location,
            damage: if hit { weapon.damage } else { 0 },
        })
    }
}

impl Phase for WeaponAttackResolutionPhase {
    fn name(&self) -> PhaseName {
        PhaseName::WeaponAttackResolution
    }

    fn enter(&mut self, ctx: &mut ServerContext) -> Transition {
        let mut resolved = 0;
        for player in ctx.initiative_order() {
            for (attacker, targets) in Self::declarations(ctx, player) {
                for target in &targets {
                    let Some(resolution) = Self::resolve(ctx, attacker, target) else {
                        debug!("attack by {} on {} could not be resolved", attacker, target.target);
                        continue;
                    };
                    ctx.state.on_weapons_attack_resolution(
                        player,
                        attacker,
                        target.target,
                        &resolution,
                    );
                    ctx.publish(Command::WeaponAttackResolution {
                        player,
                        attacker,
                        target: target.target,
                        weapon: target.weapon.clone(),
                        resolution,
                    });
                    resolved += 1;
                }
            }
        }
        info!("resolved {} weapon attacks", resolved);
        Transition::Next
    }

    fn handle_command(&mut self, _ctx: &mut ServerContext, _command: &Command) -> Transition {
        Transition::Stay
    }
}
