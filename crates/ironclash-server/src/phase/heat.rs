use ironclash_protocol::{Command, PhaseName};
use tracing::debug;

use super::{Phase, Transition};
use crate::game::ServerContext;

/// Books this turn's heat for every surviving unit.
#[derive(Debug, Default)]
pub struct HeatPhase;

impl Phase for HeatPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Heat
    }

    fn enter(&mut self, ctx: &mut ServerContext) -> Transition {
        let updates: Vec<_> = ctx
            .state
            .players()
            .iter()
            .flat_map(|p| p.alive_units())
            .map(|u| (u.id, u.heat_data(), u.heat()))
            .collect();

        for (unit, heat, previous_heat) in updates {
            ctx.state.on_heat_update(unit, &heat, previous_heat);
            debug!(
                "unit {} heat {} -> {}",
                unit,
                previous_heat,
                heat.resulting_heat(previous_heat)
            );
            ctx.publish(Command::HeatUpdated {
                unit,
                heat,
                previous_heat,
            });
        }
        Transition::Next
    }

    fn handle_command(&mut self, _ctx: &mut ServerContext, _command: &Command) -> Transition {
        Transition::Stay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::test_support::{add_player, at, context, unit};
    use ironclash_core::CommandBus;
    use ironclash_protocol::{HeatData, MovementType, PathSegment, UnitId, WeaponTarget};

    #[test]
    fn running_and_firing_builds_heat_above_sinks() {
        let (mut ctx, _bus) = context([]);
        let mut rx = ctx.bus.subscribe();
        let u = UnitId::new();
        let p = add_player(&mut ctx, &[u]);
        ctx.state.on_deploy_unit(p, u, at(1, 1));
        ctx.state.on_move_unit(
            p,
            u,
            MovementType::Run,
            &[PathSegment {
                from: at(1, 1),
                to: at(1, 2),
                cost: 1,
            }],
        );
        let target = UnitId::new();
        let shots: Vec<WeaponTarget> = unit(&ctx, u)
            .weapons()
            .iter()
            .map(|w| WeaponTarget {
                weapon: w.reference(),
                target,
                is_primary: true,
            })
            .collect();
        // four lasers: 12 heat, plus 2 for running, against 10 sinks
        ctx.state.on_weapons_attack(p, u, &shots);

        assert_eq!(HeatPhase.enter(&mut ctx), Transition::Next);
        assert_eq!(unit(&ctx, u).heat(), 4);

        let expected = Command::HeatUpdated {
            unit: u,
            heat: HeatData {
                movement_heat: 2,
                weapon_heat: 12,
                dissipation: 10,
            },
            previous_heat: 0,
        };
        assert_eq!(rx.try_recv().unwrap().command, expected);
    }

    #[test]
    fn idle_unit_stays_cold() {
        let (mut ctx, _bus) = context([]);
        let u = UnitId::new();
        add_player(&mut ctx, &[u]);
        HeatPhase.enter(&mut ctx);
        assert_eq!(unit(&ctx, u).heat(), 0);
    }
}
