use ironclash_protocol::{Command, PhaseName, PlayerId};
use tracing::{debug, info};

use super::{Phase, Transition};
use crate::game::ServerContext;

/// Players take turns placing one undeployed unit each until everything is on the map.
#[derive(Debug, Default)]
pub struct DeploymentPhase;

impl DeploymentPhase {
    /// Next player after `after` (in join order, wrapping) that still has units to place.
    fn next_deployer(ctx: &ServerContext, after: Option<PlayerId>) -> Option<PlayerId> {
        let players = ctx.state.players();
        let start = after
            .and_then(|id| players.iter().position(|p| p.id == id))
            .map_or(0, |idx| idx + 1);
        (0..players.len())
            .map(|offset| &players[(start + offset) % players.len()])
            .find(|p| p.alive_units().any(|u| !u.is_deployed()))
            .map(|p| p.id)
    }

    fn activate_next(ctx: &mut ServerContext, after: Option<PlayerId>) -> Transition {
        match Self::next_deployer(ctx, after) {
            Some(player) => {
                ctx.set_active_player(Some(player), 1);
                Transition::Stay
            }
            None => {
                info!("deployment complete");
                Transition::Next
            }
        }
    }
}

impl Phase for DeploymentPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Deployment
    }

    fn enter(&mut self, ctx: &mut ServerContext) -> Transition {
        Self::activate_next(ctx, None)
    }

    fn handle_command(&mut self, ctx: &mut ServerContext, command: &Command) -> Transition {
        let Command::DeployUnit {
            player,
            unit,
            position,
        } = command
        else {
            return Transition::Stay;
        };
        if ctx.state.active_player() != Some(*player) {
            debug!("deploy from inactive player {} ignored", player);
            return Transition::Stay;
        }
        if let Some(map) = ctx.state.battle_map() {
            if !map.contains(position.coord) {
                debug!("deploy of {} outside the map ignored", unit);
                return Transition::Stay;
            }
        }
        if !ctx.state.on_deploy_unit(*player, *unit, *position) {
            return Transition::Stay;
        }
        ctx.publish(command.clone());
        Self::activate_next(ctx, Some(*player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::test_support::{add_player, at, context, install_map, unit};
    use ironclash_protocol::UnitId;

    fn deploy(player: PlayerId, unit: UnitId, q: i32, r: i32) -> Command {
        Command::DeployUnit {
            player,
            unit,
            position: at(q, r),
        }
    }

    #[test]
    fn players_alternate_single_deployments() {
        let (mut ctx, _bus) = context([]);
        install_map(&mut ctx);
        let (u1, u2, u3) = (UnitId::new(), UnitId::new(), UnitId::new());
        let a = add_player(&mut ctx, &[u1, u2]);
        let b = add_player(&mut ctx, &[u3]);
        let mut phase = DeploymentPhase;

        assert_eq!(phase.enter(&mut ctx), Transition::Stay);
        assert_eq!(ctx.state.active_player(), Some(a));
        assert_eq!(ctx.state.units_to_play(), 1);

        assert_eq!(
            phase.handle_command(&mut ctx, &deploy(a, u1, 1, 1)),
            Transition::Stay
        );
        assert_eq!(ctx.state.active_player(), Some(b));

        assert_eq!(
            phase.handle_command(&mut ctx, &deploy(b, u3, 5, 5)),
            Transition::Stay
        );
        assert_eq!(ctx.state.active_player(), Some(a));

        assert_eq!(
            phase.handle_command(&mut ctx, &deploy(a, u2, 2, 1)),
            Transition::Next
        );
        assert!(unit(&ctx, u2).is_deployed());
    }

    #[test]
    fn rejects_inactive_player_and_off_map_positions() {
        let (mut ctx, _bus) = context([]);
        install_map(&mut ctx);
        let (u1, u2) = (UnitId::new(), UnitId::new());
        let a = add_player(&mut ctx, &[u1]);
        let b = add_player(&mut ctx, &[u2]);
        let mut phase = DeploymentPhase;
        phase.enter(&mut ctx);

        phase.handle_command(&mut ctx, &deploy(b, u2, 1, 1));
        assert!(!unit(&ctx, u2).is_deployed());

        phase.handle_command(&mut ctx, &deploy(a, u1, 40, 40));
        assert!(!unit(&ctx, u1).is_deployed());
        assert_eq!(ctx.state.active_player(), Some(a));
    }

    #[test]
    fn second_deploy_of_same_unit_is_ignored() {
        let (mut ctx, _bus) = context([]);
        install_map(&mut ctx);
        let (u1, u2) = (UnitId::new(), UnitId::new());
        let a = add_player(&mut ctx, &[u1, u2]);
        let mut phase = DeploymentPhase;
        phase.enter(&mut ctx);

        phase.handle_command(&mut ctx, &deploy(a, u1, 1, 1));
        assert_eq!(
            phase.handle_command(&mut ctx, &deploy(a, u1, 3, 3)),
            Transition::Stay
        );
        assert_eq!(unit(&ctx, u1).position(), Some(at(1, 1)));
        assert!(!unit(&ctx, u2).is_deployed());
    }
}
