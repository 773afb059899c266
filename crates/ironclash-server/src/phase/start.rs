use ironclash_protocol::{Command, PhaseName, PlayerStatus};
use tracing::info;

use super::{Phase, Transition};
use crate::game::ServerContext;

/// Lobby: collects players until everyone is ready and a battlefield exists.
#[derive(Debug, Default)]
pub struct StartPhase;

impl StartPhase {
    fn ready(ctx: &ServerContext) -> bool {
        let players = ctx.state.players();
        !players.is_empty()
            && players.iter().all(|p| p.status == PlayerStatus::Playing)
            && ctx.state.battle_map().is_some()
    }
}

impl Phase for StartPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Start
    }

    fn handle_command(&mut self, ctx: &mut ServerContext, command: &Command) -> Transition {
        let applied = match command {
            Command::Join {
                player,
                name,
                tint,
                units,
            } => ctx.state.on_player_joined(*player, name, tint, units),
            Command::UpdatePlayerStatus { player, status } => {
                ctx.state.on_player_status_updated(*player, *status)
            }
            _ => false,
        };
        if !applied {
            return Transition::Stay;
        }
        ctx.publish(command.clone());
        self.try_transition(ctx)
    }

    fn try_transition(&mut self, ctx: &mut ServerContext) -> Transition {
        if Self::ready(ctx) {
            info!("all {} players ready", ctx.state.players().len());
            Transition::Next
        } else {
            Transition::Stay
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::test_support::{context, install_map, mech};
    use ironclash_protocol::{PlayerId, UnitId};

    fn join(player: PlayerId) -> Command {
        Command::Join {
            player,
            name: "Kai".into(),
            tint: "#00ff00".into(),
            units: vec![mech(UnitId::new())],
        }
    }

    fn ready(player: PlayerId) -> Command {
        Command::UpdatePlayerStatus {
            player,
            status: PlayerStatus::Playing,
        }
    }

    #[test]
    fn waits_for_map_and_every_player() {
        let (mut ctx, _bus) = context([]);
        let mut phase = StartPhase;
        let (a, b) = (PlayerId::new(), PlayerId::new());

        assert_eq!(phase.handle_command(&mut ctx, &join(a)), Transition::Stay);
        assert_eq!(phase.handle_command(&mut ctx, &join(b)), Transition::Stay);
        assert_eq!(phase.handle_command(&mut ctx, &ready(a)), Transition::Stay);
        assert_eq!(phase.handle_command(&mut ctx, &ready(b)), Transition::Stay);

        install_map(&mut ctx);
        assert_eq!(phase.try_transition(&mut ctx), Transition::Next);
    }

    #[test]
    fn duplicate_join_is_not_rebroadcast() {
        let (mut ctx, bus) = context([]);
        let mut rx = ironclash_core::CommandBus::subscribe(&*bus);
        let mut phase = StartPhase;
        let a = PlayerId::new();

        phase.handle_command(&mut ctx, &join(a));
        phase.handle_command(&mut ctx, &join(a));

        assert_eq!(ctx.state.players().len(), 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn ignores_commands_from_later_phases() {
        let (mut ctx, _bus) = context([]);
        let mut phase = StartPhase;
        let cmd = Command::TurnEnded {
            player: PlayerId::new(),
        };
        assert_eq!(phase.handle_command(&mut ctx, &cmd), Transition::Stay);
    }
}
