use std::collections::HashSet;

use ironclash_protocol::{Command, PhaseName, PlayerId};
use tracing::{debug, info};

use super::{Phase, Transition};
use crate::game::ServerContext;

/// Waits for every player to end the turn, then advances the turn counter.
#[derive(Debug, Default)]
pub struct EndPhase {
    ended: HashSet<PlayerId>,
}

impl EndPhase {
    fn next_pending(&self, ctx: &ServerContext) -> Option<PlayerId> {
        ctx.state
            .players()
            .iter()
            .map(|p| p.id)
            .find(|id| !self.ended.contains(id))
    }
}

impl Phase for EndPhase {
    fn name(&self) -> PhaseName {
        PhaseName::End
    }

    fn enter(&mut self, ctx: &mut ServerContext) -> Transition {
        self.ended.clear();
        let first = self.next_pending(ctx);
        ctx.set_active_player(first, 0);
        Transition::Stay
    }

    fn handle_command(&mut self, ctx: &mut ServerContext, command: &Command) -> Transition {
        let Command::TurnEnded { player } = command else {
            return Transition::Stay;
        };
        if ctx.state.player(*player).is_none() || !self.ended.insert(*player) {
            debug!("turn end from {} ignored", player);
            return Transition::Stay;
        }
        ctx.state.on_turn_ended(*player);
        ctx.publish(command.clone());

        match self.next_pending(ctx) {
            Some(next) => {
                ctx.set_active_player(Some(next), 0);
                Transition::Stay
            }
            None => {
                let turn = ctx.increment_turn();
                info!("turn {} begins", turn);
                Transition::Next
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::test_support::{add_player, context};
    use ironclash_protocol::UnitId;

    fn ended(player: PlayerId) -> Command {
        Command::TurnEnded { player }
    }

    #[test]
    fn turn_advances_once_everyone_ended() {
        let (mut ctx, _bus) = context([]);
        let a = add_player(&mut ctx, &[UnitId::new()]);
        let b = add_player(&mut ctx, &[UnitId::new()]);
        ctx.set_initiative_order(vec![b, a]);
        let mut phase = EndPhase::default();

        assert_eq!(phase.enter(&mut ctx), Transition::Stay);
        assert_eq!(ctx.state.active_player(), Some(a));

        assert_eq!(phase.handle_command(&mut ctx, &ended(a)), Transition::Stay);
        // duplicate does not count twice
        assert_eq!(phase.handle_command(&mut ctx, &ended(a)), Transition::Stay);
        assert_eq!(ctx.state.turn(), 1);
        assert_eq!(ctx.state.active_player(), Some(b));

        assert_eq!(phase.handle_command(&mut ctx, &ended(b)), Transition::Next);
        assert_eq!(ctx.state.turn(), 2);
        // initiative is re-rolled every turn
        assert_eq!(ctx.initiative_order(), vec![a, b]);
    }

    #[test]
    fn unknown_player_is_ignored() {
        let (mut ctx, _bus) = context([]);
        add_player(&mut ctx, &[UnitId::new()]);
        let mut phase = EndPhase::default();
        phase.enter(&mut ctx);
        assert_eq!(
            phase.handle_command(&mut ctx, &ended(PlayerId::new())),
            Transition::Stay
        );
        assert_eq!(ctx.state.turn(), 1);
    }
}
