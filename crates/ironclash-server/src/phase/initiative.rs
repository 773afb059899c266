use std::collections::VecDeque;

use ironclash_core::{InitiativeOrder, Round};
use ironclash_protocol::{Command, PhaseName, PlayerId};
use tracing::{debug, info};

use super::{Phase, Transition};
use crate::game::ServerContext;

/// Each player asks for a 2d6 roll in turn; tied players roll again until the order
/// is strict.
#[derive(Debug)]
pub struct InitiativePhase {
    order: InitiativeOrder,
    round: Round,
    pending: VecDeque<PlayerId>,
}

impl Default for InitiativePhase {
    fn default() -> Self {
        Self {
            order: InitiativeOrder::new(),
            round: Round::FIRST,
            pending: VecDeque::new(),
        }
    }
}

impl InitiativePhase {
    fn activate_pending(&self, ctx: &mut ServerContext) -> Transition {
        match self.pending.front() {
            Some(&player) => {
                ctx.set_active_player(Some(player), 0);
                Transition::Stay
            }
            None => Transition::Next,
        }
    }

    fn finish_round(&mut self, ctx: &mut ServerContext) -> Transition {
        let tied = self.order.tied_players(self.round);
        if !tied.is_empty() {
            self.round = self.order.start_new_roll();
            debug!("{} players tied, re-roll round {}", tied.len(), self.round.get());
            self.pending = tied.into();
            return self.activate_pending(ctx);
        }
        let ordered = self.order.ordered_players();
        info!("initiative decided for {} players", ordered.len());
        ctx.set_initiative_order(ordered);
        Transition::Next
    }
}

impl Phase for InitiativePhase {
    fn name(&self) -> PhaseName {
        PhaseName::Initiative
    }

    fn enter(&mut self, ctx: &mut ServerContext) -> Transition {
        self.order.clear();
        self.round = Round::FIRST;
        self.pending = ctx
            .state
            .players()
            .iter()
            .filter(|p| p.alive_units().next().is_some())
            .map(|p| p.id)
            .collect();
        if self.pending.is_empty() {
            ctx.set_initiative_order(Vec::new());
            return Transition::Next;
        }
        self.activate_pending(ctx)
    }

    fn handle_command(&mut self, ctx: &mut ServerContext, command: &Command) -> Transition {
        let Command::RollDice { player } = command else {
            return Transition::Stay;
        };
        if self.pending.front() != Some(player) {
            debug!("roll from {} out of turn ignored", player);
            return Transition::Stay;
        }
        self.pending.pop_front();

        let roll = ctx.roll_2d6();
        self.order.add_result(*player, self.round, roll);
        ctx.publish(Command::DiceRolled {
            player: *player,
            roll,
        });

        if self.pending.is_empty() {
            self.finish_round(ctx)
        } else {
            self.activate_pending(ctx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::test_support::{add_player, context};
    use ironclash_core::CommandBus;
    use ironclash_protocol::UnitId;

    fn roll(player: PlayerId) -> Command {
        Command::RollDice { player }
    }

    #[test]
    fn highest_roll_wins() {
        let (mut ctx, _bus) = context([5, 9]);
        let a = add_player(&mut ctx, &[UnitId::new()]);
        let b = add_player(&mut ctx, &[UnitId::new()]);
        let mut phase = InitiativePhase::default();

        assert_eq!(phase.enter(&mut ctx), Transition::Stay);
        assert_eq!(ctx.state.active_player(), Some(a));
        assert_eq!(phase.handle_command(&mut ctx, &roll(a)), Transition::Stay);
        assert_eq!(ctx.state.active_player(), Some(b));
        assert_eq!(phase.handle_command(&mut ctx, &roll(b)), Transition::Next);
        assert_eq!(ctx.initiative_order(), vec![b, a]);
    }

    #[test]
    fn ties_are_rerolled_by_the_tied_players_only() {
        // a=7, b=7, c=6, then a=8, b=6
        let (mut ctx, bus) = context([7, 7, 6, 8, 6]);
        let mut rx = bus.subscribe();
        let a = add_player(&mut ctx, &[UnitId::new()]);
        let b = add_player(&mut ctx, &[UnitId::new()]);
        let c = add_player(&mut ctx, &[UnitId::new()]);
        let mut phase = InitiativePhase::default();
        phase.enter(&mut ctx);

        phase.handle_command(&mut ctx, &roll(a));
        phase.handle_command(&mut ctx, &roll(b));
        assert_eq!(phase.handle_command(&mut ctx, &roll(c)), Transition::Stay);
        assert_eq!(ctx.state.active_player(), Some(a));

        // c already placed; its request is out of turn now
        assert_eq!(phase.handle_command(&mut ctx, &roll(c)), Transition::Stay);
        phase.handle_command(&mut ctx, &roll(a));
        assert_eq!(phase.handle_command(&mut ctx, &roll(b)), Transition::Next);
        assert_eq!(ctx.initiative_order(), vec![a, b, c]);

        let rolls: Vec<u32> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|env| match env.command {
                Command::DiceRolled { roll, .. } => Some(roll),
                _ => None,
            })
            .collect();
        assert_eq!(rolls, vec![7, 7, 6, 8, 6]);
    }

    #[test]
    fn out_of_turn_roll_is_ignored() {
        let (mut ctx, _bus) = context([4, 4]);
        let _a = add_player(&mut ctx, &[UnitId::new()]);
        let b = add_player(&mut ctx, &[UnitId::new()]);
        let mut phase = InitiativePhase::default();
        phase.enter(&mut ctx);

        assert_eq!(phase.handle_command(&mut ctx, &roll(b)), Transition::Stay);
        assert!(phase.order.is_empty());
    }

    #[test]
    fn no_units_left_skips_the_contest() {
        let (mut ctx, _bus) = context([]);
        add_player(&mut ctx, &[]);
        let mut phase = InitiativePhase::default();
        assert_eq!(phase.enter(&mut ctx), Transition::Next);
    }
}
