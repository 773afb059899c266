//! Alternating unit activation shared by the movement and weapons-attack phases.

use ironclash_core::TurnOrder;
use ironclash_protocol::{Command, PhaseName, PlayerId};
use tracing::debug;

use super::{Phase, Transition};
use crate::game::ServerContext;

/// Activation bookkeeping: the precomputed steps and the player currently acting.
#[derive(Debug, Default)]
struct Activation {
    order: TurnOrder,
}

impl Activation {
    fn start(&mut self, ctx: &mut ServerContext) -> Transition {
        self.order = TurnOrder::calculate(&ctx.initiative_order(), &ctx.state.alive_unit_counts());
        debug!("{} activation steps", self.order.steps().len());
        self.advance(ctx)
    }

    fn advance(&mut self, ctx: &mut ServerContext) -> Transition {
        match self.order.next_step() {
            Some(step) => {
                ctx.set_active_player(Some(step.player), step.units);
                Transition::Stay
            }
            None => Transition::Next,
        }
    }

    fn is_active(ctx: &ServerContext, player: PlayerId) -> bool {
        ctx.state.active_player() == Some(player) && ctx.state.units_to_play() > 0
    }

    /// One unit of the current step has acted.
    fn unit_done(&mut self, ctx: &mut ServerContext, player: PlayerId) -> Transition {
        let left = ctx.state.units_to_play().saturating_sub(1);
        if left > 0 {
            ctx.set_active_player(Some(player), left);
            Transition::Stay
        } else {
            self.advance(ctx)
        }
    }
}

#[derive(Debug, Default)]
pub struct MovementPhase {
    activation: Activation,
}

impl Phase for MovementPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Movement
    }

    fn enter(&mut self, ctx: &mut ServerContext) -> Transition {
        self.activation.start(ctx)
    }

    fn handle_command(&mut self, ctx: &mut ServerContext, command: &Command) -> Transition {
        let Command::MoveUnit {
            player,
            unit,
            movement,
            path,
        } = command
        else {
            return Transition::Stay;
        };
        if !Activation::is_active(ctx, *player) {
            debug!("move from inactive player {} ignored", player);
            return Transition::Stay;
        }
        if !ctx.state.on_move_unit(*player, *unit, *movement, path) {
            return Transition::Stay;
        }
        ctx.publish(command.clone());
        self.activation.unit_done(ctx, *player)
    }
}

#[derive(Debug, Default)]
pub struct WeaponsAttackPhase {
    activation: Activation,
}

impl Phase for WeaponsAttackPhase {
    fn name(&self) -> PhaseName {
        PhaseName::WeaponsAttack
    }

    fn enter(&mut self, ctx: &mut ServerContext) -> Transition {
        self.activation.start(ctx)
    }

    fn handle_command(&mut self, ctx: &mut ServerContext, command: &Command) -> Transition {
        match command {
            // Torso twists are free and never end an activation.
            Command::WeaponConfiguration {
                player,
                unit,
                config,
            } => {
                if Activation::is_active(ctx, *player)
                    && ctx.state.on_weapon_configuration(*player, *unit, *config)
                {
                    ctx.publish(command.clone());
                }
                Transition::Stay
            }
            Command::WeaponAttackDeclaration {
                player,
                attacker,
                targets,
            } => {
                if !Activation::is_active(ctx, *player) {
                    debug!("declaration from inactive player {} ignored", player);
                    return Transition::Stay;
                }
                if !ctx.state.on_weapons_attack(*player, *attacker, targets) {
                    return Transition::Stay;
                }
                ctx.publish(command.clone());
                self.activation.unit_done(ctx, *player)
            }
            _ => Transition::Stay,
        }
    }
}
