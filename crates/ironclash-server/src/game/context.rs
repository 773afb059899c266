use std::sync::Arc;

use ironclash_core::{CommandBus, DiceRoller, GameState, ToHitCalculator};
use ironclash_protocol::{Command, Envelope, GameId, PlayerId};
use tracing::{debug, warn};

/// Everything a phase may touch: the authoritative state, the bus, and the rules services.
pub struct ServerContext {
    pub state: GameState,
    pub(crate) bus: Arc<dyn CommandBus>,
    pub(crate) dice: Box<dyn DiceRoller>,
    pub(crate) to_hit: Box<dyn ToHitCalculator>,
    initiative_order: Vec<PlayerId>,
}

impl ServerContext {
    pub fn new(
        state: GameState,
        bus: Arc<dyn CommandBus>,
        dice: Box<dyn DiceRoller>,
        to_hit: Box<dyn ToHitCalculator>,
    ) -> Self {
        Self {
            state,
            bus,
            dice,
            to_hit,
            initiative_order: Vec::new(),
        }
    }

    pub fn id(&self) -> GameId {
        self.state.id()
    }

    /// Stamps the command with our origin and puts it on the bus.
    pub fn publish(&self, command: Command) {
        let kind = command.kind();
        if let Err(e) = self.bus.publish(Envelope::new(self.id(), command)) {
            warn!("failed to publish {}: {}", kind, e);
        }
    }

    /// Sets the active player locally and announces it. Clearing is never announced;
    /// replicas clear on phase change.
    pub fn set_active_player(&mut self, player: Option<PlayerId>, units_to_play: u32) {
        self.state.set_active_player(player, units_to_play);
        if let Some(player) = player {
            debug!("active player {} ({} units)", player, units_to_play);
            self.publish(Command::ChangeActivePlayer {
                player,
                units_to_play,
            });
        }
    }

    pub fn increment_turn(&mut self) -> u32 {
        let turn = self.state.turn() + 1;
        self.state.set_turn(turn);
        self.initiative_order.clear();
        self.publish(Command::TurnIncremented { turn });
        turn
    }

    pub fn roll_2d6(&mut self) -> u32 {
        self.dice.roll_2d6()
    }

    /// Players ordered winner first. Players missing from the last initiative
    /// (joined later, or initiative never ran) follow in join order.
    pub fn initiative_order(&self) -> Vec<PlayerId> {
        let mut order = self.initiative_order.clone();
        for player in self.state.players() {
            if !order.contains(&player.id) {
                order.push(player.id);
            }
        }
        order
    }

    pub fn set_initiative_order(&mut self, order: Vec<PlayerId>) {
        self.initiative_order = order;
    }
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("state", &self.state)
            .field("initiative_order", &self.initiative_order)
            .finish_non_exhaustive()
    }
}
