use std::sync::Arc;
use std::time::Duration;

use ironclash_core::{
    try_next, BattleMap, BusError, CommandBus, DiceRoller, GameState, RandomDiceRoller,
    RangeToHitCalculator, ToHitCalculator,
};
use ironclash_protocol::{Command, Envelope, GameId, PhaseName};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::ServerContext;
use crate::phase::{BattleTechPhaseManager, Phase, PhaseManager, StartPhase, Transition};

const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(1);

/// The authoritative game instance.
///
/// Accepts client commands from the bus, hands them to the current phase and
/// publishes whatever the phase derives. Runs until disposed.
pub struct ServerGame {
    ctx: ServerContext,
    phase: Box<dyn Phase>,
    phase_manager: Box<dyn PhaseManager>,
    cancel: CancellationToken,
    keep_alive: Duration,
}

impl ServerGame {
    pub fn new(bus: Arc<dyn CommandBus>) -> Self {
        Self::with_id(GameId::new(), bus)
    }

    pub fn with_id(id: GameId, bus: Arc<dyn CommandBus>) -> Self {
        Self {
            ctx: ServerContext::new(
                GameState::new(id),
                bus,
                Box::new(RandomDiceRoller::from_entropy()),
                Box::new(RangeToHitCalculator::default()),
            ),
            phase: Box::new(StartPhase),
            phase_manager: Box::new(BattleTechPhaseManager),
            cancel: CancellationToken::new(),
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    pub fn with_dice(mut self, dice: Box<dyn DiceRoller>) -> Self {
        self.ctx.dice = dice;
        self
    }

    pub fn with_to_hit(mut self, to_hit: Box<dyn ToHitCalculator>) -> Self {
        self.ctx.to_hit = to_hit;
        self
    }

    pub fn with_phase_manager(mut self, phase_manager: Box<dyn PhaseManager>) -> Self {
        self.phase_manager = phase_manager;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn id(&self) -> GameId {
        self.ctx.id()
    }

    pub fn state(&self) -> &GameState {
        &self.ctx.state
    }

    pub fn context(&self) -> &ServerContext {
        &self.ctx
    }

    pub fn phase_name(&self) -> PhaseName {
        self.phase.name()
    }

    /// Installs the battlefield. Only possible once, during the start phase.
    pub fn set_battle_map(&mut self, map: Arc<dyn BattleMap>) -> bool {
        if self.phase.name() != PhaseName::Start {
            warn!("battle map can only be set before the game starts");
            return false;
        }
        if !self.ctx.state.set_battle_map(map) {
            return false;
        }
        let transition = self.phase.try_transition(&mut self.ctx);
        self.apply_transition(transition);
        true
    }

    // Phase transitions

    /// Leaves the current phase for `next`, following immediate completions until a
    /// phase waits for input.
    pub fn transition_to_phase(&mut self, next: Box<dyn Phase>) {
        let mut incoming = Some(next);
        while let Some(mut phase) = incoming.take() {
            self.phase.exit(&mut self.ctx);
            let name = phase.name();
            info!(
                "phase {:?} -> {:?} (turn {})",
                self.phase.name(),
                name,
                self.ctx.state.turn()
            );
            self.ctx.state.set_phase(name);
            self.ctx.publish(Command::ChangePhase { phase: name });

            let transition = phase.enter(&mut self.ctx);
            self.phase = phase;
            if transition == Transition::Next {
                incoming = Some(self.phase_manager.next_phase(name));
            }
        }
    }

    pub fn transition_to_next_phase(&mut self) {
        let next = self.phase_manager.next_phase(self.phase.name());
        self.transition_to_phase(next);
    }

    fn apply_transition(&mut self, transition: Transition) {
        if transition == Transition::Next {
            self.transition_to_next_phase();
        }
    }

    // Command handling

    pub fn handle_envelope(&mut self, envelope: &Envelope) {
        if !self.ctx.state.should_handle(envelope) {
            trace!(
                "skipping {} from {}",
                envelope.command.kind(),
                envelope.origin
            );
            return;
        }
        self.apply_as_authority(&envelope.command);
    }

    /// Authority-side dispatch: only client kinds that pass validation reach the phase.
    pub fn apply_as_authority(&mut self, command: &Command) {
        if !command.is_client() {
            trace!("ignoring server command {}", command.kind());
            return;
        }
        if !self.ctx.state.validate(command) {
            debug!("rejected invalid {}", command.kind());
            return;
        }
        let transition = self.phase.handle_command(&mut self.ctx, command);
        self.apply_transition(transition);
    }

    /// Handles every envelope already queued on `rx`. Returns how many were consumed.
    pub fn pump(&mut self, rx: &mut broadcast::Receiver<Envelope>) -> Result<usize, BusError> {
        let mut handled = 0;
        while let Some(envelope) = try_next(rx)? {
            self.handle_envelope(&envelope);
            handled += 1;
        }
        Ok(handled)
    }

    // Lifecycle

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drives the game from `commands` until disposed or the bus closes. Returns the game
    /// so its final state can be inspected.
    pub async fn run_until_disposed(
        mut self,
        mut commands: broadcast::Receiver<Envelope>,
    ) -> Self {
        let cancel = self.cancel.clone();
        let mut keep_alive = tokio::time::interval(self.keep_alive);
        keep_alive.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("server game {} running", self.id());

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("server game {} disposed", self.id());
                    break;
                }

                received = commands.recv() => match received {
                    Ok(envelope) => self.handle_envelope(&envelope),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("server game lagged, {} envelopes dropped", skipped);
                    }
                    Err(RecvError::Closed) => {
                        info!("command bus closed");
                        break;
                    }
                },

                _ = keep_alive.tick() => {
                    trace!(
                        "keep-alive: {:?}, turn {}",
                        self.phase.name(),
                        self.ctx.state.turn()
                    );
                }
            }
        }

        self.cancel.cancel();
        self
    }
}

impl std::fmt::Debug for ServerGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerGame")
            .field("id", &self.id())
            .field("phase", &self.phase.name())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironclash_core::{HexMap, LocalBus};
    use ironclash_protocol::{PlayerId, PlayerStatus};

    fn lobby() -> (ServerGame, Arc<LocalBus>) {
        let bus = Arc::new(LocalBus::default());
        (ServerGame::new(bus.clone()), bus)
    }

    fn from_client(command: Command) -> Envelope {
        Envelope::new(GameId::new(), command)
    }

    #[test]
    fn own_echo_is_ignored() {
        let (mut game, _bus) = lobby();
        let join = Command::Join {
            player: PlayerId::new(),
            name: "Echo".into(),
            tint: "#000000".into(),
            units: Vec::new(),
        };
        game.handle_envelope(&Envelope::new(game.id(), join));
        assert!(game.state().players().is_empty());
    }

    #[test]
    fn server_commands_from_others_are_ignored() {
        let (mut game, _bus) = lobby();
        game.handle_envelope(&from_client(Command::ChangePhase {
            phase: PhaseName::End,
        }));
        assert_eq!(game.phase_name(), PhaseName::Start);
        assert_eq!(game.state().phase(), PhaseName::Start);
    }

    #[test]
    fn map_only_accepted_once() {
        let (mut game, _bus) = lobby();
        assert!(game.set_battle_map(Arc::new(HexMap::new(8, 8))));
        assert!(!game.set_battle_map(Arc::new(HexMap::new(9, 9))));
    }

    #[test]
    fn ready_player_without_units_reaches_end_phase() {
        let (mut game, bus) = lobby();
        let mut rx = bus.subscribe();
        let player = PlayerId::new();
        game.handle_envelope(&from_client(Command::Join {
            player,
            name: "Solo".into(),
            tint: "#123456".into(),
            units: Vec::new(),
        }));
        game.handle_envelope(&from_client(Command::UpdatePlayerStatus {
            player,
            status: PlayerStatus::Playing,
        }));
        assert_eq!(game.phase_name(), PhaseName::Start);

        game.set_battle_map(Arc::new(HexMap::new(8, 8)));
        // nothing to deploy, roll, move or shoot: falls through to the end phase
        assert_eq!(game.phase_name(), PhaseName::End);
        assert_eq!(game.state().active_player(), Some(player));

        let phases: Vec<PhaseName> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|env| match env.command {
                Command::ChangePhase { phase } => Some(phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                PhaseName::Deployment,
                PhaseName::Initiative,
                PhaseName::Movement,
                PhaseName::WeaponsAttack,
                PhaseName::WeaponAttackResolution,
                PhaseName::Heat,
                PhaseName::End,
            ]
        );
    }

    #[tokio::test]
    async fn run_stops_when_disposed() {
        let (game, bus) = lobby();
        let token = game.cancellation_token();
        let game = game.with_keep_alive(Duration::from_millis(5));
        let task = tokio::spawn(game.run_until_disposed(bus.subscribe()));
        token.cancel();
        let game = task.await.unwrap();
        assert!(game.is_disposed());
    }
}
