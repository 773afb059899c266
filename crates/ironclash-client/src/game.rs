use std::collections::HashSet;
use std::sync::Arc;

use ironclash_core::{try_next, BusError, CommandBus, GameState};
use ironclash_protocol::{
    Command, Envelope, GameId, MovementType, PathSegment, PhaseName, PlayerId, PlayerStatus,
    Position, UnitData, UnitId, WeaponConfig, WeaponTarget,
};
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

const STREAM_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no active player")]
    NoActivePlayer,
    #[error("active player {0} is not controlled here")]
    NotLocal(PlayerId),
    #[error("{0} rejected by local validation")]
    Invalid(&'static str),
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// A replica of the game.
///
/// Tracks which players are controlled on this instance (hot seat) and which of them
/// already ended the turn, so the next local player can act without a round trip.
pub struct ClientGame {
    state: GameState,
    bus: Arc<dyn CommandBus>,
    inbox: broadcast::Receiver<Envelope>,
    authority: GameId,
    local_players: Vec<PlayerId>,
    ended: HashSet<PlayerId>,
    log: Vec<Envelope>,
    stream: broadcast::Sender<Envelope>,
}

impl ClientGame {
    /// Creates a replica following the authoritative instance `authority`.
    pub fn new(bus: Arc<dyn CommandBus>, authority: GameId) -> Self {
        let inbox = bus.subscribe();
        let (stream, _) = broadcast::channel(STREAM_CAPACITY);
        info!("following authority {}", authority);
        Self {
            state: GameState::new(GameId::new()),
            bus,
            inbox,
            authority,
            local_players: Vec::new(),
            ended: HashSet::new(),
            log: Vec::new(),
            stream,
        }
    }

    pub fn id(&self) -> GameId {
        self.state.id()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn authority(&self) -> GameId {
        self.authority
    }

    pub fn local_players(&self) -> &[PlayerId] {
        &self.local_players
    }

    pub fn is_local(&self, player: PlayerId) -> bool {
        self.local_players.contains(&player)
    }

    pub fn ended_players(&self) -> &HashSet<PlayerId> {
        &self.ended
    }

    /// Every envelope received from another instance, in arrival order, whether or not
    /// it was applied.
    pub fn command_log(&self) -> &[Envelope] {
        &self.log
    }

    /// Envelopes as they are logged, for UI consumers.
    pub fn subscribe_commands(&self) -> broadcast::Receiver<Envelope> {
        self.stream.subscribe()
    }

    // Incoming

    /// Handles everything already waiting on the bus. Returns how many envelopes were read.
    pub fn pump(&mut self) -> Result<usize, BusError> {
        let mut read = 0;
        while let Some(envelope) = try_next(&mut self.inbox)? {
            self.handle_envelope(&envelope);
            read += 1;
        }
        Ok(read)
    }

    /// Logs one envelope and mirrors it if it came from the authority and is valid.
    /// Client commands therefore only take effect through the authority's re-broadcast,
    /// after it accepted them. Returns whether the envelope was applied.
    pub fn handle_envelope(&mut self, envelope: &Envelope) -> bool {
        let command = &envelope.command;
        if !self.state.should_handle(envelope) {
            trace!("skipping {} from {}", command.kind(), envelope.origin);
            return false;
        }
        self.log.push(envelope.clone());
        let _ = self.stream.send(envelope.clone());

        if envelope.origin != self.authority {
            trace!("unconfirmed {} from {}", command.kind(), envelope.origin);
            return false;
        }
        if !self.state.validate(command) {
            debug!("rejected invalid {}", command.kind());
            return false;
        }

        self.state.apply_as_replica(command);
        self.update_local_activation(command);
        true
    }

    fn update_local_activation(&mut self, command: &Command) {
        let phase = self.state.phase();
        match command {
            Command::Join { player, .. }
                if phase == PhaseName::Start
                    && self.is_local(*player)
                    && self.state.active_player().is_none() =>
            {
                self.state.set_active_player(Some(*player), 0);
            }
            Command::UpdatePlayerStatus {
                player,
                status: PlayerStatus::Playing,
            } if phase == PhaseName::Start && self.state.active_player() == Some(*player) => {
                let next = self.local_players.iter().copied().find(|id| {
                    self.state
                        .player(*id)
                        .is_some_and(|p| p.status == PlayerStatus::Joining)
                });
                if let Some(next) = next {
                    self.state.set_active_player(Some(next), 0);
                }
            }
            Command::ChangePhase {
                phase: PhaseName::End,
            } => {
                self.ended.clear();
                self.activate_next_unended();
            }
            // Anyone may end the turn in any order; keep our own player up.
            Command::ChangeActivePlayer { .. } if phase == PhaseName::End => {
                self.activate_next_unended();
            }
            Command::TurnEnded { player } if phase == PhaseName::End => {
                self.ended.insert(*player);
                if self.state.active_player() == Some(*player) {
                    self.activate_next_unended();
                }
            }
            _ => {}
        }
    }

    fn activate_next_unended(&mut self) {
        let next = self
            .local_players
            .iter()
            .copied()
            .find(|id| !self.ended.contains(id));
        self.state.set_active_player(next, 0);
    }

    // Player actions

    fn acting_player(&self) -> Result<PlayerId, ClientError> {
        let player = self
            .state
            .active_player()
            .ok_or(ClientError::NoActivePlayer)?;
        if !self.is_local(player) {
            return Err(ClientError::NotLocal(player));
        }
        Ok(player)
    }

    fn send(&self, command: Command) -> Result<(), ClientError> {
        if !self.state.validate(&command) {
            return Err(ClientError::Invalid(command.kind()));
        }
        debug!("sending {}", command.kind());
        self.bus.publish(Envelope::new(self.id(), command))?;
        Ok(())
    }

    /// Registers `player` as controlled here and asks to join with `units`.
    pub fn join_game_with_units(
        &mut self,
        player: PlayerId,
        name: impl Into<String>,
        tint: impl Into<String>,
        units: Vec<UnitData>,
    ) -> Result<(), ClientError> {
        if !self.is_local(player) {
            self.local_players.push(player);
        }
        self.send(Command::Join {
            player,
            name: name.into(),
            tint: tint.into(),
            units,
        })
    }

    pub fn set_player_ready(&self) -> Result<(), ClientError> {
        let player = self.acting_player()?;
        self.send(Command::UpdatePlayerStatus {
            player,
            status: PlayerStatus::Playing,
        })
    }

    pub fn deploy_unit(&self, unit: UnitId, position: Position) -> Result<(), ClientError> {
        let player = self.acting_player()?;
        self.send(Command::DeployUnit {
            player,
            unit,
            position,
        })
    }

    pub fn roll_dice(&self) -> Result<(), ClientError> {
        let player = self.acting_player()?;
        self.send(Command::RollDice { player })
    }

    pub fn move_unit(
        &self,
        unit: UnitId,
        movement: MovementType,
        path: Vec<PathSegment>,
    ) -> Result<(), ClientError> {
        let player = self.acting_player()?;
        self.send(Command::MoveUnit {
            player,
            unit,
            movement,
            path,
        })
    }

    pub fn configure_unit_weapons(
        &self,
        unit: UnitId,
        config: WeaponConfig,
    ) -> Result<(), ClientError> {
        let player = self.acting_player()?;
        self.send(Command::WeaponConfiguration {
            player,
            unit,
            config,
        })
    }

    pub fn declare_weapon_attack(
        &self,
        attacker: UnitId,
        targets: Vec<WeaponTarget>,
    ) -> Result<(), ClientError> {
        let player = self.acting_player()?;
        self.send(Command::WeaponAttackDeclaration {
            player,
            attacker,
            targets,
        })
    }

    pub fn end_turn(&self) -> Result<(), ClientError> {
        let player = self.acting_player()?;
        self.send(Command::TurnEnded { player })
    }
}

impl std::fmt::Debug for ClientGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientGame")
            .field("id", &self.id())
            .field("authority", &self.authority)
            .field("local_players", &self.local_players)
            .field("log_len", &self.log.len())
            .finish_non_exhaustive()
    }
}
