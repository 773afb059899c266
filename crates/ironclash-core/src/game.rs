//! Game state common to the authority and its replicas.
//!
//! Holds players, turn, phase and activation, validates commands structurally and owns
//! the mutation handlers both roles are built on. Handlers never publish; propagation is
//! the caller's job. A handler that cannot find its player or unit does nothing.

use std::collections::HashMap;
use std::sync::Arc;

use ironclash_protocol::{
    AttackResolution, Command, Envelope, GameId, HeatData, MovementType, PathSegment, PhaseName,
    PlayerId, PlayerStatus, Position, UnitData, UnitId, WeaponConfig, WeaponTarget,
};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::{BattleMap, Observable, Unit};

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub tint: String,
    pub status: PlayerStatus,
    pub units: Vec<Unit>,
}

impl Player {
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn alive_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| !u.is_destroyed())
    }
}

#[derive(Debug)]
pub struct GameState {
    id: GameId,
    players: Vec<Player>,
    turn: Observable<u32>,
    phase: Observable<PhaseName>,
    active_player: Observable<Option<PlayerId>>,
    units_to_play: Observable<u32>,
    battle_map: Option<Arc<dyn BattleMap>>,
}

impl GameState {
    pub fn new(id: GameId) -> Self {
        Self {
            id,
            players: Vec::new(),
            turn: Observable::new(1),
            phase: Observable::new(PhaseName::Start),
            active_player: Observable::new(None),
            units_to_play: Observable::new(0),
            battle_map: None,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Looks a unit up across every player.
    pub fn unit(&self, id: UnitId) -> Option<(&Player, &Unit)> {
        self.players
            .iter()
            .find_map(|p| p.unit(id).map(|u| (p, u)))
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.players.iter_mut().find_map(|p| p.unit_mut(id))
    }

    pub fn alive_unit_counts(&self) -> HashMap<PlayerId, u32> {
        self.players
            .iter()
            .map(|p| (p.id, p.alive_units().count() as u32))
            .collect()
    }

    // Published fields

    pub fn turn(&self) -> u32 {
        self.turn.get()
    }

    pub fn phase(&self) -> PhaseName {
        self.phase.get()
    }

    pub fn active_player(&self) -> Option<PlayerId> {
        self.active_player.get()
    }

    pub fn units_to_play(&self) -> u32 {
        self.units_to_play.get()
    }

    pub fn subscribe_turn(&self) -> watch::Receiver<u32> {
        self.turn.subscribe()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<PhaseName> {
        self.phase.subscribe()
    }

    pub fn subscribe_active_player(&self) -> watch::Receiver<Option<PlayerId>> {
        self.active_player.subscribe()
    }

    pub fn subscribe_units_to_play(&self) -> watch::Receiver<u32> {
        self.units_to_play.subscribe()
    }

    /// Entering a phase always drops the previous activation.
    pub fn set_phase(&mut self, phase: PhaseName) {
        self.phase.set(phase);
        self.active_player.set(None);
        self.units_to_play.set(0);
    }

    pub fn set_active_player(&mut self, player: Option<PlayerId>, units_to_play: u32) {
        self.active_player.set(player);
        self.units_to_play.set(units_to_play);
    }

    pub fn set_turn(&mut self, turn: u32) {
        self.turn.set(turn);
    }

    pub fn battle_map(&self) -> Option<&dyn BattleMap> {
        self.battle_map.as_deref()
    }

    /// Returns false if a map was already installed.
    pub fn set_battle_map(&mut self, map: Arc<dyn BattleMap>) -> bool {
        if self.battle_map.is_some() {
            return false;
        }
        self.battle_map = Some(map);
        true
    }

    // Filtering and validation

    /// Drops our own echoes and envelopes that were never stamped with an origin.
    pub fn should_handle(&self, envelope: &Envelope) -> bool {
        envelope.origin != self.id && !envelope.origin.is_nil()
    }

    pub fn validate(&self, command: &Command) -> bool {
        match command {
            Command::Join { player, .. } => !player.is_nil(),
            Command::UpdatePlayerStatus { player, .. } => self.player(*player).is_some(),
            Command::DeployUnit { player, .. } => !player.is_nil(),
            Command::TurnIncremented { turn } => *turn == self.turn() + 1,
            Command::MoveUnit { .. }
            | Command::WeaponConfiguration { .. }
            | Command::WeaponAttackDeclaration { .. }
            | Command::TurnEnded { .. }
            | Command::RollDice { .. }
            | Command::ChangePhase { .. }
            | Command::ChangeActivePlayer { .. }
            | Command::HeatUpdated { .. }
            | Command::WeaponAttackResolution { .. }
            | Command::DiceRolled { .. } => true,
        }
    }

    // Mutation handlers

    /// Adds the player once; repeated joins for the same id are ignored.
    pub fn on_player_joined(
        &mut self,
        player: PlayerId,
        name: &str,
        tint: &str,
        units: &[UnitData],
    ) -> bool {
        if self.player(player).is_some() {
            trace!("player {} already joined", player);
            return false;
        }
        self.players.push(Player {
            id: player,
            name: name.to_string(),
            tint: tint.to_string(),
            status: PlayerStatus::Joining,
            units: units.iter().map(Unit::from_data).collect(),
        });
        debug!("player {} ({}) joined with {} units", name, player, units.len());
        true
    }

    pub fn on_player_status_updated(&mut self, player: PlayerId, status: PlayerStatus) -> bool {
        let Some(p) = self.player_mut(player) else {
            return false;
        };
        p.status = status;
        debug!("player {} is now {:?}", player, status);
        true
    }

    pub fn on_deploy_unit(&mut self, player: PlayerId, unit: UnitId, position: Position) -> bool {
        let Some(u) = self.player_mut(player).and_then(|p| p.unit_mut(unit)) else {
            return false;
        };
        match u.deploy(position) {
            Ok(()) => {
                debug!("unit {} deployed at {:?}", unit, position);
                true
            }
            Err(e) => {
                trace!("deploy of {} ignored: {}", unit, e);
                false
            }
        }
    }

    pub fn on_move_unit(
        &mut self,
        player: PlayerId,
        unit: UnitId,
        movement: MovementType,
        path: &[PathSegment],
    ) -> bool {
        let Some(u) = self.player_mut(player).and_then(|p| p.unit_mut(unit)) else {
            return false;
        };
        match u.move_along(movement, path) {
            Ok(()) => {
                debug!("unit {} moved ({:?})", unit, movement);
                true
            }
            Err(e) => {
                trace!("move of {} ignored: {}", unit, e);
                false
            }
        }
    }

    pub fn on_weapon_configuration(
        &mut self,
        player: PlayerId,
        unit: UnitId,
        config: WeaponConfig,
    ) -> bool {
        let Some(u) = self.player_mut(player).and_then(|p| p.unit_mut(unit)) else {
            return false;
        };
        let result = match config {
            WeaponConfig::TorsoRotation(direction) => u.rotate_torso(direction),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                trace!("weapon configuration of {} ignored: {}", unit, e);
                false
            }
        }
    }

    pub fn on_weapons_attack(
        &mut self,
        player: PlayerId,
        attacker: UnitId,
        targets: &[WeaponTarget],
    ) -> bool {
        let Some(u) = self.player_mut(player).and_then(|p| p.unit_mut(attacker)) else {
            return false;
        };
        match u.declare_weapon_attack(targets.to_vec()) {
            Ok(()) => {
                debug!("unit {} declared {} weapon attacks", attacker, targets.len());
                true
            }
            Err(e) => {
                trace!("attack declaration of {} ignored: {}", attacker, e);
                false
            }
        }
    }

    pub fn on_weapons_attack_resolution(
        &mut self,
        player: PlayerId,
        attacker: UnitId,
        target: UnitId,
        resolution: &AttackResolution,
    ) -> bool {
        if self
            .player(player)
            .and_then(|p| p.unit(attacker))
            .is_none()
        {
            return false;
        }
        let Some(t) = self.unit_mut(target) else {
            return false;
        };
        if let (true, Some(location)) = (resolution.hit, resolution.location) {
            t.apply_damage(location, resolution.damage);
            debug!(
                "unit {} hit {} for {} at {:?}",
                attacker, target, resolution.damage, location
            );
        }
        true
    }

    pub fn on_heat_update(&mut self, unit: UnitId, heat: &HeatData, previous: u32) -> bool {
        let Some(u) = self.unit_mut(unit) else {
            return false;
        };
        u.apply_heat(heat, previous);
        true
    }

    pub fn on_turn_ended(&mut self, player: PlayerId) -> bool {
        let Some(p) = self.player_mut(player) else {
            return false;
        };
        for unit in &mut p.units {
            unit.reset_turn_state();
        }
        true
    }

    /// Applies a command through the matching handler, the switch replicas mirror with.
    /// Returns whether state changed. `RollDice` and `DiceRolled` carry no state here.
    pub fn apply_as_replica(&mut self, command: &Command) -> bool {
        match command {
            Command::Join {
                player,
                name,
                tint,
                units,
            } => self.on_player_joined(*player, name, tint, units),
            Command::UpdatePlayerStatus { player, status } => {
                self.on_player_status_updated(*player, *status)
            }
            Command::DeployUnit {
                player,
                unit,
                position,
            } => self.on_deploy_unit(*player, *unit, *position),
            Command::MoveUnit {
                player,
                unit,
                movement,
                path,
            } => self.on_move_unit(*player, *unit, *movement, path),
            Command::WeaponConfiguration {
                player,
                unit,
                config,
            } => self.on_weapon_configuration(*player, *unit, *config),
            Command::WeaponAttackDeclaration {
                player,
                attacker,
                targets,
            } => self.on_weapons_attack(*player, *attacker, targets),
            Command::TurnEnded { player } => self.on_turn_ended(*player),
            Command::ChangePhase { phase } => {
                self.set_phase(*phase);
                true
            }
            Command::ChangeActivePlayer {
                player,
                units_to_play,
            } => {
                self.set_active_player(Some(*player), *units_to_play);
                true
            }
            Command::TurnIncremented { turn } => {
                self.set_turn(*turn);
                true
            }
            Command::HeatUpdated {
                unit,
                heat,
                previous_heat,
            } => self.on_heat_update(*unit, heat, *previous_heat),
            Command::WeaponAttackResolution {
                player,
                attacker,
                target,
                resolution,
                ..
            } => self.on_weapons_attack_resolution(*player, *attacker, *target, resolution),
            Command::RollDice { .. } | Command::DiceRolled { .. } => false,
        }
    }
}
