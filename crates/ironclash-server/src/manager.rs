//! Bootstraps the authoritative game on a local bus.

use std::sync::Arc;

use ironclash_core::{
    BattleMap, CommandBus, HexMap, LocalBus, RandomDiceRoller, RangeToHitCalculator,
};
use ironclash_protocol::wire::serialize_envelope;
use ironclash_protocol::GameId;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::game::ServerGame;

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("server game {0} is already running")]
    AlreadyRunning(GameId),
}

struct RunningServer {
    id: GameId,
    cancel: CancellationToken,
    task: JoinHandle<ServerGame>,
    relay: Option<JoinHandle<()>>,
}

/// Owns the local bus and the running server game.
///
/// When a network outbox is attached, every envelope the server originates is encoded
/// with the wire codec and queued there for the transport, so remote replicas see the
/// same facts.
pub struct GameManager {
    config: ServerConfig,
    bus: Arc<LocalBus>,
    network: Option<mpsc::UnboundedSender<Vec<u8>>>,
    server: Option<RunningServer>,
}

impl GameManager {
    pub fn new(config: ServerConfig) -> Self {
        let bus = Arc::new(LocalBus::new(config.bus_capacity));
        Self {
            config,
            bus,
            network: None,
            server: None,
        }
    }

    pub fn with_network_outbox(mut self, network: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn bus(&self) -> Arc<LocalBus> {
        self.bus.clone()
    }

    pub fn server_id(&self) -> Option<GameId> {
        self.server.as_ref().map(|s| s.id)
    }

    pub fn is_running(&self) -> bool {
        self.server.as_ref().is_some_and(|s| !s.task.is_finished())
    }

    /// Builds the server game from config and spawns its lifecycle loop. An explicit
    /// `map` wins over the configured one. Must be called inside a tokio runtime.
    pub fn start_server(
        &mut self,
        map: Option<Arc<dyn BattleMap>>,
    ) -> Result<GameId, ManagerError> {
        if let Some(running) = &self.server {
            return Err(ManagerError::AlreadyRunning(running.id));
        }

        let dice = match self.config.dice_seed {
            Some(seed) => RandomDiceRoller::seeded(seed),
            None => RandomDiceRoller::from_entropy(),
        };
        let bus: Arc<dyn CommandBus> = self.bus.clone();
        let mut game = ServerGame::new(bus)
            .with_dice(Box::new(dice))
            .with_to_hit(Box::new(RangeToHitCalculator {
                gunnery: self.config.gunnery,
            }))
            .with_phase_manager(self.config.phase_manager())
            .with_keep_alive(self.config.keep_alive());

        let configured = self
            .config
            .map
            .map(|m| Arc::new(HexMap::new(m.width, m.height)) as Arc<dyn BattleMap>);
        if let Some(map) = map.or(configured) {
            game.set_battle_map(map);
        }

        let id = game.id();
        let cancel = game.cancellation_token();
        let relay = self
            .network
            .clone()
            .map(|network| self.spawn_relay(id, network, cancel.clone()));
        // Subscribe before spawning so nothing published in between is missed.
        let commands = self.bus.subscribe();
        let task = tokio::spawn(game.run_until_disposed(commands));

        info!("server game {} started", id);
        self.server = Some(RunningServer {
            id,
            cancel,
            task,
            relay,
        });
        Ok(id)
    }

    fn spawn_relay(
        &self,
        id: GameId,
        network: mpsc::UnboundedSender<Vec<u8>>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = rx.recv() => match received {
                        Ok(envelope) if envelope.origin == id => {
                            let frame = match serialize_envelope(&envelope) {
                                Ok(frame) => frame,
                                Err(e) => {
                                    warn!("dropping {}: {}", envelope.command.kind(), e);
                                    continue;
                                }
                            };
                            if network.send(frame).is_err() {
                                debug!("network outbox closed");
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("relay lagged, {} envelopes dropped", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("relay for {} stopped", id);
        })
    }

    /// Disposes the running game and waits for its loop to finish.
    pub async fn shutdown(&mut self) -> Option<ServerGame> {
        let running = self.server.take()?;
        running.cancel.cancel();
        if let Some(relay) = running.relay {
            let _ = relay.await;
        }
        match running.task.await {
            Ok(game) => {
                info!("server game {} stopped", running.id);
                Some(game)
            }
            Err(e) => {
                warn!("server game {} task failed: {}", running.id, e);
                None
            }
        }
    }
}
