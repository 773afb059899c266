//! Ironclash server binary
//!
//! Usage: ironclash-server [config.json]

use ironclash_server::{GameManager, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match ServerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Ironclash server");

    let mut manager = GameManager::new(config);
    match manager.start_server(None) {
        Ok(id) => info!("Hosting game {}", id),
        Err(e) => {
            error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    info!("Shutting down");
    if let Some(game) = manager.shutdown().await {
        info!(
            "Final state: turn {}, phase {:?}",
            game.state().turn(),
            game.phase_name()
        );
    }
}
