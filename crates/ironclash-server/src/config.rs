//! Server configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::phase::{BattleTechPhaseManager, PhaseManager, PhysicalAttackPhaseManager};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Envelopes buffered per bus subscriber
    pub bus_capacity: usize,
    /// Keep-alive tick of the lifecycle loop
    pub keep_alive_ms: u64,
    /// Fixed dice seed for reproducible games; entropy when absent
    pub dice_seed: Option<u64>,
    /// Gunnery skill used by the to-hit calculator
    pub gunnery: u32,
    /// Run a physical attack phase after weapon resolution
    pub physical_attacks: bool,
    /// Default tracing filter when RUST_LOG is unset
    pub log_filter: String,
    /// Battlefield installed at startup
    pub map: Option<MapConfig>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MapConfig {
    pub width: i32,
    pub height: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            keep_alive_ms: 1000,
            dice_seed: None,
            gunnery: 4,
            physical_attacks: false,
            log_filter: "ironclash_server=info".into(),
            map: None,
        }
    }
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms.max(1))
    }

    pub fn phase_manager(&self) -> Box<dyn PhaseManager> {
        if self.physical_attacks {
            Box::new(PhysicalAttackPhaseManager)
        } else {
            Box::new(BattleTechPhaseManager)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironclash_protocol::PhaseName;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{ "dice_seed": 7, "map": { "width": 16, "height": 17 } }"#)
                .unwrap();
        assert_eq!(config.dice_seed, Some(7));
        assert_eq!(config.gunnery, 4);
        assert_eq!(config.keep_alive(), Duration::from_secs(1));
        assert_eq!(config.map.unwrap().height, 17);
    }

    #[test]
    fn physical_attacks_select_extended_cycle() {
        let config = ServerConfig {
            physical_attacks: true,
            ..Default::default()
        };
        assert_eq!(
            config
                .phase_manager()
                .next_phase_name(PhaseName::WeaponAttackResolution),
            PhaseName::PhysicalAttack
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = tokio_test::assert_err!(ServerConfig::load("/nonexistent/ironclash.json"));
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
