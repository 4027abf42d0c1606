//! Game configuration loader.

use std::path::Path;

use survival_core::GameConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for game configuration from TOML files.
///
/// Every field is optional in the file; missing ones keep their defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<GameConfig> {
        let config: GameConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &GameConfig) -> LoadResult<()> {
    anyhow::ensure!(config.max_health > 0.0, "max_health must be positive");
    anyhow::ensure!(
        config.character_inventory_capacity > 0 && config.container_inventory_capacity > 0,
        "inventory capacities must be at least one slot"
    );
    anyhow::ensure!(
        config.interaction_check_distance >= config.pickup_interaction_distance
            && config.interaction_check_distance >= config.container_interaction_distance,
        "interaction_check_distance ({}) must cover the interaction distances",
        config.interaction_check_distance
    );
    Ok(())
}
