//! Content factory for building a session's static data from a data directory.

use std::path::{Path, PathBuf};

use survival_core::{GameConfig, ItemDefinition, ItemTable};
use tracing::info;

use crate::loaders::{ConfigLoader, ItemLoader, LoadResult};

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// └── items.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load game configuration from `config.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            info!(target: "content", path = %path.display(), "no config file, using defaults");
            return Ok(GameConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load item definitions from `items.ron`.
    pub fn load_items(&self) -> LoadResult<Vec<ItemDefinition>> {
        let path = self.data_dir.join("items.ron");
        ItemLoader::load(&path)
    }

    /// Load the item catalog from `items.ron` as a lookup table.
    pub fn load_catalog(&self) -> LoadResult<ItemTable> {
        let items = self.load_items()?;
        info!(target: "content", items = items.len(), "item catalog loaded");
        Ok(ItemTable::new(items))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
