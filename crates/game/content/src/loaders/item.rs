//! Item catalog loader.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use survival_core::{EquipRole, ItemBehavior, ItemDefinition, ItemTable};

use crate::loaders::{LoadResult, read_file};

/// Item catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCatalogFile {
    pub items: Vec<ItemDefinition>,
}

/// Loader for item catalog from RON files.
pub struct ItemLoader;

impl ItemLoader {
    /// Load item definitions from a RON file.
    pub fn load(path: &Path) -> LoadResult<Vec<ItemDefinition>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<ItemDefinition>> {
        let catalog: ItemCatalogFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON: {}", e))?;
        validate(&catalog.items)?;
        Ok(catalog.items)
    }

    /// Load a RON file straight into a lookup table.
    pub fn load_table(path: &Path) -> LoadResult<ItemTable> {
        Ok(ItemTable::new(Self::load(path)?))
    }
}

fn validate(items: &[ItemDefinition]) -> LoadResult<()> {
    let mut seen = BTreeSet::new();
    for item in items {
        anyhow::ensure!(seen.insert(item.kind), "duplicate item kind {} ({})", item.kind, item.name);
        anyhow::ensure!(
            item.weight >= 0.0 && item.weight.is_finite(),
            "item {} has invalid weight {}",
            item.name,
            item.weight
        );
        if let ItemBehavior::Equippable {
            role: EquipRole::Weapon(spec),
            ..
        } = &item.behavior
        {
            anyhow::ensure!(
                spec.magazine_capacity > 0,
                "weapon {} has an empty magazine",
                item.name
            );
            anyhow::ensure!(
                items.iter().any(|other| other.kind == spec.ammo_kind),
                "weapon {} fires unknown ammo {}",
                item.name,
                spec.ammo_kind
            );
        }
    }
    Ok(())
}
