use std::collections::BTreeMap;

use super::{ItemDefinition, ItemKind};

/// Read-only lookup of item definitions by class tag.
pub trait ItemCatalog: Send + Sync {
    fn definition(&self, kind: ItemKind) -> Option<&ItemDefinition>;

    /// Returns all item definitions, ordered by kind.
    fn definitions(&self) -> Vec<&ItemDefinition>;
}

/// In-memory catalog keyed by [`ItemKind`].
#[derive(Clone, Debug, Default)]
pub struct ItemTable {
    by_kind: BTreeMap<ItemKind, ItemDefinition>,
}

impl ItemTable {
    pub fn new(definitions: impl IntoIterator<Item = ItemDefinition>) -> Self {
        let mut table = Self::default();
        for definition in definitions {
            table.insert(definition);
        }
        table
    }

    /// Inserts or replaces a definition, returning the previous one.
    pub fn insert(&mut self, definition: ItemDefinition) -> Option<ItemDefinition> {
        self.by_kind.insert(definition.kind, definition)
    }

    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

impl ItemCatalog for ItemTable {
    fn definition(&self, kind: ItemKind) -> Option<&ItemDefinition> {
        self.by_kind.get(&kind)
    }

    fn definitions(&self) -> Vec<&ItemDefinition> {
        self.by_kind.values().collect()
    }
}
