use crate::interaction::Interactable;
use crate::inventory::Inventory;
use crate::item::Item;
use crate::types::{EntityId, Transform};

/// An item stack lying in the world, taken through its interactable.
#[derive(Clone, Debug)]
pub struct Pickup {
    id: EntityId,
    transform: Transform,
    pub(crate) item: Item,
    pub(crate) interactable: Interactable,
}

impl Pickup {
    pub(crate) fn new(
        id: EntityId,
        transform: Transform,
        item: Item,
        interactable: Interactable,
    ) -> Self {
        Self {
            id,
            transform,
            item,
            interactable,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn interactable(&self) -> &Interactable {
        &self.interactable
    }
}

/// A static container whose inventory is opened as a loot source.
#[derive(Debug)]
pub struct LootContainer {
    id: EntityId,
    name: String,
    transform: Transform,
    pub(crate) inventory: Inventory,
    pub(crate) interactable: Interactable,
}

impl LootContainer {
    pub(crate) fn new(
        id: EntityId,
        name: String,
        transform: Transform,
        inventory: Inventory,
        interactable: Interactable,
    ) -> Self {
        Self {
            id,
            name,
            transform,
            inventory,
            interactable,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn interactable(&self) -> &Interactable {
        &self.interactable
    }
}
