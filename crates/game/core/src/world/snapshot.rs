//! Read-only summaries of a world, for logs and tooling.
use super::World;
use crate::character::Character;
use crate::item::{Item, ItemKind};
use crate::replication::NetRole;
use crate::types::{EntityId, Millis};
use crate::weapon::{Weapon, WeaponState};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ItemSummary {
    pub kind: ItemKind,
    pub name: String,
    pub quantity: u32,
    pub equipped: bool,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            kind: item.kind(),
            name: item.name().to_owned(),
            quantity: item.quantity(),
            equipped: item.is_equipped(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WeaponSummary {
    pub entity: EntityId,
    pub state: WeaponState,
    pub magazine: u32,
    pub burst_counter: u32,
}

impl From<&Weapon> for WeaponSummary {
    fn from(weapon: &Weapon) -> Self {
        Self {
            entity: weapon.entity(),
            state: weapon.state(),
            magazine: weapon.ammo_in_magazine(),
            burst_counter: weapon.burst_counter(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CharacterSummary {
    pub id: EntityId,
    pub name: String,
    pub health: f32,
    pub alive: bool,
    pub killer: Option<EntityId>,
    pub loot_source: Option<EntityId>,
    pub weapon: Option<WeaponSummary>,
    pub items: Vec<ItemSummary>,
}

impl From<&Character> for CharacterSummary {
    fn from(character: &Character) -> Self {
        Self {
            id: character.id(),
            name: character.name().to_owned(),
            health: character.health(),
            alive: character.is_alive(),
            killer: character.killer(),
            loot_source: character.loot_source(),
            weapon: character.weapon().map(WeaponSummary::from),
            items: character.inventory().items().iter().map(ItemSummary::from).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WorldSnapshot {
    pub role: NetRole,
    pub now: Millis,
    pub characters: Vec<CharacterSummary>,
    pub containers: usize,
    pub pickups: usize,
    pub pending_timers: usize,
}

impl World {
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            role: self.role,
            now: self.now,
            characters: self.characters.values().map(CharacterSummary::from).collect(),
            containers: self.containers.len(),
            pickups: self.pickups.len(),
            pending_timers: self.timers.len(),
        }
    }
}
