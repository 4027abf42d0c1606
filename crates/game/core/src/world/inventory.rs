//! Inventory verbs: granting, using, equipping, and dropping items.
use tracing::{debug, warn};

use super::World;
use crate::config::GameConfig;
use crate::env::{Env, SpawnKind};
use crate::equipment::EquipSlot;
use crate::error::{Rejection, TargetIssue};
use crate::inventory::{AddResult, Inventory};
use crate::item::{EquipRole, Item, ItemBehavior, ItemKind, ItemUse};
use crate::replication::Intent;
use crate::types::{EntityId, ItemId, Transform};

impl World {
    /// Adds a copy of `item` to `owner`'s inventory. Authority only.
    ///
    /// Equippable items auto-equip on a character who is not looting and whose
    /// slot is free.
    pub fn give_item(&mut self, owner: EntityId, item: &Item, env: &Env<'_>) -> AddResult {
        self.add_to_inventory(owner, item.quantity(), env, |inventory| {
            inventory.try_add(item)
        })
    }

    /// Adds `quantity` units of a catalog item. Authority only.
    pub fn give_kind(
        &mut self,
        owner: EntityId,
        kind: ItemKind,
        quantity: u32,
        env: &Env<'_>,
    ) -> AddResult {
        if quantity == 0 {
            return AddResult::nothing();
        }
        let Some(definition) = self.catalog.definition(kind).cloned() else {
            return AddResult::none(quantity, Rejection::InvalidTarget(TargetIssue::ItemMissing));
        };
        self.add_to_inventory(owner, quantity, env, |inventory| {
            inventory.try_add_definition(&definition, quantity)
        })
    }

    fn add_to_inventory(
        &mut self,
        owner: EntityId,
        requested: u32,
        env: &Env<'_>,
        add: impl FnOnce(&mut Inventory) -> AddResult,
    ) -> AddResult {
        if !self.is_authority() {
            return AddResult::forwarded(requested);
        }
        let Some(inventory) = self.inventory_mut(owner) else {
            return AddResult::none(requested, Rejection::InvalidTarget(TargetIssue::Missing));
        };

        let before = inventory.len();
        let result = add(inventory);
        let added = (inventory.len() > before)
            .then(|| inventory.items().last().map(Item::id))
            .flatten();

        if let Some(item) = added {
            self.auto_equip(owner, item, env);
        }
        result
    }

    fn auto_equip(&mut self, owner: EntityId, item: ItemId, env: &Env<'_>) {
        let Some(character) = self.characters.get(&owner) else {
            return;
        };
        if character.is_looting() || !character.is_alive() {
            return;
        }
        let Some(slot) = character.inventory.get(item).and_then(Item::equip_slot) else {
            return;
        };
        if character.equipment.occupant(slot).is_some() {
            return;
        }
        if let Err(rejection) = self.equip_item(owner, item, env) {
            debug!(target: "core::inventory", %owner, %item, %rejection, "auto-equip failed");
        }
    }

    /// Runs the `Use` capability of an item the actor owns.
    ///
    /// Observers forward the request; the authority resolves it.
    pub fn use_item(&mut self, actor: EntityId, item: ItemId, env: &Env<'_>) -> Result<(), Rejection> {
        self.ensure_controls(actor)?;
        let action = self
            .require_character(actor)?
            .inventory
            .get(item)
            .map(Item::use_action)
            .ok_or(Rejection::InvalidTarget(TargetIssue::ItemMissing))?;

        if !self.is_authority() {
            self.forward(actor, Intent::UseItem { item });
            return Ok(());
        }

        match action {
            ItemUse::Nothing => Ok(()),
            ItemUse::Eat { heal_amount } => {
                self.eat(actor, item, heal_amount, env);
                Ok(())
            }
            ItemUse::ToggleEquip { .. } => self.toggle_equip(actor, item, env),
        }
    }

    /// Heals by `heal_amount`; the unit is only eaten if health changed.
    fn eat(&mut self, actor: EntityId, item: ItemId, heal_amount: f32, env: &Env<'_>) {
        let Some(character) = self.characters.get_mut(&actor) else {
            return;
        };
        let Some(name) = character.inventory.get(item).map(|i| i.name().to_owned()) else {
            return;
        };
        let healed = character.modify_health(heal_amount);
        if healed.abs() > GameConfig::HEALTH_EPSILON {
            character.inventory.consume(item, 1);
            env.notify(actor, &format!("Ate {name}, healed {healed:.0} health."));
        } else {
            env.notify(actor, &format!("No need to eat {name}, health is full."));
        }
    }

    fn toggle_equip(&mut self, actor: EntityId, item: ItemId, env: &Env<'_>) -> Result<(), Rejection> {
        let character = self.require_character(actor)?;
        let stack = character
            .inventory
            .get(item)
            .ok_or(Rejection::InvalidTarget(TargetIssue::ItemMissing))?;
        match (stack.is_equipped(), stack.equip_slot()) {
            (true, Some(slot)) => {
                self.unequip_item(actor, slot, item, env);
                Ok(())
            }
            (false, Some(_)) => self.equip_item(actor, item, env),
            (_, None) => Err(Rejection::InvalidTarget(TargetIssue::Unavailable)),
        }
    }

    /// Equips `item` into its slot, unequipping a different occupant first.
    pub(super) fn equip_item(&mut self, owner: EntityId, item: ItemId, env: &Env<'_>) -> Result<(), Rejection> {
        let character = self.require_character(owner)?;
        let Some(ItemBehavior::Equippable { slot, role }) =
            character.inventory.get(item).map(|i| i.behavior().clone())
        else {
            return Err(Rejection::InvalidTarget(TargetIssue::ItemMissing));
        };

        if let Some(previous) = character.equipment.occupant(slot)
            && previous != item
        {
            self.unequip_item(owner, slot, previous, env);
        }

        if let EquipRole::Weapon(spec) = role.clone() {
            self.equip_weapon(owner, item, spec, env)?;
        }

        let Some(character) = self.characters.get_mut(&owner) else {
            return Err(Rejection::InvalidTarget(TargetIssue::Missing));
        };
        character.equipment.equip(slot, item);
        character.inventory.set_equipped(item, true);
        if matches!(role, EquipRole::Gear) {
            env.play(owner, "gear.equip");
        }
        debug!(target: "core::inventory", %owner, %item, %slot, "equipped");
        Ok(())
    }

    /// Clears `slot` if `item` is its occupant. A stale or repeated call is a
    /// no-op returning false.
    pub(super) fn unequip_item(
        &mut self,
        owner: EntityId,
        slot: EquipSlot,
        item: ItemId,
        env: &Env<'_>,
    ) -> bool {
        let Some(character) = self.characters.get_mut(&owner) else {
            return false;
        };
        if !character.equipment.unequip(slot, item) {
            return false;
        }
        character.inventory.set_equipped(item, false);
        let role = match character.inventory.get(item).map(Item::behavior) {
            Some(ItemBehavior::Equippable { role, .. }) => Some(role.clone()),
            _ => None,
        };

        match role {
            Some(EquipRole::Weapon(_)) => {
                self.unequip_weapon(owner, env);
            }
            Some(EquipRole::Gear) => env.play(owner, "gear.unequip"),
            Some(EquipRole::Throwable { .. }) | None => {}
        }
        debug!(target: "core::inventory", %owner, %item, %slot, "unequipped");
        true
    }

    /// Drops `quantity` units of `item` in front of the actor as a pickup.
    ///
    /// The request is clamped to the stack; dropping zero does nothing.
    pub fn drop_item(
        &mut self,
        actor: EntityId,
        item: ItemId,
        quantity: u32,
        env: &Env<'_>,
    ) -> Result<(), Rejection> {
        self.ensure_controls(actor)?;
        let character = self.require_character(actor)?;
        let view = character.view;
        let mut template = character
            .inventory
            .get(item)
            .cloned()
            .ok_or(Rejection::InvalidTarget(TargetIssue::ItemMissing))?;
        let held = template.quantity();
        let quantity = quantity.min(held);
        if quantity == 0 {
            return Ok(());
        }

        if !self.is_authority() {
            self.forward(actor, Intent::DropItem { item, quantity });
            return Ok(());
        }

        let emptied = quantity >= held;
        let at = Transform::new(view.ahead(self.config.drop_distance), view.forward);

        let pickup = env.spawn(SpawnKind::Pickup, at).map_err(|error| {
            warn!(target: "core::inventory", %actor, %error, "pickup spawn failed");
            Rejection::InvalidTarget(TargetIssue::Unavailable)
        })?;

        if emptied
            && template.is_equipped()
            && let Some(slot) = template.equip_slot()
        {
            self.unequip_item(actor, slot, item, env);
        }
        let dropped = self
            .characters
            .get_mut(&actor)
            .map_or(0, |c| c.inventory.consume(item, quantity));
        template.set_quantity(i64::from(dropped));
        self.insert_pickup(pickup, at, template, None);
        debug!(target: "core::inventory", %actor, %item, dropped, %pickup, "dropped item");
        Ok(())
    }
}
